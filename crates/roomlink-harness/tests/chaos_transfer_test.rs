//! File transfers through the simulated server under seeded chaos.
//!
//! The server reorders relayed chunks and delivers some twice. Every seed
//! must still yield exactly one byte-identical file per recipient.

use std::time::Duration;

use bytes::Bytes;
use roomlink_core::{ChatEvent, Session, SessionConfig, SessionEvent};
use roomlink_harness::{ChaosConfig, ClientId, SimCluster, SimEnv};
use roomlink_proto::{Payload, payloads::chat::FileChunk};

const CHUNK_SIZE: usize = 16;

fn config(name: &str) -> SessionConfig {
    SessionConfig { chunk_size: CHUNK_SIZE, ..SessionConfig::new(name, "general") }
}

fn contents(len: usize) -> Bytes {
    (0..len).map(|i| (i % 251) as u8).collect::<Vec<_>>().into()
}

fn files(session: &Session<SimEnv>) -> Vec<(String, String, Bytes)> {
    session
        .stream()
        .events()
        .iter()
        .filter_map(|event| match event {
            ChatEvent::File(file) => {
                Some((file.sender.clone(), file.file_name.clone(), file.file_bytes.clone()))
            },
            ChatEvent::Text(_) => None,
        })
        .collect()
}

fn chunk(data: &Bytes, index: u32, total: u32) -> Payload {
    let start = (index as usize * CHUNK_SIZE).min(data.len());
    let end = (start + CHUNK_SIZE).min(data.len());
    Payload::FileChunk(FileChunk {
        file_name: "partial.bin".to_string(),
        chunk: data.slice(start..end),
        chunk_index: index,
        total_chunks: total,
        room_id: "general".to_string(),
        sender: "mallory".to_string(),
    })
}

fn client_id(cluster: &SimCluster, index: usize) -> ClientId {
    cluster.client(index).id
}

#[test]
fn file_survives_reordering_and_duplication() {
    let data = contents(CHUNK_SIZE * 9 + 5);

    for seed in 0..32 {
        let mut cluster = SimCluster::with_chaos(["general"], ChaosConfig::new(seed));
        let ada = cluster.add_client_with(config("ada"));
        let bob = cluster.add_client_with(config("bob"));
        cluster.deliver_all();

        let send = SessionEvent::SendFile { file_name: "notes.txt".into(), bytes: data.clone() };
        cluster.command(ada, send).expect("send file");
        cluster.deliver_all();

        for index in [ada, bob] {
            let session = cluster.session(index);
            assert_eq!(
                files(session),
                vec![("ada".to_string(), "notes.txt".to_string(), data.clone())],
                "seed {seed}, client {index}"
            );
            assert_eq!(session.active_transfers(), 0, "seed {seed}");
        }
        cluster.assert_invariants(&format!("seed {seed}"));
    }
}

#[test]
fn same_file_name_from_two_senders_completes_twice() {
    let mut cluster = SimCluster::with_chaos(["general"], ChaosConfig::new(3));
    let ada = cluster.add_client_with(config("ada"));
    let bob = cluster.add_client_with(config("bob"));
    let carol = cluster.add_client_with(config("carol"));
    cluster.deliver_all();

    let from_ada = contents(70);
    let from_bob = Bytes::from(vec![7u8; 50]);
    let send = |bytes: &Bytes| SessionEvent::SendFile {
        file_name: "same.bin".into(),
        bytes: bytes.clone(),
    };
    cluster.command(ada, send(&from_ada)).expect("ada sends");
    cluster.command(bob, send(&from_bob)).expect("bob sends");
    cluster.deliver_all();

    let mut received = files(cluster.session(carol));
    received.sort();
    assert_eq!(
        received,
        vec![
            ("ada".to_string(), "same.bin".to_string(), from_ada),
            ("bob".to_string(), "same.bin".to_string(), from_bob),
        ]
    );
}

#[test]
fn disconnect_abandons_partial_transfer() {
    let mut cluster = SimCluster::new(["general"]);
    let bob = cluster.add_client_with(config("bob"));
    cluster.deliver_all();

    let data = contents(CHUNK_SIZE * 5);
    let id = client_id(&cluster, bob);
    for index in 0..3 {
        cluster.server_mut().push(id, chunk(&data, index, 5));
    }
    cluster.deliver_all();
    assert_eq!(cluster.session(bob).active_transfers(), 1);

    cluster.disconnect(bob, "network unreachable");
    assert_eq!(cluster.session(bob).active_transfers(), 0);
    assert_eq!(cluster.session(bob).stats().abandoned_transfers, 1);

    cluster.reconnect(bob);
    cluster.deliver_all();
    for index in 3..5 {
        cluster.server_mut().push(id, chunk(&data, index, 5));
    }
    cluster.deliver_all();

    assert!(files(cluster.session(bob)).is_empty());
    assert_eq!(cluster.session(bob).active_transfers(), 1);
}

#[test]
fn stalled_transfer_expires_on_tick() {
    let mut cluster = SimCluster::new(["general"]);
    let bob = cluster.add_client_with(SessionConfig {
        transfer_stall_timeout: Some(Duration::from_secs(5)),
        ..config("bob")
    });
    cluster.deliver_all();

    let data = contents(CHUNK_SIZE * 4);
    let id = client_id(&cluster, bob);
    cluster.server_mut().push(id, chunk(&data, 0, 4));
    cluster.deliver_all();

    cluster.advance(Duration::from_secs(3));
    assert_eq!(cluster.session(bob).active_transfers(), 1);

    cluster.advance(Duration::from_secs(3));
    assert_eq!(cluster.session(bob).active_transfers(), 0);
    assert_eq!(cluster.session(bob).stats().stalled_transfers, 1);
}

#[test]
fn out_of_range_chunk_is_counted_and_ignored() {
    let mut cluster = SimCluster::new(["general"]);
    let bob = cluster.add_client_with(config("bob"));
    cluster.deliver_all();

    let data = contents(CHUNK_SIZE * 3);
    let id = client_id(&cluster, bob);
    cluster.server_mut().push(id, chunk(&data, 0, 3));
    cluster.server_mut().push(id, chunk(&data, 5, 3));
    cluster.deliver_all();

    let session = cluster.session(bob);
    assert_eq!(session.stats().malformed_chunks, 1);
    assert_eq!(session.active_transfers(), 1);

    let id = client_id(&cluster, bob);
    cluster.server_mut().push(id, chunk(&data, 1, 3));
    cluster.server_mut().push(id, chunk(&data, 2, 3));
    cluster.deliver_all();
    assert_eq!(files(cluster.session(bob)), vec![("mallory".into(), "partial.bin".into(), data)]);
}
