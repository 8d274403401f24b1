//! Property-based tests over the whole simulated system.
//!
//! Random interleavings of user commands, room closures, connection churn
//! and partial delivery must keep every session's invariants, and once the
//! network settles the server must see each participant where its session
//! believes it is.

use std::time::Duration;

use bytes::Bytes;
use proptest::prelude::*;
use roomlink_core::SessionEvent;
use roomlink_harness::{ChaosConfig, SimCluster};

const ROOMS: &[&str] = &["general", "random", "rust"];
const CLIENTS: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    Select { client: usize, room: &'static str },
    Text { client: usize },
    File { client: usize, len: usize },
    Create { client: usize, room: &'static str },
    Close { room: &'static str },
    Disconnect { client: usize },
    Reconnect { client: usize },
    Deliver,
    Advance,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let client = 0..CLIENTS;
    let room = prop::sample::select(ROOMS.to_vec());
    prop_oneof![
        4 => (client.clone(), room.clone()).prop_map(|(client, room)| Op::Select { client, room }),
        3 => client.clone().prop_map(|client| Op::Text { client }),
        2 => (client.clone(), 1usize..200).prop_map(|(client, len)| Op::File { client, len }),
        1 => (client.clone(), room.clone()).prop_map(|(client, room)| Op::Create { client, room }),
        1 => room.prop_map(|room| Op::Close { room }),
        1 => client.clone().prop_map(|client| Op::Disconnect { client }),
        1 => client.prop_map(|client| Op::Reconnect { client }),
        4 => Just(Op::Deliver),
        1 => Just(Op::Advance),
    ]
}

fn apply(cluster: &mut SimCluster, op: &Op) {
    // Rejections are expected; state must stay consistent either way.
    let _ = match op {
        Op::Select { client, room } => {
            cluster.command(*client, SessionEvent::SelectRoom { room_id: (*room).to_string() })
        },
        Op::Text { client } => {
            cluster.command(*client, SessionEvent::SendText { text: "hey".into() })
        },
        Op::File { client, len } => cluster.command(*client, SessionEvent::SendFile {
            file_name: format!("file-{len}.bin"),
            bytes: Bytes::from(vec![0xab; *len]),
        }),
        Op::Create { client, room } => {
            cluster.command(*client, SessionEvent::CreateRoom { name: (*room).to_string() })
        },
        Op::Close { room } => {
            cluster.close_room(room);
            Ok(Vec::new())
        },
        Op::Disconnect { client } => {
            if cluster.session(*client).is_connected() {
                cluster.disconnect(*client, "churn");
            }
            Ok(Vec::new())
        },
        Op::Reconnect { client } => {
            if !cluster.session(*client).is_connected() {
                cluster.reconnect(*client);
            }
            Ok(Vec::new())
        },
        Op::Deliver => {
            cluster.deliver_all();
            Ok(Vec::new())
        },
        Op::Advance => {
            cluster.advance(Duration::from_secs(1));
            Ok(Vec::new())
        },
    };
}

fn cluster(seed: u64) -> SimCluster {
    let mut cluster = SimCluster::with_chaos(ROOMS.iter().copied(), ChaosConfig::new(seed));
    for (index, name) in ["ada", "bob", "carol"].into_iter().enumerate() {
        let room = ROOMS[index % ROOMS.len()];
        cluster.add_client(name, room);
    }
    cluster
}

proptest! {
    #[test]
    fn invariants_hold_under_churn(
        seed in any::<u64>(),
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let mut cluster = cluster(seed);
        for (step, op) in ops.iter().enumerate() {
            apply(&mut cluster, op);
            if let Err(violations) = cluster.check_invariants() {
                prop_assert!(false, "step {step} ({op:?}): {violations:?}");
            }
        }
    }

    #[test]
    fn settled_membership_matches_server(
        seed in any::<u64>(),
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let mut cluster = cluster(seed);
        for op in &ops {
            apply(&mut cluster, op);
        }
        for index in 0..CLIENTS {
            if !cluster.session(index).is_connected() {
                cluster.reconnect(index);
            }
        }
        cluster.deliver_all();

        for index in 0..CLIENTS {
            let session = cluster.session(index);
            let Some(current) = session.current_room() else {
                continue;
            };
            if cluster.server().room_ids().contains(&current) {
                prop_assert_eq!(cluster.server().room_of(cluster.client(index).id), Some(current));
                prop_assert!(session.presence().has_roster(current));
            }
        }
    }

    #[test]
    fn every_completed_file_is_intact(
        seed in any::<u64>(),
        len in 1usize..400,
    ) {
        let mut cluster = SimCluster::with_chaos(["general"], ChaosConfig::new(seed));
        let ada = cluster.add_client("ada", "general");
        let bob = cluster.add_client("bob", "general");
        cluster.deliver_all();

        let data: Bytes = (0..len).map(|i| (i % 256) as u8).collect::<Vec<_>>().into();
        cluster
            .command(ada, SessionEvent::SendFile { file_name: "blob".into(), bytes: data.clone() })
            .map_err(|error| TestCaseError::fail(error.to_string()))?;
        cluster.deliver_all();

        let received: Vec<_> = cluster
            .session(bob)
            .stream()
            .events()
            .iter()
            .filter_map(|event| match event {
                roomlink_core::ChatEvent::File(file) => Some(file.file_bytes.clone()),
                roomlink_core::ChatEvent::Text(_) => None,
            })
            .collect();
        prop_assert_eq!(received, vec![data]);
    }
}
