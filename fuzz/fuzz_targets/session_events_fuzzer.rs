//! Fuzz target for the session state machine
//!
//! Drives a `Session` with arbitrary interleavings of server payloads, user
//! commands and transport transitions.
//!
//! # Invariants
//!
//! - No inbound event ever panics or returns an error
//! - Rosters are only held for listed rooms
//! - Every logged event names a room the directory has listed

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use roomlink_core::{Environment, Session, SessionConfig, SessionEvent};
use roomlink_proto::{
    Payload,
    payloads::{
        chat::{FileChunk, FileReceived, ProgressUpdate, TextMessage},
        room::{ParticipantEntry, RoomEntry, RoomInfo, RosterUpdate},
    },
};

const ROOMS: [&str; 4] = ["general", "random", "rust", "ghost"];

#[derive(Debug, Clone, Copy)]
struct FuzzEnv;

impl Environment for FuzzEnv {
    type Instant = Duration;

    fn now(&self) -> Duration {
        Duration::ZERO
    }

    fn unix_millis(&self) -> u64 {
        1_704_067_200_000
    }
}

#[derive(Debug, Arbitrary)]
enum FuzzEvent {
    Connected,
    Disconnected,
    Tick(u16),
    Rooms(Vec<u8>),
    NewRoom(u8),
    Closed(u8),
    Roster(u8, Vec<u8>),
    Text(u8, String),
    Chunk { room: u8, index: u8, total: u8, data: Vec<u8> },
    FileReceived(Vec<u8>),
    Progress(f64),
    Select(u8),
    Send(String),
    SendFile(Vec<u8>),
    Create(String),
}

fn room(index: u8) -> String {
    ROOMS[usize::from(index) % ROOMS.len()].to_string()
}

impl FuzzEvent {
    fn into_event(self) -> (bool, SessionEvent<Duration>) {
        let inbound = |payload| (true, SessionEvent::Received(payload));
        match self {
            Self::Connected => (true, SessionEvent::Connected),
            Self::Disconnected => (true, SessionEvent::Disconnected { reason: "fuzz".into() }),
            Self::Tick(millis) => {
                (true, SessionEvent::Tick { now: Duration::from_millis(millis.into()) })
            },
            Self::Rooms(ids) => inbound(Payload::ActiveRooms(
                ids.into_iter().map(|id| RoomEntry::Info(RoomInfo::named(room(id)))).collect(),
            )),
            Self::NewRoom(id) => inbound(Payload::NewRoom(RoomInfo::named(room(id)))),
            Self::Closed(id) => inbound(Payload::RoomClosed(room(id))),
            Self::Roster(id, users) => inbound(Payload::ActiveUsers(RosterUpdate {
                room: room(id),
                users: users
                    .into_iter()
                    .map(|user| ParticipantEntry::Name(format!("user-{user}")))
                    .collect(),
            })),
            Self::Text(id, text) => inbound(Payload::ChatMessage(TextMessage {
                id: 1,
                sender: "peer".into(),
                room: room(id),
                timestamp: 0,
                text,
            })),
            Self::Chunk { room: id, index, total, data } => inbound(Payload::FileChunk(FileChunk {
                file_name: "fuzz.bin".into(),
                chunk: Bytes::from(data),
                chunk_index: u32::from(index),
                total_chunks: u32::from(total),
                room_id: room(id),
                sender: "peer".into(),
            })),
            Self::FileReceived(data) => inbound(Payload::FileReceived(FileReceived {
                sender: "server".into(),
                file_name: "assembled.bin".into(),
                file_data: Bytes::from(data),
            })),
            Self::Progress(progress) => {
                let update = ProgressUpdate { file_name: "up.bin".into(), progress };
                inbound(Payload::ProgressUpdate(update))
            },
            Self::Select(id) => (false, SessionEvent::SelectRoom { room_id: room(id) }),
            Self::Send(text) => (false, SessionEvent::SendText { text }),
            Self::SendFile(data) => {
                let bytes = Bytes::from(data);
                (false, SessionEvent::SendFile { file_name: "out.bin".into(), bytes })
            },
            Self::Create(name) => (false, SessionEvent::CreateRoom { name }),
        }
    }
}

fuzz_target!(|events: Vec<FuzzEvent>| {
    let config = SessionConfig {
        chunk_size: 16,
        max_chunks_per_transfer: 64,
        ..SessionConfig::new("fuzz", "general")
    };
    let mut session = Session::new(FuzzEnv, config);

    for event in events {
        let (infallible, event) = event.into_event();
        let result = session.handle(event);
        if infallible {
            assert!(result.is_ok(), "inbound event failed: {result:?}");
        }

        for room_id in session.presence().rooms() {
            assert!(session.rooms().contains(room_id), "roster for unlisted room {room_id}");
        }
        for event in session.stream().events() {
            assert!(session.rooms().was_known(event.room_id()), "event in unknown room");
        }
    }
});
