//! Observable session state for invariant checks.

use std::collections::BTreeSet;

use roomlink_core::{Environment, Session};

/// Point-in-time view of one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Current room, once entered.
    pub current_room: Option<String>,
    /// Listed room ids in directory order.
    pub rooms: Vec<String>,
    /// Every room id the directory has ever listed.
    pub known_rooms: BTreeSet<String>,
    /// Rooms holding a roster.
    pub roster_rooms: BTreeSet<String>,
    /// Room of every logged chat event, in log order.
    pub stream_rooms: Vec<String>,
}

impl SessionSnapshot {
    /// Extract a snapshot from a session.
    pub fn from_session<E: Environment>(session: &Session<E>) -> Self {
        Self {
            current_room: session.current_room().map(str::to_string),
            rooms: session.rooms().rooms().iter().map(|room| room.id.clone()).collect(),
            known_rooms: session.rooms().known_ids().map(str::to_string).collect(),
            roster_rooms: session.presence().rooms().map(str::to_string).collect(),
            stream_rooms: session
                .stream()
                .events()
                .iter()
                .map(|event| event.room_id().to_string())
                .collect(),
        }
    }
}
