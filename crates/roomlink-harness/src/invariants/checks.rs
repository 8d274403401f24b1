//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.

use std::collections::HashSet;

use super::{Invariant, InvariantResult, SessionSnapshot, Violation};

/// The current room must be a room the directory has listed.
///
/// Prevents the UI from showing a selected room that never existed.
pub struct CurrentRoomKnown;

impl Invariant for CurrentRoomKnown {
    fn name(&self) -> &'static str {
        "current_room_known"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        match &state.current_room {
            Some(room) if !state.known_rooms.contains(room) => Err(Violation {
                invariant: self.name(),
                message: format!(
                    "current room {room} never listed (known: {:?})",
                    state.known_rooms
                ),
            }),
            _ => Ok(()),
        }
    }
}

/// Rosters are only held for rooms currently in the directory.
pub struct RostersInDirectory;

impl Invariant for RostersInDirectory {
    fn name(&self) -> &'static str {
        "rosters_in_directory"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        for room in &state.roster_rooms {
            if !state.rooms.contains(room) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "roster held for unlisted room {room} (listed: {:?})",
                        state.rooms
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Every logged chat event belongs to a room that was listed at some point.
pub struct StreamRoomsKnown;

impl Invariant for StreamRoomsKnown {
    fn name(&self) -> &'static str {
        "stream_rooms_known"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        for (index, room) in state.stream_rooms.iter().enumerate() {
            if !state.known_rooms.contains(room) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("event {index} names unknown room {room}"),
                });
            }
        }
        Ok(())
    }
}

/// The directory never lists one id twice.
pub struct UniqueRoomIds;

impl Invariant for UniqueRoomIds {
    fn name(&self) -> &'static str {
        "unique_room_ids"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let mut seen = HashSet::new();
        for room in &state.rooms {
            if !seen.insert(room) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("room {room} listed twice in {:?}", state.rooms),
                });
            }
        }
        Ok(())
    }
}
