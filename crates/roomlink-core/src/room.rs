//! Room directory.
//!
//! Ordered list of rooms the server has told us about. Snapshots replace the
//! list wholesale; announcements and closures edit it incrementally.

use std::collections::HashSet;

use roomlink_proto::payloads::room::RoomInfo;

/// Room identifier as carried on the wire.
pub type RoomId = String;

/// A room known to the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    /// Server-assigned identifier.
    pub id: RoomId,
    /// Display name.
    pub name: String,
}

impl Room {
    /// Room whose display name is its id.
    pub fn named(id: impl Into<String>) -> Self {
        let id = id.into();
        Self { name: id.clone(), id }
    }
}

impl From<RoomInfo> for Room {
    fn from(info: RoomInfo) -> Self {
        Self { id: info.id, name: info.name }
    }
}

/// Known rooms, in server order.
///
/// # Invariants
///
/// - Room ids are unique
/// - `was_known(id)` holds for every id that has ever been listed, so late
///   messages for a closed room can still be attributed
#[derive(Debug, Clone, Default)]
pub struct RoomDirectory {
    rooms: Vec<Room>,
    ever_known: HashSet<RoomId>,
}

impl RoomDirectory {
    /// Empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole list with a server snapshot.
    ///
    /// Duplicate ids keep their first position. Returns true if the visible
    /// list changed.
    pub fn apply_snapshot(&mut self, rooms: impl IntoIterator<Item = Room>) -> bool {
        let mut seen = HashSet::new();
        let next: Vec<Room> =
            rooms.into_iter().filter(|room| seen.insert(room.id.clone())).collect();

        self.ever_known.extend(next.iter().map(|room| room.id.clone()));
        if next == self.rooms {
            return false;
        }
        self.rooms = next;
        true
    }

    /// Append a newly announced room. Returns false if the id is already
    /// listed.
    pub fn announce(&mut self, room: Room) -> bool {
        self.ever_known.insert(room.id.clone());
        if self.contains(&room.id) {
            return false;
        }
        self.rooms.push(room);
        true
    }

    /// Remove a closed room, returning it if it was listed.
    pub fn remove(&mut self, room_id: &str) -> Option<Room> {
        let index = self.rooms.iter().position(|room| room.id == room_id)?;
        Some(self.rooms.remove(index))
    }

    /// Returns true if the room is currently listed.
    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.iter().any(|room| room.id == room_id)
    }

    /// Returns true if the room is listed now or was listed before.
    pub fn was_known(&self, room_id: &str) -> bool {
        self.ever_known.contains(room_id)
    }

    /// Every id ever listed, in no particular order.
    pub fn known_ids(&self) -> impl Iterator<Item = &str> {
        self.ever_known.iter().map(String::as_str)
    }

    /// Look up a listed room.
    pub fn get(&self, room_id: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id == room_id)
    }

    /// Listed rooms in server order.
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Number of listed rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Returns true if no room is listed.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Rooms whose name contains `query`, ignoring case. An empty query
    /// matches everything.
    pub fn search<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a Room> + 'a {
        let needle = query.to_lowercase();
        self.rooms.iter().filter(move |room| room.name.to_lowercase().contains(&needle))
    }

    /// Room to move to after `closed` went away.
    ///
    /// Prefers `fallback` when it is still listed, then the first remaining
    /// room, and finally `fallback` itself so there is always a target.
    pub fn fallback_for(&self, closed: &str, fallback: &str) -> RoomId {
        if fallback != closed && self.contains(fallback) {
            return fallback.to_string();
        }
        self.rooms
            .iter()
            .find(|room| room.id != closed)
            .map_or_else(|| fallback.to_string(), |room| room.id.clone())
    }
}
