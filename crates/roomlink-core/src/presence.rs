//! Per-room participant rosters.

use std::collections::HashMap;

use roomlink_proto::payloads::room::ParticipantInfo;

use crate::RoomId;

/// A participant as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Server-assigned identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl From<ParticipantInfo> for Participant {
    fn from(info: ParticipantInfo) -> Self {
        Self { id: info.id, name: info.name }
    }
}

/// Rosters keyed by room.
///
/// Every update replaces the room's roster. Nothing is merged, so a
/// participant who left simply disappears from the next update.
#[derive(Debug, Clone, Default)]
pub struct PresenceTracker {
    rosters: HashMap<RoomId, Vec<Participant>>,
}

impl PresenceTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the roster for `room_id`.
    ///
    /// When an id appears more than once the last entry wins, keeping the
    /// position of the first.
    pub fn apply_roster(
        &mut self,
        room_id: &str,
        participants: impl IntoIterator<Item = Participant>,
    ) {
        let mut roster: Vec<Participant> = Vec::new();
        for participant in participants {
            match roster.iter_mut().find(|existing| existing.id == participant.id) {
                Some(existing) => *existing = participant,
                None => roster.push(participant),
            }
        }
        self.rosters.insert(room_id.to_string(), roster);
    }

    /// Forget the roster for a closed room. Returns true if one existed.
    pub fn drop_room(&mut self, room_id: &str) -> bool {
        self.rosters.remove(room_id).is_some()
    }

    /// Keep only rosters for which `keep` returns true.
    pub fn retain_rooms(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.rosters.retain(|room_id, _| keep(room_id));
    }

    /// Roster for `room_id`. Empty if no update has arrived.
    pub fn roster(&self, room_id: &str) -> &[Participant] {
        self.rosters.get(room_id).map_or(&[], Vec::as_slice)
    }

    /// Returns true if a roster is held for `room_id`.
    pub fn has_roster(&self, room_id: &str) -> bool {
        self.rosters.contains_key(room_id)
    }

    /// Rooms with a roster, in no particular order.
    pub fn rooms(&self) -> impl Iterator<Item = &str> {
        self.rosters.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(id: &str, name: &str) -> Participant {
        Participant { id: id.to_string(), name: name.to_string() }
    }

    #[test]
    fn update_replaces_roster() {
        let mut presence = PresenceTracker::new();
        presence.apply_roster("general", [participant("1", "ada"), participant("2", "bob")]);
        presence.apply_roster("general", [participant("2", "bob")]);

        assert_eq!(presence.roster("general"), [participant("2", "bob")]);
    }

    #[test]
    fn duplicate_ids_keep_last_entry() {
        let mut presence = PresenceTracker::new();
        presence.apply_roster(
            "general",
            [participant("1", "ada"), participant("2", "bob"), participant("1", "ada lovelace")],
        );

        assert_eq!(
            presence.roster("general"),
            [participant("1", "ada lovelace"), participant("2", "bob")]
        );
    }

    #[test]
    fn unknown_room_has_empty_roster() {
        let presence = PresenceTracker::new();
        assert!(presence.roster("nowhere").is_empty());
        assert!(!presence.has_roster("nowhere"));
    }

    #[test]
    fn dropping_room_forgets_roster() {
        let mut presence = PresenceTracker::new();
        presence.apply_roster("rust", [participant("1", "ada")]);
        assert!(presence.drop_room("rust"));
        assert!(!presence.drop_room("rust"));
        assert!(presence.roster("rust").is_empty());
    }

    #[test]
    fn retain_prunes_rosters() {
        let mut presence = PresenceTracker::new();
        presence.apply_roster("general", [participant("1", "ada")]);
        presence.apply_roster("rust", [participant("2", "bob")]);

        presence.retain_rooms(|room_id| room_id == "general");
        assert_eq!(presence.rooms().collect::<Vec<_>>(), ["general"]);
    }
}
