//! Change notifications for the presentation layer.

use roomlink_core::{ChatEvent, Participant, RoomDirectory, SessionError};

/// Receives typed change notifications from the [`crate::Runtime`].
///
/// Every method defaults to doing nothing, so an observer only implements the
/// notifications it renders. Callbacks run on the runtime task and must not
/// block.
pub trait SessionObserver: Send {
    /// The room directory changed.
    fn on_rooms_changed(&mut self, _rooms: &RoomDirectory) {}

    /// A room's roster was replaced.
    fn on_roster_changed(&mut self, _room_id: &str, _roster: &[Participant]) {}

    /// A chat event was appended.
    fn on_message(&mut self, _event: &ChatEvent) {}

    /// Transfer progress changed, as a fraction in `[0, 1]`.
    fn on_transfer_progress(&mut self, _file_name: &str, _progress: f64) {}

    /// The current room changed.
    fn on_current_room_changed(&mut self, _room_id: &str) {}

    /// The transport dropped.
    fn on_connectivity_lost(&mut self, _reason: &str) {}

    /// A user command was rejected. State is unchanged.
    fn on_command_rejected(&mut self, _error: &SessionError) {}
}
