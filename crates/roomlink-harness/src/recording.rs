//! Observer that records every notification for later assertions.

use roomlink_client::SessionObserver;
use roomlink_core::{ChatEvent, Participant, RoomDirectory, SessionError};

/// One recorded observer callback.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Directory changed; holds the listed ids at that moment.
    RoomsChanged(Vec<String>),
    /// Roster replaced; holds participant names.
    RosterChanged {
        /// Room whose roster changed.
        room_id: String,
        /// Participant names in roster order.
        names: Vec<String>,
    },
    /// Chat event appended.
    Message(ChatEvent),
    /// Transfer progress.
    TransferProgress {
        /// File being transferred.
        file_name: String,
        /// Fraction complete.
        progress: f64,
    },
    /// Current room changed.
    CurrentRoomChanged(String),
    /// Transport dropped.
    ConnectivityLost(String),
    /// Command rejected; holds the error text.
    CommandRejected(String),
}

/// [`SessionObserver`] that appends each callback to a list.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    notifications: Vec<Notification>,
}

impl RecordingObserver {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification in arrival order.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Drain recorded notifications.
    pub fn take(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Chat events in arrival order.
    pub fn messages(&self) -> impl Iterator<Item = &ChatEvent> {
        self.notifications.iter().filter_map(|n| match n {
            Notification::Message(event) => Some(event),
            _ => None,
        })
    }

    /// Rooms entered, in order.
    pub fn room_changes(&self) -> Vec<&str> {
        self.notifications
            .iter()
            .filter_map(|n| match n {
                Notification::CurrentRoomChanged(room) => Some(room.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of rejected commands.
    pub fn rejections(&self) -> usize {
        self.notifications.iter().filter(|n| matches!(n, Notification::CommandRejected(_))).count()
    }
}

impl SessionObserver for RecordingObserver {
    fn on_rooms_changed(&mut self, rooms: &RoomDirectory) {
        let ids = rooms.rooms().iter().map(|room| room.id.clone()).collect();
        self.notifications.push(Notification::RoomsChanged(ids));
    }

    fn on_roster_changed(&mut self, room_id: &str, roster: &[Participant]) {
        self.notifications.push(Notification::RosterChanged {
            room_id: room_id.to_string(),
            names: roster.iter().map(|p| p.name.clone()).collect(),
        });
    }

    fn on_message(&mut self, event: &ChatEvent) {
        self.notifications.push(Notification::Message(event.clone()));
    }

    fn on_transfer_progress(&mut self, file_name: &str, progress: f64) {
        self.notifications
            .push(Notification::TransferProgress { file_name: file_name.to_string(), progress });
    }

    fn on_current_room_changed(&mut self, room_id: &str) {
        self.notifications.push(Notification::CurrentRoomChanged(room_id.to_string()));
    }

    fn on_connectivity_lost(&mut self, reason: &str) {
        self.notifications.push(Notification::ConnectivityLost(reason.to_string()));
    }

    fn on_command_rejected(&mut self, error: &SessionError) {
        self.notifications.push(Notification::CommandRejected(error.to_string()));
    }
}
