//! Commands from the presentation layer.

use bytes::Bytes;
use roomlink_core::{RoomId, SessionEvent};

/// A user intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    /// Switch to another room.
    SelectRoom {
        /// Target room.
        room_id: RoomId,
    },
    /// Post text to the current room.
    SendText {
        /// Message body.
        text: String,
    },
    /// Share a file in the current room.
    SendFile {
        /// Name shown to recipients.
        file_name: String,
        /// File contents.
        bytes: Bytes,
    },
    /// Ask the server to create a room.
    CreateRoom {
        /// Requested name.
        name: String,
    },
    /// Stop the runtime.
    Quit,
}

impl UiCommand {
    /// Session event for this command. `None` for [`UiCommand::Quit`], which
    /// the runtime handles itself.
    pub fn into_session_event<I>(self) -> Option<SessionEvent<I>> {
        match self {
            Self::SelectRoom { room_id } => Some(SessionEvent::SelectRoom { room_id }),
            Self::SendText { text } => Some(SessionEvent::SendText { text }),
            Self::SendFile { file_name, bytes } => {
                Some(SessionEvent::SendFile { file_name, bytes })
            },
            Self::CreateRoom { name } => Some(SessionEvent::CreateRoom { name }),
            Self::Quit => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[test]
    fn quit_has_no_session_event() {
        assert!(UiCommand::Quit.into_session_event::<Instant>().is_none());
    }

    #[test]
    fn select_room_maps_to_session_event() {
        let command = UiCommand::SelectRoom { room_id: "rust".to_string() };
        let event = command.into_session_event::<Instant>();
        assert!(matches!(event, Some(SessionEvent::SelectRoom { room_id }) if room_id == "rust"));
    }
}
