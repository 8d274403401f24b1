//! Event kinds carried in the frame header.

/// Named event carried by a frame.
///
/// Each kind has a stable numeric code for the binary header and the event
/// name the chat server uses on its event channel. Outbound and inbound
/// directions share codes where the server relays the same event back
/// (`chat message`, `sendFileChunk`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum EventKind {
    /// Announce participant and desired room.
    Join = 0x0001,
    /// Leave the current room.
    LeaveRoom = 0x0002,
    /// Request a new room.
    CreateRoom = 0x0003,
    /// Text chat message.
    ChatMessage = 0x0004,
    /// One chunk of a file transfer.
    FileChunk = 0x0005,

    /// Authoritative room list.
    ActiveRooms = 0x0010,
    /// Incremental room announcement.
    NewRoom = 0x0011,
    /// Room removed by the server.
    RoomClosed = 0x0012,
    /// Roster replacement for one room.
    ActiveUsers = 0x0013,
    /// File assembled by the server.
    FileReceived = 0x0014,
    /// Server-reported transfer progress.
    ProgressUpdate = 0x0015,
}

impl EventKind {
    /// All known event kinds, in code order.
    pub const ALL: [Self; 11] = [
        Self::Join,
        Self::LeaveRoom,
        Self::CreateRoom,
        Self::ChatMessage,
        Self::FileChunk,
        Self::ActiveRooms,
        Self::NewRoom,
        Self::RoomClosed,
        Self::ActiveUsers,
        Self::FileReceived,
        Self::ProgressUpdate,
    ];

    /// Numeric code written to the frame header.
    #[must_use]
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Parse a header code. `None` if unrecognized.
    #[must_use]
    pub const fn from_u16(code: u16) -> Option<Self> {
        match code {
            0x0001 => Some(Self::Join),
            0x0002 => Some(Self::LeaveRoom),
            0x0003 => Some(Self::CreateRoom),
            0x0004 => Some(Self::ChatMessage),
            0x0005 => Some(Self::FileChunk),
            0x0010 => Some(Self::ActiveRooms),
            0x0011 => Some(Self::NewRoom),
            0x0012 => Some(Self::RoomClosed),
            0x0013 => Some(Self::ActiveUsers),
            0x0014 => Some(Self::FileReceived),
            0x0015 => Some(Self::ProgressUpdate),
            _ => None,
        }
    }

    /// Event name as used on the server's event channel.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::LeaveRoom => "leave-room",
            Self::CreateRoom => "create room",
            Self::ChatMessage => "chat message",
            Self::FileChunk => "sendFileChunk",
            Self::ActiveRooms => "active rooms",
            Self::NewRoom => "new room",
            Self::RoomClosed => "room closed",
            Self::ActiveUsers => "active users",
            Self::FileReceived => "fileReceived",
            Self::ProgressUpdate => "progressUpdate",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_u16(kind.to_u16()), Some(kind));
        }
    }

    #[test]
    fn unknown_code_is_none() {
        assert_eq!(EventKind::from_u16(0x0000), None);
        assert_eq!(EventKind::from_u16(0xFFFF), None);
    }

    #[test]
    fn names_match_server_events() {
        assert_eq!(EventKind::LeaveRoom.name(), "leave-room");
        assert_eq!(EventKind::CreateRoom.to_string(), "create room");
        assert_eq!(EventKind::FileChunk.name(), "sendFileChunk");
    }
}
