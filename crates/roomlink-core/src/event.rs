//! Session events and actions.

use bytes::Bytes;
use roomlink_proto::Payload;

use crate::{ChatEvent, RoomId};

/// Events the caller feeds into the session.
///
/// The caller is responsible for:
/// - Reporting transport up and down transitions
/// - Decoding frames from the network into payloads
/// - Forwarding user intents (switch room, send text, share file)
/// - Driving time forward via ticks
///
/// Generic over `I` (Instant type) so the same session runs on the system
/// clock and on a simulated one.
#[derive(Debug, Clone)]
pub enum SessionEvent<I = std::time::Instant> {
    /// Transport established.
    Connected,

    /// Transport dropped.
    Disconnected {
        /// Transport-provided description.
        reason: String,
    },

    /// Payload received from the server.
    Received(Payload),

    /// Time tick for stall expiry.
    Tick {
        /// Current time from the environment.
        now: I,
    },

    /// User wants to switch rooms.
    SelectRoom {
        /// Target room.
        room_id: RoomId,
    },

    /// User wants to post text to the current room.
    SendText {
        /// Message body.
        text: String,
    },

    /// User wants to share a file in the current room.
    SendFile {
        /// File name shown to recipients.
        file_name: String,
        /// File contents.
        bytes: Bytes,
    },

    /// User wants the server to create a room.
    CreateRoom {
        /// Requested room name.
        name: String,
    },
}

/// Actions the session asks the caller to perform.
///
/// `Send` goes to the transport. Everything else is a change notification
/// for the presentation layer; the caller reads the new state back through
/// the session's accessors.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// Encode and send a payload to the server.
    Send(Payload),

    /// The room directory changed.
    RoomsChanged,

    /// A room's roster changed.
    RosterChanged {
        /// Room whose roster changed.
        room_id: RoomId,
    },

    /// An event was appended to the message stream.
    MessageAppended(ChatEvent),

    /// Progress of a file transfer changed.
    TransferProgress {
        /// File being transferred.
        file_name: String,
        /// Fraction complete, in `[0, 1]`.
        progress: f64,
    },

    /// The current room changed.
    CurrentRoomChanged {
        /// New current room.
        room_id: RoomId,
    },

    /// The transport dropped.
    ConnectivityLost {
        /// Transport-provided description.
        reason: String,
    },
}
