//! CBOR-encoded event payloads.
//!
//! The frame header carries the [`EventKind`]; the payload carries only the
//! event's data. We serialize the inner value without a variant tag, so a
//! payload can only be interpreted through the kind named in its header.
//!
//! # Invariants
//!
//! Each [`Payload`] variant maps to exactly one [`EventKind`] (enforced by
//! exhaustive matches). Decoding an encoded payload with its own kind yields
//! an equal value.

pub mod chat;
pub mod room;

use bytes::BufMut;
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    EventKind, Frame, FrameHeader,
    errors::{ProtocolError, Result},
};

/// Every event payload the client sends or receives.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    // Outbound
    /// Announce participant and desired room.
    Join(room::JoinRequest),
    /// Leave a room, by id.
    LeaveRoom(String),
    /// Request a room with this name.
    CreateRoom(String),
    /// Text message (also relayed inbound).
    ChatMessage(chat::TextMessage),
    /// File chunk (also relayed inbound).
    FileChunk(chat::FileChunk),

    // Inbound
    /// Authoritative room list.
    ActiveRooms(Vec<room::RoomEntry>),
    /// Newly created room.
    NewRoom(room::RoomInfo),
    /// Room closed, by id.
    RoomClosed(String),
    /// Complete roster of one room.
    ActiveUsers(room::RosterUpdate),
    /// File assembled by the server.
    FileReceived(chat::FileReceived),
    /// Server-side transfer progress.
    ProgressUpdate(chat::ProgressUpdate),
}

impl Payload {
    /// Event kind corresponding to this payload.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Join(_) => EventKind::Join,
            Self::LeaveRoom(_) => EventKind::LeaveRoom,
            Self::CreateRoom(_) => EventKind::CreateRoom,
            Self::ChatMessage(_) => EventKind::ChatMessage,
            Self::FileChunk(_) => EventKind::FileChunk,
            Self::ActiveRooms(_) => EventKind::ActiveRooms,
            Self::NewRoom(_) => EventKind::NewRoom,
            Self::RoomClosed(_) => EventKind::RoomClosed,
            Self::ActiveUsers(_) => EventKind::ActiveUsers,
            Self::FileReceived(_) => EventKind::FileReceived,
            Self::ProgressUpdate(_) => EventKind::ProgressUpdate,
        }
    }

    /// Encode the inner value (no variant tag) to `dst`.
    ///
    /// Size limits are enforced later by [`Frame::encode`].
    ///
    /// # Errors
    ///
    /// - `ProtocolError::CborEncode` if serialization fails
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        match self {
            Self::Join(inner) => encode_inner(inner, dst),
            Self::LeaveRoom(inner) | Self::CreateRoom(inner) | Self::RoomClosed(inner) => {
                encode_inner(inner, dst)
            },
            Self::ChatMessage(inner) => encode_inner(inner, dst),
            Self::FileChunk(inner) => encode_inner(inner, dst),
            Self::ActiveRooms(inner) => encode_inner(inner, dst),
            Self::NewRoom(inner) => encode_inner(inner, dst),
            Self::ActiveUsers(inner) => encode_inner(inner, dst),
            Self::FileReceived(inner) => encode_inner(inner, dst),
            Self::ProgressUpdate(inner) => encode_inner(inner, dst),
        }
    }

    /// Decode a payload of the given kind.
    ///
    /// The size check runs before CBOR parsing so oversized input is never
    /// handed to the parser.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if `bytes` exceeds the maximum
    /// - `ProtocolError::CborDecode` if the bytes do not match the kind's shape
    pub fn decode(kind: EventKind, bytes: &[u8]) -> Result<Self> {
        if bytes.len() > FrameHeader::MAX_PAYLOAD_SIZE as usize {
            return Err(ProtocolError::PayloadTooLarge {
                size: bytes.len(),
                max: FrameHeader::MAX_PAYLOAD_SIZE as usize,
            });
        }

        let payload = match kind {
            EventKind::Join => Self::Join(decode_inner(bytes)?),
            EventKind::LeaveRoom => Self::LeaveRoom(decode_inner(bytes)?),
            EventKind::CreateRoom => Self::CreateRoom(decode_inner(bytes)?),
            EventKind::ChatMessage => Self::ChatMessage(decode_inner(bytes)?),
            EventKind::FileChunk => Self::FileChunk(decode_inner(bytes)?),
            EventKind::ActiveRooms => Self::ActiveRooms(decode_inner(bytes)?),
            EventKind::NewRoom => Self::NewRoom(decode_inner(bytes)?),
            EventKind::RoomClosed => Self::RoomClosed(decode_inner(bytes)?),
            EventKind::ActiveUsers => Self::ActiveUsers(decode_inner(bytes)?),
            EventKind::FileReceived => Self::FileReceived(decode_inner(bytes)?),
            EventKind::ProgressUpdate => Self::ProgressUpdate(decode_inner(bytes)?),
        };

        Ok(payload)
    }

    /// Encode into a transport frame with the matching header.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::CborEncode` if serialization fails
    pub fn into_frame(self) -> Result<Frame> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Ok(Frame::new(FrameHeader::new(self.kind()), buf))
    }

    /// Parse the typed payload out of a frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnknownEvent` if the header's event code is unknown
    /// - Any error from [`Payload::decode`]
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let kind = frame
            .event_kind()
            .ok_or_else(|| ProtocolError::UnknownEvent(frame.header.event_code()))?;
        Self::decode(kind, &frame.payload)
    }
}

fn encode_inner<T: Serialize>(value: &T, dst: &mut impl BufMut) -> Result<()> {
    ciborium::ser::into_writer(value, dst.writer())
        .map_err(|e| ProtocolError::CborEncode(e.to_string()))
}

fn decode_inner<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::de::from_reader(bytes).map_err(|e| ProtocolError::CborDecode(e.to_string()))
}
