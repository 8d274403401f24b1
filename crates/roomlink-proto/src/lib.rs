//! Wire protocol for roomlink.
//!
//! Every message on the connection is a [`Frame`]: a fixed 12-byte binary
//! [`FrameHeader`] naming the [`EventKind`], followed by a CBOR-encoded
//! [`Payload`]. The event kinds mirror the named events of the chat server
//! (`join`, `leave-room`, `chat message`, `sendFileChunk`, ...).
//!
//! This crate is pure data and codec logic. It performs no I/O and keeps no
//! state, so both the client core and test harnesses share it.

#![deny(missing_docs)]

pub mod errors;
mod event;
mod frame;
mod header;
pub mod payloads;

pub use errors::{ProtocolError, Result};
pub use event::EventKind;
pub use frame::Frame;
pub use header::FrameHeader;
pub use payloads::Payload;
