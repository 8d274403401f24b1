//! Session synchronization core for roomlink.
//!
//! Pure state machines for a room-scoped chat client. The core owns no
//! sockets and spawns no tasks: the caller feeds [`SessionEvent`]s into
//! [`Session::handle`] and executes the returned [`SessionAction`]s. The same
//! code therefore runs against a real transport and inside deterministic
//! simulation.
//!
//! # Components
//!
//! - [`RoomDirectory`]: known rooms, snapshot replacement and announcements
//! - [`PresenceTracker`]: per-room rosters, replaced wholesale
//! - [`MembershipController`]: leave-old/join-new sequencing on room switch
//! - [`MessageStream`]: append-only chat log with per-room views
//! - [`TransferEngine`]: chunked file splitting and reassembly
//! - [`Session`]: top-level state machine wiring the above together

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod env;
mod error;
mod event;
mod membership;
mod presence;
mod room;
mod session;
mod stream;
pub mod transfer;

pub use config::SessionConfig;
pub use env::Environment;
pub use error::{ChunkRejection, SessionError, SessionStats};
pub use event::{SessionAction, SessionEvent};
pub use membership::{MembershipController, MembershipPhase, MembershipStep};
pub use presence::{Participant, PresenceTracker};
pub use room::{Room, RoomDirectory, RoomId};
pub use session::Session;
pub use stream::{ChatEvent, FileEvent, MessageStream, TextEvent};
pub use transfer::{ChunkOutcome, CompletedTransfer, OutboundTransfer, TransferEngine, TransferKey};
