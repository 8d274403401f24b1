//! Error types and counters for the session core.
//!
//! Commands from the UI fail synchronously with a [`SessionError`] and leave
//! state untouched. Inbound protocol input is never an error to the caller:
//! malformed payloads are dropped, logged and counted in [`SessionStats`].

use thiserror::Error;

use crate::RoomId;

/// Errors returned by [`crate::Session::handle`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The transport dropped.
    #[error("connectivity lost: {reason}")]
    ConnectivityLost {
        /// Transport-provided description.
        reason: String,
    },

    /// Command needs a live connection.
    #[error("not connected")]
    NotConnected,

    /// Command referenced a room the directory does not know.
    #[error("room not found: {room_id}")]
    RoomNotFound {
        /// Requested room id.
        room_id: RoomId,
    },

    /// Chunk rejected at the transfer engine boundary.
    #[error("malformed chunk for {file_name}: {reason}")]
    MalformedChunk {
        /// File the chunk claimed to belong to.
        file_name: String,
        /// Why it was rejected.
        reason: ChunkRejection,
    },

    /// Text message is empty or whitespace.
    #[error("message text is empty")]
    EmptyMessage,

    /// Room name is empty or whitespace.
    #[error("room name is empty")]
    EmptyRoomName,

    /// File has no bytes.
    #[error("file {file_name} is empty")]
    EmptyFile {
        /// Offending file name.
        file_name: String,
    },
}

impl SessionError {
    /// Returns true if the command may succeed once the transport is back.
    ///
    /// Everything else is a caller mistake or bad input and will fail again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectivityLost { .. } | Self::NotConnected)
    }
}

/// Reasons a chunk is rejected as malformed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkRejection {
    /// `chunk_index >= total_chunks`.
    #[error("chunk index {index} out of range for {total} chunks")]
    IndexOutOfRange {
        /// Claimed index.
        index: u32,
        /// Claimed total.
        total: u32,
    },

    /// A transfer cannot have zero chunks.
    #[error("transfer declares zero chunks")]
    ZeroChunks,

    /// Total disagrees with the transfer already in progress.
    #[error("total chunks {actual} disagrees with in-progress transfer of {expected}")]
    TotalMismatch {
        /// Total recorded by the first chunk.
        expected: u32,
        /// Total claimed by this chunk.
        actual: u32,
    },

    /// Chunk body exceeds the configured chunk size.
    #[error("chunk of {size} bytes exceeds limit of {max}")]
    ChunkTooLarge {
        /// Chunk body size.
        size: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Declared total exceeds the configured per-transfer maximum.
    #[error("transfer of {total} chunks exceeds limit of {max}")]
    TooManyChunks {
        /// Claimed total.
        total: u32,
        /// Configured maximum.
        max: u32,
    },
}

/// Counters for input the session dropped or ignored.
///
/// Observability only; nothing in the core branches on these values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Chunks rejected as malformed.
    pub malformed_chunks: u64,
    /// Inbound events dropped for bad shape or unknown room.
    pub malformed_events: u64,
    /// Chunks whose index had already been received.
    pub duplicate_chunks: u64,
    /// Chunks for transfers that already completed.
    pub ignored_completions: u64,
    /// In-progress transfers dropped by a disconnect.
    pub abandoned_transfers: u64,
    /// In-progress transfers dropped by the stall timeout.
    pub stalled_transfers: u64,
}
