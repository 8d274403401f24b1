//! Session configuration.

use std::time::Duration;

/// Size of one outbound file chunk (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Room the session falls back to when its current room closes.
pub const DEFAULT_FALLBACK_ROOM: &str = "general";

/// Largest transfer accepted, in chunks (256 MiB at the default chunk size).
pub const DEFAULT_MAX_CHUNKS: u32 = 4096;

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Local participant display name, announced on every join.
    pub participant_name: String,
    /// Room joined on first connect.
    pub initial_room: String,
    /// Well-known room used when the current room is closed.
    pub fallback_room: String,
    /// Outbound chunk size and inbound per-chunk limit.
    pub chunk_size: usize,
    /// Inbound transfers declaring more chunks are rejected.
    pub max_chunks_per_transfer: u32,
    /// Drop inbound transfers idle for longer than this. `None` keeps
    /// incomplete transfers until disconnect.
    pub transfer_stall_timeout: Option<Duration>,
}

impl SessionConfig {
    /// Configuration for `participant_name` starting in `initial_room`.
    pub fn new(participant_name: impl Into<String>, initial_room: impl Into<String>) -> Self {
        Self {
            participant_name: participant_name.into(),
            initial_room: initial_room.into(),
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            participant_name: "anonymous".to_string(),
            initial_room: DEFAULT_FALLBACK_ROOM.to_string(),
            fallback_room: DEFAULT_FALLBACK_ROOM.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_chunks_per_transfer: DEFAULT_MAX_CHUNKS,
            transfer_stall_timeout: None,
        }
    }
}
