//! Chat and file transfer payloads.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// `chat message`: one text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMessage {
    /// Sender-assigned id, unique within the sender's session.
    pub id: u64,
    /// Sender display name.
    pub sender: String,
    /// Room id.
    pub room: String,
    /// Unix milliseconds at send time.
    pub timestamp: u64,
    /// Message body.
    pub text: String,
}

/// `sendFileChunk`: one slice of a file.
///
/// The same shape travels outbound (client to server) and inbound (server
/// relaying to the room).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChunk {
    /// File name, part of the transfer key.
    pub file_name: String,
    /// Chunk bytes.
    pub chunk: Bytes,
    /// Zero-based index of this chunk.
    pub chunk_index: u32,
    /// Number of chunks in the transfer.
    pub total_chunks: u32,
    /// Room the file is sent to.
    pub room_id: String,
    /// Sender display name.
    pub sender: String,
}

/// `fileReceived`: a file already assembled by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReceived {
    /// Sender display name.
    pub sender: String,
    /// File name.
    pub file_name: String,
    /// Complete file contents.
    pub file_data: Bytes,
}

/// `progressUpdate`: server-side transfer progress for a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    /// File name.
    pub file_name: String,
    /// Fraction complete in `0.0..=1.0`.
    pub progress: f64,
}
