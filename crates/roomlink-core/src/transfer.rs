//! Chunked file transfer.
//!
//! Outbound files are sliced into fixed-size chunks without copying
//! ([`OutboundTransfer`]). Inbound chunks are collected per
//! ([`TransferKey`]) and concatenated by index once every chunk is present
//! ([`TransferEngine`]).
//!
//! # Invariants
//!
//! - A chunk index is stored at most once per transfer; duplicates are ignored
//! - A transfer completes exactly once, with chunks assembled in index order
//!   regardless of arrival order
//! - Chunks failing validation never create or modify transfer state

use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use bytes::{Bytes, BytesMut};
use roomlink_proto::payloads::chat::FileChunk;
use tracing::debug;

use crate::{ChunkRejection, RoomId};

/// Number of chunks needed for `len` bytes. Zero for an empty payload.
pub fn chunk_count(len: usize, chunk_size: usize) -> usize {
    len.div_ceil(chunk_size.max(1))
}

/// Identity of an inbound transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransferKey {
    /// File name carried by each chunk.
    pub file_name: String,
    /// Sender display name.
    pub sender: String,
    /// Room the file was shared in.
    pub room_id: RoomId,
}

impl TransferKey {
    fn of(chunk: &FileChunk) -> Self {
        Self {
            file_name: chunk.file_name.clone(),
            sender: chunk.sender.clone(),
            room_id: chunk.room_id.clone(),
        }
    }
}

/// A fully reassembled inbound file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedTransfer {
    /// Transfer identity.
    pub key: TransferKey,
    /// File contents.
    pub bytes: Bytes,
}

/// Result of accepting a valid chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkOutcome {
    /// Chunk stored; transfer still incomplete.
    Progress {
        /// File being received.
        file_name: String,
        /// Fraction of chunks received, in `[0, 1)`.
        progress: f64,
    },
    /// Final chunk stored.
    Completed(CompletedTransfer),
    /// Index already received; ignored.
    Duplicate,
    /// Transfer already completed; ignored.
    AlreadyCompleted,
}

/// Chunk split of one outgoing file.
///
/// Yields each chunk paired with the upload progress after it is sent.
/// Chunks borrow the original buffer, so no bytes are copied.
#[derive(Debug, Clone)]
pub struct OutboundTransfer {
    file_name: String,
    sender: String,
    room_id: RoomId,
    data: Bytes,
    chunk_size: usize,
    total_chunks: u32,
    next_index: u32,
}

impl OutboundTransfer {
    /// Split `data` into `chunk_size` pieces addressed to `room_id`.
    ///
    /// Returns `None` if `data` needs more than `u32::MAX` chunks.
    pub fn new(
        file_name: impl Into<String>,
        sender: impl Into<String>,
        room_id: impl Into<RoomId>,
        data: Bytes,
        chunk_size: usize,
    ) -> Option<Self> {
        let chunk_size = chunk_size.max(1);
        let total_chunks = u32::try_from(chunk_count(data.len(), chunk_size)).ok()?;
        Some(Self {
            file_name: file_name.into(),
            sender: sender.into(),
            room_id: room_id.into(),
            data,
            chunk_size,
            total_chunks,
            next_index: 0,
        })
    }

    /// Number of chunks the file splits into.
    pub fn total_chunks(&self) -> u32 {
        self.total_chunks
    }

    /// Fraction of chunks handed out so far.
    pub fn progress(&self) -> f64 {
        if self.total_chunks == 0 {
            return 1.0;
        }
        f64::from(self.next_index) / f64::from(self.total_chunks)
    }
}

impl Iterator for OutboundTransfer {
    type Item = (FileChunk, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index >= self.total_chunks {
            return None;
        }
        let index = self.next_index;
        let start = usize::try_from(index).ok()?.checked_mul(self.chunk_size)?;
        let end = start.saturating_add(self.chunk_size).min(self.data.len());

        let chunk = FileChunk {
            file_name: self.file_name.clone(),
            chunk: self.data.slice(start..end),
            chunk_index: index,
            total_chunks: self.total_chunks,
            room_id: self.room_id.clone(),
            sender: self.sender.clone(),
        };
        self.next_index += 1;
        Some((chunk, self.progress()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.total_chunks - self.next_index).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

#[derive(Debug)]
struct InboundTransfer<I> {
    chunks: Vec<Option<Bytes>>,
    received: usize,
    last_activity: I,
}

impl<I> InboundTransfer<I> {
    fn progress(&self) -> f64 {
        self.received as f64 / self.chunks.len() as f64
    }

    fn assemble(self) -> Bytes {
        let len = self.chunks.iter().flatten().map(Bytes::len).sum();
        let mut out = BytesMut::with_capacity(len);
        for chunk in self.chunks.into_iter().flatten() {
            out.extend_from_slice(&chunk);
        }
        out.freeze()
    }
}

/// Reassembles inbound chunked transfers.
///
/// Generic over the instant type so stall expiry runs on a virtual clock in
/// simulation.
///
/// Completed keys are kept for the life of the engine, one per file
/// received, so a late or resent chunk never completes the same file twice.
/// Nothing prunes them; a session in a busy room grows by one small key per
/// file.
#[derive(Debug)]
pub struct TransferEngine<I> {
    chunk_size: usize,
    max_chunks: u32,
    active: HashMap<TransferKey, InboundTransfer<I>>,
    completed: HashSet<TransferKey>,
}

impl<I> TransferEngine<I>
where
    I: Copy + Ord + std::ops::Sub<Output = Duration>,
{
    /// Engine accepting chunks up to `chunk_size` bytes and transfers up to
    /// `max_chunks` chunks.
    pub fn new(chunk_size: usize, max_chunks: u32) -> Self {
        Self { chunk_size, max_chunks, active: HashMap::new(), completed: HashSet::new() }
    }

    /// Store one inbound chunk.
    ///
    /// # Errors
    ///
    /// Returns a [`ChunkRejection`] if the chunk's index, total or size is
    /// invalid. Rejected chunks leave the engine untouched.
    pub fn accept(&mut self, chunk: FileChunk, now: I) -> Result<ChunkOutcome, ChunkRejection> {
        self.validate(&chunk)?;

        let key = TransferKey::of(&chunk);
        if self.completed.contains(&key) {
            debug!(file_name = %key.file_name, "chunk for completed transfer ignored");
            return Ok(ChunkOutcome::AlreadyCompleted);
        }

        let total = chunk.total_chunks;
        let index = chunk.chunk_index as usize;
        let transfer = self.active.entry(key.clone()).or_insert_with(|| InboundTransfer {
            chunks: vec![None; total as usize],
            received: 0,
            last_activity: now,
        });
        if transfer.chunks.len() != total as usize {
            return Err(ChunkRejection::TotalMismatch {
                expected: u32::try_from(transfer.chunks.len()).unwrap_or(u32::MAX),
                actual: total,
            });
        }

        let Some(slot) = transfer.chunks.get_mut(index) else {
            return Err(ChunkRejection::IndexOutOfRange { index: chunk.chunk_index, total });
        };
        if slot.is_some() {
            return Ok(ChunkOutcome::Duplicate);
        }
        *slot = Some(chunk.chunk);
        transfer.received += 1;
        transfer.last_activity = now;

        if transfer.received < transfer.chunks.len() {
            let progress = transfer.progress();
            return Ok(ChunkOutcome::Progress { file_name: key.file_name, progress });
        }

        let Some(transfer) = self.active.remove(&key) else {
            return Ok(ChunkOutcome::Duplicate);
        };
        self.completed.insert(key.clone());
        debug!(file_name = %key.file_name, sender = %key.sender, "transfer complete");
        Ok(ChunkOutcome::Completed(CompletedTransfer { bytes: transfer.assemble(), key }))
    }

    /// Progress of an in-progress transfer.
    pub fn progress(&self, key: &TransferKey) -> Option<f64> {
        self.active.get(key).map(InboundTransfer::progress)
    }

    /// Number of in-progress transfers.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Returns true if `key` has already completed.
    pub fn is_completed(&self, key: &TransferKey) -> bool {
        self.completed.contains(key)
    }

    /// Drop every in-progress transfer, returning how many were dropped.
    ///
    /// Completion history is kept, so a resent file is still ignored.
    pub fn abandon_all(&mut self) -> usize {
        let dropped = self.active.len();
        self.active.clear();
        dropped
    }

    /// Drop transfers idle for longer than `timeout`.
    pub fn expire_stalled(&mut self, now: I, timeout: Duration) -> Vec<TransferKey> {
        let stalled: Vec<TransferKey> = self
            .active
            .iter()
            .filter(|(_, transfer)| {
                now >= transfer.last_activity && now - transfer.last_activity > timeout
            })
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stalled {
            self.active.remove(key);
        }
        stalled
    }

    fn validate(&self, chunk: &FileChunk) -> Result<(), ChunkRejection> {
        if chunk.total_chunks == 0 {
            return Err(ChunkRejection::ZeroChunks);
        }
        if chunk.total_chunks > self.max_chunks {
            return Err(ChunkRejection::TooManyChunks {
                total: chunk.total_chunks,
                max: self.max_chunks,
            });
        }
        if chunk.chunk_index >= chunk.total_chunks {
            return Err(ChunkRejection::IndexOutOfRange {
                index: chunk.chunk_index,
                total: chunk.total_chunks,
            });
        }
        if chunk.chunk.len() > self.chunk_size {
            return Err(ChunkRejection::ChunkTooLarge {
                size: chunk.chunk.len(),
                max: self.chunk_size,
            });
        }
        Ok(())
    }
}
