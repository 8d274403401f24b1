//! Fuzz target for inbound chunk reassembly
//!
//! Feeds arbitrary chunk sequences (any index, any total, duplicates, size
//! violations) into a `TransferEngine`.
//!
//! # Invariants
//!
//! - Never panics
//! - A completed transfer holds exactly `total_chunks` chunks' worth of bytes,
//!   in index order
//! - Each transfer key completes at most once

#![no_main]

use std::{collections::HashSet, time::Duration};

use arbitrary::Arbitrary;
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use roomlink_core::{ChunkOutcome, TransferEngine};
use roomlink_proto::payloads::chat::FileChunk;

const CHUNK_SIZE: usize = 8;
const MAX_CHUNKS: u32 = 16;

#[derive(Debug, Arbitrary)]
struct FuzzChunk {
    file: u8,
    sender: u8,
    index: u8,
    total: u8,
    len: u8,
}

impl FuzzChunk {
    fn into_chunk(self) -> FileChunk {
        let fill = self.index;
        FileChunk {
            file_name: format!("file-{}", self.file % 3),
            chunk: Bytes::from(vec![fill; usize::from(self.len) % (CHUNK_SIZE * 2)]),
            chunk_index: u32::from(self.index % 24),
            total_chunks: u32::from(self.total % 24),
            room_id: "general".to_string(),
            sender: format!("sender-{}", self.sender % 2),
        }
    }
}

fuzz_target!(|chunks: Vec<FuzzChunk>| {
    let mut engine = TransferEngine::<Duration>::new(CHUNK_SIZE, MAX_CHUNKS);
    let mut completed = HashSet::new();

    for (step, chunk) in chunks.into_iter().enumerate() {
        let now = Duration::from_millis(step as u64);
        if let Ok(ChunkOutcome::Completed(done)) = engine.accept(chunk.into_chunk(), now) {
            assert!(completed.insert(done.key.clone()), "transfer completed twice");
            assert!(done.bytes.len() <= CHUNK_SIZE * MAX_CHUNKS as usize);
        }
    }
});
