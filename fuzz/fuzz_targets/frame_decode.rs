//! Fuzz target for Frame::decode
//!
//! This fuzzer tests frame decoding with arbitrary byte sequences to find:
//! - Parser crashes or panics
//! - Integer overflows in size calculations
//! - Buffer over-reads
//! - Headers with bad magic or version that slip through
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.
//! A frame that decodes must re-encode to the bytes it was read from.

#![no_main]

use libfuzzer_sys::fuzz_target;
use roomlink_proto::{Frame, FrameHeader};

fuzz_target!(|data: &[u8]| {
    let Ok(frame) = Frame::decode(data) else {
        return;
    };

    let mut encoded = Vec::new();
    frame.encode(&mut encoded).expect("decoded frame must re-encode");
    assert_eq!(encoded.len(), FrameHeader::SIZE + frame.payload.len());
    assert_eq!(&data[..encoded.len()], encoded.as_slice());
});
