//! Fuzz target for Payload::from_frame
//!
//! This fuzzer tests payload deserialization (CBOR decoding) with:
//! - Malformed CBOR data
//! - Type confusion (wrong payload shape for the event kind)
//! - Oversized strings or collections
//! - Deeply nested structures
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use roomlink_proto::{EventKind, Frame, FrameHeader, Payload};

fuzz_target!(|data: &[u8]| {
    for kind in EventKind::ALL {
        let frame = Frame::new(FrameHeader::new(kind), Bytes::copy_from_slice(data));

        if let Ok(payload) = Payload::from_frame(&frame) {
            assert_eq!(payload.kind(), kind);
        }
    }
});
