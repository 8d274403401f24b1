//! Fixed-size frame header with zero-copy parsing.
//!
//! The header is 12 bytes of raw big-endian binary. It identifies the event
//! kind and payload length so the receiver can split the byte stream into
//! frames before touching CBOR.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    EventKind,
    errors::{ProtocolError, Result},
};

/// Fixed 12-byte frame header (big endian).
///
/// Layout: `[magic:4][version:1][flags:1][event:2][payload_size:4]`.
///
/// Fields are byte arrays so every 12-byte pattern is a valid value and the
/// struct can be cast directly from untrusted input. Validation of magic,
/// version, and size happens in [`FrameHeader::from_bytes`].
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct FrameHeader {
    magic: [u8; 4],                   // 0x524D4C4B ("RMLK")
    version: u8,                      // 0x01
    flags: u8,                        // reserved, zero
    event: [u8; 2],                   // EventKind code
    pub(crate) payload_size: [u8; 4], // u32 payload length
}

impl FrameHeader {
    /// Size of the serialized header.
    pub const SIZE: usize = 12;

    /// Magic number: "RMLK" in ASCII.
    pub const MAGIC: u32 = 0x524D_4C4B;

    /// Current protocol version.
    pub const VERSION: u8 = 0x01;

    /// Maximum payload size (16 MiB).
    ///
    /// Comfortably above one 64 KiB file chunk plus CBOR overhead.
    pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

    /// Create a header for the given event kind with an empty payload.
    #[must_use]
    pub fn new(event: EventKind) -> Self {
        Self {
            magic: Self::MAGIC.to_be_bytes(),
            version: Self::VERSION,
            flags: 0,
            event: event.to_u16().to_be_bytes(),
            payload_size: [0; 4],
        }
    }

    /// Parse a header from the start of `bytes` without copying.
    ///
    /// Checks are ordered cheapest first: length, magic, version, then the
    /// declared payload size.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::FrameTooShort` if fewer than [`Self::SIZE`] bytes
    /// - `ProtocolError::InvalidMagic` if the magic number is wrong
    /// - `ProtocolError::UnsupportedVersion` if the version is not 1
    /// - `ProtocolError::PayloadTooLarge` if the declared size exceeds
    ///   [`Self::MAX_PAYLOAD_SIZE`]
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        let (header, _) = Self::ref_from_prefix(bytes).map_err(|_| {
            ProtocolError::FrameTooShort { expected: Self::SIZE, actual: bytes.len() }
        })?;

        if u32::from_be_bytes(header.magic) != Self::MAGIC {
            return Err(ProtocolError::InvalidMagic);
        }

        if header.version != Self::VERSION {
            return Err(ProtocolError::UnsupportedVersion(header.version));
        }

        let payload_size = u32::from_be_bytes(header.payload_size);
        if payload_size > Self::MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload_size as usize,
                max: Self::MAX_PAYLOAD_SIZE as usize,
            });
        }

        Ok(header)
    }

    /// Serialize the header.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(IntoBytes::as_bytes(self));
        arr
    }

    /// Protocol version byte.
    #[must_use]
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Reserved flag bits. Always zero in version 1.
    #[must_use]
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Raw event code.
    #[must_use]
    pub fn event_code(&self) -> u16 {
        u16::from_be_bytes(self.event)
    }

    /// Event kind. `None` if the code is unrecognized.
    #[must_use]
    pub fn event_kind(&self) -> Option<EventKind> {
        EventKind::from_u16(self.event_code())
    }

    /// Payload size in bytes.
    #[must_use]
    pub fn payload_size(&self) -> u32 {
        u32::from_be_bytes(self.payload_size)
    }
}

impl std::fmt::Debug for FrameHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameHeader")
            .field("version", &self.version())
            .field("event", &self.event_kind())
            .field("payload_size", &self.payload_size())
            .finish()
    }
}

impl PartialEq for FrameHeader {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for FrameHeader {}
