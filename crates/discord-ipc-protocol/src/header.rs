//! The fixed-size frame header that prefixes every message.
//!
//! ```text
//! offset 0..4   opcode       (u32, little-endian)
//! offset 4..8   payload_len  (u32, little-endian)
//! offset 8..    JSON payload (payload_len bytes of UTF-8)
//! ```
//!
//! There is no terminator: framing is purely length-prefixed, so a header
//! with the wrong length desynchronizes everything after it.

use crate::{Opcode, ProtocolError};

/// Size of an encoded [`FrameHeader`] in bytes.
pub const HEADER_SIZE: usize = 8;

/// A decoded frame header.
///
/// `opcode` is kept as the raw integer so that headers carrying opcodes
/// this crate does not know can still be inspected (and skipped).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHeader {
    /// Raw opcode value.
    pub opcode: u32,
    /// Exact byte length of the payload that follows the header.
    pub length: u32,
}

impl FrameHeader {
    /// Builds the header for a payload of `payload_len` bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::PayloadTooLarge` if the length does not fit
    /// in a `u32`.
    pub fn new(opcode: Opcode, payload_len: usize) -> Result<Self, ProtocolError> {
        let length = u32::try_from(payload_len)
            .map_err(|_| ProtocolError::PayloadTooLarge(payload_len))?;
        Ok(Self {
            opcode: opcode.as_u32(),
            length,
        })
    }

    /// Decodes a header. Both integers are little-endian on every host.
    pub fn decode(bytes: &[u8; HEADER_SIZE]) -> Self {
        let [o0, o1, o2, o3, l0, l1, l2, l3] = *bytes;
        Self {
            opcode: u32::from_le_bytes([o0, o1, o2, o3]),
            length: u32::from_le_bytes([l0, l1, l2, l3]),
        }
    }

    /// Encodes the header as eight little-endian bytes.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[..4].copy_from_slice(&self.opcode.to_le_bytes());
        out[4..].copy_from_slice(&self.length.to_le_bytes());
        out
    }

    /// Classifies the raw opcode, or `None` if it is not a known value.
    pub fn opcode_kind(&self) -> Option<Opcode> {
        Opcode::from_u32(self.opcode)
    }
}
