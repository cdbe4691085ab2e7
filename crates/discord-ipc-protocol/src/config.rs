//! Reader configuration.

/// What a reader does with a frame whose opcode it cannot decode.
///
/// Either way [`PacketReader::read`](crate::PacketReader::read) returns
/// `Ok(None)` for that frame; the policies differ in what happens to the
/// payload bytes still sitting in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownOpcodePolicy {
    /// Read and discard `payload_len` bytes so the next read starts at a
    /// frame boundary.
    #[default]
    Drain,

    /// Leave the payload in the stream. The next read will interpret the
    /// first payload bytes as a header, so this only makes sense when the
    /// host reconnects after any `None`.
    Abandon,
}

/// Configuration for a [`PacketReader`](crate::PacketReader).
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Handling of frames with unknown (or outbound-only) opcodes.
    ///
    /// Default: [`UnknownOpcodePolicy::Drain`].
    pub unknown_opcode: UnknownOpcodePolicy,

    /// Size of the scratch buffer used while draining, in bytes. Bounds
    /// memory use when a bogus header announces a huge payload.
    ///
    /// Default: 4096.
    pub drain_chunk_size: usize,

    /// Largest payload the reader will buffer for a decodable frame.
    /// Bigger frames are skipped under `unknown_opcode` and reported as
    /// [`ProtocolError::PayloadTooLarge`](crate::ProtocolError::PayloadTooLarge).
    ///
    /// Default: 16 MiB.
    pub max_payload_len: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            unknown_opcode: UnknownOpcodePolicy::default(),
            drain_chunk_size: 4096,
            max_payload_len: 16 * 1024 * 1024,
        }
    }
}
