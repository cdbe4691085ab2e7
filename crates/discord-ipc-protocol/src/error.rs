//! Error types for the protocol layer.
//!
//! A `ProtocolError` is always fatal to the message being processed, but
//! never to the stream: the next call to
//! [`PacketReader::read`](crate::PacketReader::read) starts at the next
//! frame header. Conditions that only mean "no packet yet" are not errors
//! at all; they surface as `Ok(None)`.

use discord_ipc_transport::TransportError;

/// Errors that can occur while encoding, decoding or moving packets.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing a packet payload failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The payload is not valid JSON, or does not match the schema
    /// selected by its opcode or event discriminator.
    ///
    /// Common causes: malformed JSON, missing required fields,
    /// wrong data types, an unknown `cmd` value.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The payload bytes are not valid UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[source] std::str::Utf8Error),

    /// An incoming frame named an event this crate does not know.
    ///
    /// Unlike unknown opcodes, unknown events are rejected: the frame was
    /// classified, so silently dropping it would hide a protocol mismatch.
    #[error("unknown event discriminator: {0:?}")]
    UnknownEvent(String),

    /// A field the schema requires was absent (or null).
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The encoded payload does not fit in the 32-bit length field, or a
    /// received header announces more than the reader accepts.
    #[error("payload of {0} bytes exceeds the frame length limit")]
    PayloadTooLarge(usize),

    /// The transport failed for a reason other than a clean close.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
