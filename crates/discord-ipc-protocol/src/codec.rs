//! Codec trait and the JSON implementation used on the wire.
//!
//! A "codec" (coder/decoder) converts between Rust types and the payload
//! bytes that follow a frame header. The desktop client only speaks JSON,
//! so [`JsonCodec`] is what every reader and writer uses by default. The
//! trait stays as the seam where tests (or a host with its own JSON
//! settings) can swap the implementation.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds
///
/// - `Send + Sync` → a codec can sit inside a writer shared between
///   threads.
/// - `'static` → it owns everything it needs.
///
/// `DeserializeOwned` (vs plain `Deserialize`) means the result doesn't
/// borrow from the input bytes, so the payload buffer can be dropped as
/// soon as decoding finishes.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into payload bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes payload bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Output is compact (no whitespace), which keeps the length in the frame
/// header equal to what the peer has to read.
///
/// ## Example
///
/// ```rust
/// use discord_ipc_protocol::{ClosePacket, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let close = ClosePacket { code: 1000, message: "bye".into() };
///
/// let bytes = codec.encode(&close).unwrap();
/// assert_eq!(bytes, br#"{"code":1000,"message":"bye"}"#);
///
/// let decoded: ClosePacket = codec.decode(&bytes).unwrap();
/// assert_eq!(close, decoded);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
