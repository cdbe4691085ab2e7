//! Unified error type for the Discord IPC client.

use discord_ipc_protocol::ProtocolError;
use discord_ipc_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `discord-ipc` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DiscordIpcError {
    /// A transport-level error (send, receive).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, unknown event).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The desktop client sent a Close packet.
    #[error("closed by peer ({code}): {message}")]
    Closed { code: i32, message: String },

    /// A thread panicked while holding the shared writer.
    #[error("packet writer lock poisoned")]
    WriterPoisoned,
}
