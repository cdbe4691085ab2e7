//! Client configuration.

use discord_ipc_protocol::{CodecConfig, PROTOCOL_VERSION};

/// Configuration for an [`IpcClient`](crate::IpcClient).
///
/// Build one with [`ClientConfig::new`] and override fields as needed,
/// or use [`IpcClientBuilder`](crate::IpcClientBuilder).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// The application's client id, sent in the handshake.
    pub client_id: String,

    /// Protocol version sent in the handshake.
    ///
    /// Default: [`PROTOCOL_VERSION`] (1).
    pub protocol_version: u32,

    /// Reader settings (unknown opcode handling).
    pub codec: CodecConfig,
}

impl ClientConfig {
    /// A configuration for `client_id` with default settings.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            protocol_version: PROTOCOL_VERSION,
            codec: CodecConfig::default(),
        }
    }
}
