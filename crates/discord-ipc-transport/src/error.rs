/// Errors that can occur in the transport layer.
///
/// A clean close is not an error: [`ReadFully`](crate::ReadFully) reports it
/// by returning `Ok(false)`. These variants cover everything else.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}

impl TransportError {
    /// Returns the underlying I/O error kind.
    pub fn kind(&self) -> std::io::ErrorKind {
        match self {
            Self::SendFailed(e) | Self::ReceiveFailed(e) => e.kind(),
        }
    }
}
