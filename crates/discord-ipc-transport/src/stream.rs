//! Transport adapter over standard library byte streams.

use std::io::{ErrorKind, Read, Write};

use crate::{ReadFully, TransportError, WriteBytes};

/// Adapts a `std::io` stream to [`ReadFully`] and [`WriteBytes`].
///
/// Works with `UnixStream`, a named pipe opened as a `File`, a
/// `Cursor<Vec<u8>>` or anything else implementing `Read`/`Write`.
/// Use one `StreamTransport` per direction (for sockets, pair it with
/// `try_clone()`), so reads and writes never contend for the same value.
#[derive(Debug)]
pub struct StreamTransport<S> {
    stream: S,
}

impl<S> StreamTransport<S> {
    /// Wraps a stream.
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Returns a reference to the wrapped stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Returns a mutable reference to the wrapped stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Unwraps the stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

/// Error kinds that mean "nothing to read right now" rather than failure.
///
/// `UnexpectedEof` is how `read_exact` reports a peer that closed
/// mid-buffer (or before it). `WouldBlock` and `TimedOut` come from
/// non-blocking sockets and sockets with a read timeout.
fn is_unavailable(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof | ErrorKind::WouldBlock | ErrorKind::TimedOut
    )
}

impl<S: Read> ReadFully for StreamTransport<S> {
    fn read_fully(&mut self, buf: &mut [u8]) -> Result<bool, TransportError> {
        match self.stream.read_exact(buf) {
            Ok(()) => Ok(true),
            Err(e) if is_unavailable(e.kind()) => {
                tracing::trace!(
                    wanted = buf.len(),
                    kind = ?e.kind(),
                    "stream could not fill buffer"
                );
                Ok(false)
            }
            Err(e) => Err(TransportError::ReceiveFailed(e)),
        }
    }
}

impl<S: Write> WriteBytes for StreamTransport<S> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.stream
            .write_all(bytes)
            .and_then(|()| self.stream.flush())
            .map_err(TransportError::SendFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_kinds() {
        assert!(is_unavailable(ErrorKind::UnexpectedEof));
        assert!(is_unavailable(ErrorKind::WouldBlock));
        assert!(is_unavailable(ErrorKind::TimedOut));
        assert!(!is_unavailable(ErrorKind::BrokenPipe));
        assert!(!is_unavailable(ErrorKind::ConnectionReset));
    }
}
