//! Transport shim for the Discord IPC codec.
//!
//! The codec never touches sockets directly. It needs exactly two
//! primitives, expressed here as the [`ReadFully`] and [`WriteBytes`]
//! traits. Whatever the host uses to reach the desktop client (a Unix
//! domain socket, a Windows named pipe, an in-memory buffer in tests)
//! only has to implement these.
//!
//! [`StreamTransport`] adapts any `std::io::Read`/`std::io::Write` stream.

mod error;
mod stream;

pub use error::TransportError;
pub use stream::StreamTransport;

/// Fills a buffer completely from the underlying byte source.
pub trait ReadFully {
    /// Blocks until `buf` is full or the source cannot produce more data.
    ///
    /// Returns `Ok(true)` when every byte of `buf` was filled and
    /// `Ok(false)` when the peer closed the connection or no data is
    /// available right now. Bytes read before a `false` result are lost;
    /// callers give up that attempt and wait for fresh data.
    fn read_fully(&mut self, buf: &mut [u8]) -> Result<bool, TransportError>;
}

/// Writes a byte sequence to the underlying sink.
pub trait WriteBytes {
    /// Writes all of `bytes`, in order, or fails.
    ///
    /// Implementations may split this into several underlying writes, but
    /// must not return until every byte has been handed to the sink.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}

impl<T: ReadFully + ?Sized> ReadFully for &mut T {
    fn read_fully(&mut self, buf: &mut [u8]) -> Result<bool, TransportError> {
        (**self).read_fully(buf)
    }
}

impl<T: WriteBytes + ?Sized> WriteBytes for &mut T {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(bytes)
    }
}

impl<T: ReadFully + ?Sized> ReadFully for Box<T> {
    fn read_fully(&mut self, buf: &mut [u8]) -> Result<bool, TransportError> {
        (**self).read_fully(buf)
    }
}

impl<T: WriteBytes + ?Sized> WriteBytes for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(bytes)
    }
}
