//! `IpcClient`: handshake, read loop and command helpers.
//!
//! The client owns the read half and shares the write half. Reading
//! happens on whichever thread calls [`IpcClient::poll`]; any number of
//! [`ClientHandle`]s can send commands from other threads at the same
//! time, serialized by a mutex so frames never interleave on the wire.

use std::sync::{Arc, Mutex};

use discord_ipc_protocol::{
    ClosePacket, CodecConfig, Command, EventKind, EventListener, HandshakePacket, OutgoingFrame,
    Packet, PacketReader, PacketWriter, ReadOutcome,
};
use discord_ipc_transport::{ReadFully, WriteBytes};
use rand::Rng;
use serde_json::Value;

use crate::{ClientConfig, DiscordIpcError};

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and connecting an [`IpcClient`].
///
/// # Example
///
/// ```rust,no_run
/// use std::os::unix::net::UnixStream;
///
/// use discord_ipc::prelude::*;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let stream = UnixStream::connect("/run/user/1000/discord-ipc-0")?;
/// let mut client = IpcClientBuilder::new("1234567890")
///     .connect(StreamTransport::new(stream.try_clone()?), StreamTransport::new(stream))?;
/// client.handle().subscribe(EventKind::VoiceChannelSelect)?;
/// client.run(&mut ())?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct IpcClientBuilder {
    config: ClientConfig,
}

impl IpcClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            config: ClientConfig::new(client_id),
        }
    }

    /// Sets the protocol version sent in the handshake.
    pub fn protocol_version(mut self, version: u32) -> Self {
        self.config.protocol_version = version;
        self
    }

    /// Sets the reader configuration.
    pub fn codec_config(mut self, codec: CodecConfig) -> Self {
        self.config.codec = codec;
        self
    }

    /// Sends the handshake and returns the connected client.
    pub fn connect<R: ReadFully, W: WriteBytes>(
        self,
        read: R,
        write: W,
    ) -> Result<IpcClient<R, W>, DiscordIpcError> {
        IpcClient::connect(read, write, self.config)
    }
}

// ---------------------------------------------------------------------------
// IpcClient
// ---------------------------------------------------------------------------

/// A connection to the desktop client.
///
/// Created by [`IpcClient::connect`], which sends the handshake. The
/// desktop client answers with a `READY` event (or a Close packet if it
/// rejects the client id), delivered by the next [`poll`](Self::poll).
#[derive(Debug)]
pub struct IpcClient<R, W> {
    reader: PacketReader<R>,
    handle: ClientHandle<W>,
}

impl<R: ReadFully, W: WriteBytes> IpcClient<R, W> {
    /// Wraps the two transport halves and sends the handshake.
    ///
    /// # Errors
    /// Fails if the handshake cannot be written.
    pub fn connect(read: R, write: W, config: ClientConfig) -> Result<Self, DiscordIpcError> {
        let reader = PacketReader::with_config(read, config.codec);
        let handle = ClientHandle::new(PacketWriter::new(write));

        handle.send(HandshakePacket {
            v: config.protocol_version,
            client_id: config.client_id.clone(),
        })?;
        tracing::info!(
            client_id = %config.client_id,
            version = config.protocol_version,
            "handshake sent"
        );

        Ok(Self { reader, handle })
    }

    /// Returns a handle for sending packets, usable from any thread.
    pub fn handle(&self) -> ClientHandle<W> {
        self.handle.clone()
    }

    /// Reads one packet and reacts to it.
    ///
    /// - Events are dispatched to `listener`.
    /// - Pings are answered with a pong carrying the same payload.
    /// - A Close packet ends the session with [`DiscordIpcError::Closed`].
    ///
    /// Returns the packet that was read, or `Ok(None)` if none was
    /// available (see [`PacketReader::read`]).
    pub fn poll<L: EventListener + ?Sized>(
        &mut self,
        listener: &mut L,
    ) -> Result<Option<Packet>, DiscordIpcError> {
        Ok(self.poll_frame(listener)?.into_packet())
    }

    /// Like [`poll`](Self::poll), but says whether a missing packet was a
    /// skipped frame or an exhausted transport.
    pub fn poll_frame<L: EventListener + ?Sized>(
        &mut self,
        listener: &mut L,
    ) -> Result<ReadOutcome, DiscordIpcError> {
        let outcome = self.reader.read_frame()?;
        if let ReadOutcome::Packet(packet) = &outcome {
            self.react(packet, listener)?;
        }
        Ok(outcome)
    }

    fn react<L: EventListener + ?Sized>(
        &self,
        packet: &Packet,
        listener: &mut L,
    ) -> Result<(), DiscordIpcError> {
        match packet {
            Packet::Ping(ping) => {
                tracing::trace!("answering ping");
                self.handle.send(ping.to_pong())?;
            }
            Packet::Close(close) => {
                tracing::info!(code = close.code, message = %close.message, "closed by peer");
                return Err(DiscordIpcError::Closed {
                    code: close.code,
                    message: close.message.clone(),
                });
            }
            Packet::IncomingFrame(frame) => {
                if let Some(event) = frame.data().event() {
                    tracing::debug!(evt = %event.kind(), nonce = ?frame.nonce, "dispatching event");
                    event.dispatch(listener);
                }
            }
            Packet::Handshake(_) | Packet::OutgoingFrame(_) | Packet::Pong(_) => {}
        }
        Ok(())
    }

    /// Polls until the transport is exhausted.
    ///
    /// Skipped frames do not stop the loop. With a blocking transport
    /// this runs until the peer disconnects. Errors (including a Close
    /// packet) stop the loop and are returned.
    pub fn run<L: EventListener + ?Sized>(&mut self, listener: &mut L) -> Result<(), DiscordIpcError> {
        while !self.poll_frame(listener)?.is_unavailable() {}
        tracing::info!("connection ended");
        Ok(())
    }

    /// Splits the client into its reader and write handle.
    pub fn into_parts(self) -> (PacketReader<R>, ClientHandle<W>) {
        (self.reader, self.handle)
    }
}

// ---------------------------------------------------------------------------
// ClientHandle
// ---------------------------------------------------------------------------

/// The shared write half of an [`IpcClient`].
///
/// Cloning is cheap (an `Arc`); every clone writes through the same
/// mutex-guarded writer.
#[derive(Debug)]
pub struct ClientHandle<W> {
    writer: Arc<Mutex<PacketWriter<W>>>,
}

impl<W> Clone for ClientHandle<W> {
    fn clone(&self) -> Self {
        Self {
            writer: Arc::clone(&self.writer),
        }
    }
}

impl<W: WriteBytes> ClientHandle<W> {
    fn new(writer: PacketWriter<W>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    /// Writes one packet. Blocks while another handle is writing.
    pub fn send(&self, packet: impl Into<Packet>) -> Result<(), DiscordIpcError> {
        let packet = packet.into();
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| DiscordIpcError::WriterPoisoned)?;
        writer.write(&packet)?;
        Ok(())
    }

    /// Sends a command with a fresh nonce and returns the nonce, so the
    /// response can be matched against it.
    pub fn command(&self, cmd: Command, args: Option<Value>) -> Result<String, DiscordIpcError> {
        let nonce = generate_nonce();
        self.send(OutgoingFrame::command(cmd, args, nonce.clone()))?;
        tracing::debug!(?cmd, %nonce, "command sent");
        Ok(nonce)
    }

    /// Subscribes to `evt`. Returns the command's nonce.
    pub fn subscribe(&self, evt: EventKind) -> Result<String, DiscordIpcError> {
        let nonce = generate_nonce();
        self.send(OutgoingFrame::subscribe(evt, nonce.clone()))?;
        tracing::debug!(%evt, %nonce, "subscribed");
        Ok(nonce)
    }

    /// Unsubscribes from `evt`. Returns the command's nonce.
    pub fn unsubscribe(&self, evt: EventKind) -> Result<String, DiscordIpcError> {
        let nonce = generate_nonce();
        self.send(OutgoingFrame::unsubscribe(evt, nonce.clone()))?;
        tracing::debug!(%evt, %nonce, "unsubscribed");
        Ok(nonce)
    }

    /// Tells the desktop client this side is closing the connection.
    ///
    /// Only sends the Close packet; shutting down the socket is up to
    /// the host.
    pub fn close(&self, code: i32, message: impl Into<String>) -> Result<(), DiscordIpcError> {
        let message = message.into();
        self.send(ClosePacket {
            code,
            message: message.clone(),
        })?;
        tracing::info!(code, %message, "close sent");
        Ok(())
    }

    /// Takes back the writer once this is the last handle.
    ///
    /// Returns `None` while other clones are still alive.
    pub fn try_into_writer(self) -> Option<PacketWriter<W>> {
        let mutex = Arc::try_unwrap(self.writer).ok()?;
        Some(mutex.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }
}

/// Generates a random 32-character hex nonce (128 bits).
fn generate_nonce() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_is_32_hex_chars() {
        let nonce = generate_nonce();
        assert_eq!(nonce.len(), 32);
        assert!(nonce.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_nonces_differ() {
        assert_ne!(generate_nonce(), generate_nonce());
    }

    #[test]
    fn test_builder_overrides() {
        let builder = IpcClientBuilder::new("42")
            .protocol_version(2)
            .codec_config(CodecConfig {
                drain_chunk_size: 16,
                ..CodecConfig::default()
            });
        assert_eq!(builder.config.client_id, "42");
        assert_eq!(builder.config.protocol_version, 2);
        assert_eq!(builder.config.codec.drain_chunk_size, 16);
    }
}
