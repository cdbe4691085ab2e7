//! Reading and writing whole packets over a transport.
//!
//! [`PacketReader`] strips frame headers and decodes payloads;
//! [`PacketWriter`] does the reverse. [`PacketCodec`] bundles one of each
//! for hosts that read and write from the same thread.

use discord_ipc_transport::{ReadFully, WriteBytes};

use crate::{
    Codec, CodecConfig, FrameHeader, HEADER_SIZE, JsonCodec, Packet, ProtocolError,
    UnknownOpcodePolicy,
};

// ---------------------------------------------------------------------------
// ReadOutcome
// ---------------------------------------------------------------------------

/// What one [`PacketReader::read_frame`] call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A decoded packet.
    Packet(Packet),
    /// A whole frame was read past without decoding it (unknown or
    /// outbound-only opcode). More frames may follow.
    Skipped,
    /// The transport could not supply a full frame.
    Unavailable,
}

impl ReadOutcome {
    /// The packet, if one was decoded.
    pub fn into_packet(self) -> Option<Packet> {
        match self {
            Self::Packet(packet) => Some(packet),
            Self::Skipped | Self::Unavailable => None,
        }
    }

    /// `true` if the transport ran dry.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

// ---------------------------------------------------------------------------
// PacketReader
// ---------------------------------------------------------------------------

/// Reads packets from a [`ReadFully`] transport.
///
/// `read` takes `&mut self`, so a reader can never be driven from two
/// threads at once. All scratch state lives on the stack of a single
/// `read` call.
#[derive(Debug)]
pub struct PacketReader<R, C = JsonCodec> {
    transport: R,
    codec: C,
    config: CodecConfig,
}

impl<R: ReadFully> PacketReader<R> {
    /// A reader with the JSON codec and default configuration.
    pub fn new(transport: R) -> Self {
        Self::with_codec(transport, JsonCodec, CodecConfig::default())
    }

    /// A reader with the JSON codec and the given configuration.
    pub fn with_config(transport: R, config: CodecConfig) -> Self {
        Self::with_codec(transport, JsonCodec, config)
    }
}

impl<R: ReadFully, C: Codec> PacketReader<R, C> {
    /// A reader with a custom codec.
    pub fn with_codec(transport: R, codec: C, config: CodecConfig) -> Self {
        Self {
            transport,
            codec,
            config,
        }
    }

    /// Reads the next packet.
    ///
    /// Returns `Ok(None)` when no packet is available: the transport
    /// could not fill the header or the payload (peer closed, or no data
    /// yet), or the frame's opcode is not one this reader decodes. Call
    /// again later, or stop if the peer is gone. Use
    /// [`read_frame`](Self::read_frame) to tell those cases apart.
    ///
    /// # Errors
    /// - `ProtocolError::Transport` if the transport failed.
    /// - A structural error (`Decode`, `InvalidUtf8`, `UnknownEvent`,
    ///   `MissingField`) if the payload was read but is invalid. The
    ///   whole frame has been consumed, so the next `read` is unaffected.
    /// - `ProtocolError::PayloadTooLarge` if the header announces more
    ///   than [`CodecConfig::max_payload_len`] bytes. The payload is
    ///   handled like an unknown opcode's first.
    pub fn read(&mut self) -> Result<Option<Packet>, ProtocolError> {
        Ok(self.read_frame()?.into_packet())
    }

    /// Reads the next frame, reporting why no packet came out of it.
    ///
    /// Errors are the same as for [`read`](Self::read).
    pub fn read_frame(&mut self) -> Result<ReadOutcome, ProtocolError> {
        let mut raw_header = [0u8; HEADER_SIZE];
        if !self.transport.read_fully(&mut raw_header)? {
            tracing::trace!("no frame header available");
            return Ok(ReadOutcome::Unavailable);
        }

        let header = FrameHeader::decode(&raw_header);
        tracing::trace!(opcode = header.opcode, length = header.length, "read frame header");

        let opcode = match header.opcode_kind() {
            Some(opcode) if opcode.is_inbound() => opcode,
            _ => {
                tracing::warn!(
                    opcode = header.opcode,
                    length = header.length,
                    policy = ?self.config.unknown_opcode,
                    "skipping frame with undecodable opcode"
                );
                return self.skip_payload(header);
            }
        };

        let length = header.length as usize;
        if length > self.config.max_payload_len {
            tracing::warn!(
                %opcode,
                length,
                limit = self.config.max_payload_len,
                "frame payload exceeds limit"
            );
            return match self.skip_payload(header)? {
                ReadOutcome::Unavailable => Ok(ReadOutcome::Unavailable),
                _ => Err(ProtocolError::PayloadTooLarge(length)),
            };
        }

        let mut payload = vec![0u8; length];
        if !self.transport.read_fully(&mut payload)? {
            tracing::debug!(%opcode, length, "frame payload incomplete");
            return Ok(ReadOutcome::Unavailable);
        }

        let text = std::str::from_utf8(&payload).map_err(ProtocolError::InvalidUtf8)?;
        tracing::trace!(%opcode, payload = text, "read frame payload");

        Ok(match Packet::decode(&self.codec, opcode, text.as_bytes())? {
            Some(packet) => ReadOutcome::Packet(packet),
            None => ReadOutcome::Skipped,
        })
    }

    /// Applies the unknown-opcode policy to a frame that will not be decoded.
    fn skip_payload(&mut self, header: FrameHeader) -> Result<ReadOutcome, ProtocolError> {
        if self.config.unknown_opcode == UnknownOpcodePolicy::Abandon {
            return Ok(ReadOutcome::Skipped);
        }

        let mut remaining = header.length as usize;
        let mut scratch = vec![0u8; remaining.min(self.config.drain_chunk_size.max(1))];
        while remaining > 0 {
            let chunk = remaining.min(scratch.len());
            if !self.transport.read_fully(&mut scratch[..chunk])? {
                tracing::debug!(remaining, "stream ended while draining frame");
                return Ok(ReadOutcome::Unavailable);
            }
            remaining -= chunk;
        }
        Ok(ReadOutcome::Skipped)
    }

    /// Returns a reference to the transport.
    pub fn get_ref(&self) -> &R {
        &self.transport
    }

    /// Returns a mutable reference to the transport.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.transport
    }

    /// Unwraps the transport.
    pub fn into_inner(self) -> R {
        self.transport
    }
}

// ---------------------------------------------------------------------------
// PacketWriter
// ---------------------------------------------------------------------------

/// Writes packets to a [`WriteBytes`] transport.
///
/// Each packet goes out as one `header ++ payload` buffer in a single
/// transport call. `write` takes `&mut self`; to write from several
/// threads, put the writer behind a mutex so frames never interleave.
#[derive(Debug)]
pub struct PacketWriter<W, C = JsonCodec> {
    transport: W,
    codec: C,
}

impl<W: WriteBytes> PacketWriter<W> {
    /// A writer with the JSON codec.
    pub fn new(transport: W) -> Self {
        Self::with_codec(transport, JsonCodec)
    }
}

impl<W: WriteBytes, C: Codec> PacketWriter<W, C> {
    /// A writer with a custom codec.
    pub fn with_codec(transport: W, codec: C) -> Self {
        Self { transport, codec }
    }

    /// Encodes `packet` and writes it as one frame.
    ///
    /// # Errors
    /// - `ProtocolError::Encode` / `PayloadTooLarge` if the payload
    ///   cannot be encoded, or `MissingField("evt")` for a `DISPATCH`
    ///   frame without an event. Nothing is written in those cases.
    /// - `ProtocolError::Transport` if the transport failed.
    pub fn write(&mut self, packet: &Packet) -> Result<(), ProtocolError> {
        let opcode = packet.opcode();
        let payload = packet.encode(&self.codec)?;
        let header = FrameHeader::new(opcode, payload.len())?;

        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
        frame.extend_from_slice(&header.encode());
        frame.extend_from_slice(&payload);

        self.transport.write(&frame)?;
        tracing::debug!(%opcode, length = header.length, "wrote packet");
        Ok(())
    }

    /// Returns a reference to the transport.
    pub fn get_ref(&self) -> &W {
        &self.transport
    }

    /// Returns a mutable reference to the transport.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.transport
    }

    /// Unwraps the transport.
    pub fn into_inner(self) -> W {
        self.transport
    }
}

// ---------------------------------------------------------------------------
// PacketCodec
// ---------------------------------------------------------------------------

/// A reader and a writer driven together from one thread.
#[derive(Debug)]
pub struct PacketCodec<R, W, C = JsonCodec> {
    reader: PacketReader<R, C>,
    writer: PacketWriter<W, C>,
}

impl<R: ReadFully, W: WriteBytes> PacketCodec<R, W> {
    /// A codec over the given read and write halves.
    pub fn new(read: R, write: W) -> Self {
        Self::with_config(read, write, CodecConfig::default())
    }

    /// A codec with the given reader configuration.
    pub fn with_config(read: R, write: W, config: CodecConfig) -> Self {
        Self::with_codec(read, write, JsonCodec, config)
    }
}

impl<R: ReadFully, W: WriteBytes, C: Codec + Clone> PacketCodec<R, W, C> {
    /// A codec with a custom payload codec.
    pub fn with_codec(read: R, write: W, codec: C, config: CodecConfig) -> Self {
        Self {
            reader: PacketReader::with_codec(read, codec.clone(), config),
            writer: PacketWriter::with_codec(write, codec),
        }
    }
}

impl<R: ReadFully, W: WriteBytes, C: Codec> PacketCodec<R, W, C> {
    /// See [`PacketReader::read`].
    pub fn read(&mut self) -> Result<Option<Packet>, ProtocolError> {
        self.reader.read()
    }

    /// See [`PacketReader::read_frame`].
    pub fn read_frame(&mut self) -> Result<ReadOutcome, ProtocolError> {
        self.reader.read_frame()
    }

    /// See [`PacketWriter::write`].
    pub fn write(&mut self, packet: &Packet) -> Result<(), ProtocolError> {
        self.writer.write(packet)
    }

    /// Separates the reader from the writer, e.g. to move the reader
    /// onto its own thread.
    pub fn split(self) -> (PacketReader<R, C>, PacketWriter<W, C>) {
        (self.reader, self.writer)
    }
}
