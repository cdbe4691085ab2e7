//! Packet types: the payloads that travel inside a frame.
//!
//! The frame header's opcode decides which of these a payload is:
//!
//! | Opcode | Value | Payload |
//! |--------|-------|---------|
//! | `Handshake` | 0 | [`HandshakePacket`] (outbound only) |
//! | `Frame` | 1 | [`OutgoingFrame`] / [`IncomingFrame`] |
//! | `Close` | 2 | [`ClosePacket`] |
//! | `Ping` | 3 | [`PingPacket`] |
//! | `Pong` | 4 | [`PongPacket`] |

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::{Codec, Event, EventKind, ProtocolError};

/// The protocol version sent in the handshake.
pub const PROTOCOL_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Opcode
// ---------------------------------------------------------------------------

/// Packet kind carried in the first four bytes of every frame header.
///
/// The discriminant values are the wire values and must never change.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Handshake = 0,
    Frame = 1,
    Close = 2,
    Ping = 3,
    Pong = 4,
}

impl Opcode {
    /// Classifies a raw opcode. `None` for values outside the known set.
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Handshake),
            1 => Some(Self::Frame),
            2 => Some(Self::Close),
            3 => Some(Self::Ping),
            4 => Some(Self::Pong),
            _ => None,
        }
    }

    /// The wire value of this opcode.
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Returns `true` if packets with this opcode can be decoded when
    /// received. The handshake only ever flows from client to server.
    pub const fn is_inbound(self) -> bool {
        !matches!(self, Self::Handshake)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Handshake => "HANDSHAKE",
            Self::Frame => "FRAME",
            Self::Close => "CLOSE",
            Self::Ping => "PING",
            Self::Pong => "PONG",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Handshake
// ---------------------------------------------------------------------------

/// The first packet a client sends: `{"v": 1, "client_id": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakePacket {
    /// Protocol version.
    pub v: u32,
    /// The application's client id.
    pub client_id: String,
}

impl HandshakePacket {
    /// A handshake for `client_id` at [`PROTOCOL_VERSION`].
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            client_id: client_id.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// The `cmd` property of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// The client is pushing an event; `evt` says which.
    Dispatch,
    Authorize,
    Authenticate,
    Subscribe,
    Unsubscribe,
    GetSelectedVoiceChannel,
    SetActivity,
}

/// A frame packet (opcode `Frame`), generic over what it carries.
///
/// The same opcode is used in both directions, but the shapes differ:
/// commands go out as [`OutgoingFrame`], responses and events come in as
/// [`IncomingFrame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePacket<T> {
    /// The command this frame issues or answers.
    pub cmd: Command,
    /// Correlates a response with the command that caused it. Events
    /// pushed by the client have no nonce.
    pub nonce: Option<String>,
    /// The frame's payload.
    pub data: T,
}

impl<T> FramePacket<T> {
    /// The frame's payload.
    pub fn data(&self) -> &T {
        &self.data
    }
}

/// What an outgoing command carries besides its name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandArgs {
    /// Command arguments, omitted from the wire when `None`.
    pub args: Option<Value>,
    /// Event name for `SUBSCRIBE` / `UNSUBSCRIBE`.
    pub evt: Option<EventKind>,
}

/// A command sent to the desktop client.
pub type OutgoingFrame = FramePacket<CommandArgs>;

impl OutgoingFrame {
    /// A command frame with the given arguments.
    pub fn command(cmd: Command, args: Option<Value>, nonce: impl Into<String>) -> Self {
        Self {
            cmd,
            nonce: Some(nonce.into()),
            data: CommandArgs { args, evt: None },
        }
    }

    /// A `SUBSCRIBE` frame for `evt`.
    pub fn subscribe(evt: EventKind, nonce: impl Into<String>) -> Self {
        Self::with_event(Command::Subscribe, evt, nonce.into())
    }

    /// An `UNSUBSCRIBE` frame for `evt`.
    pub fn unsubscribe(evt: EventKind, nonce: impl Into<String>) -> Self {
        Self::with_event(Command::Unsubscribe, evt, nonce.into())
    }

    fn with_event(cmd: Command, evt: EventKind, nonce: String) -> Self {
        Self {
            cmd,
            nonce: Some(nonce),
            data: CommandArgs {
                args: Some(Value::Object(serde_json::Map::new())),
                evt: Some(evt),
            },
        }
    }
}

/// What an incoming frame carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameData {
    /// The frame had an `evt` discriminator; `data` was parsed against it.
    Event(Event),
    /// A command response without `evt`; `data` is kept as raw JSON
    /// (`Value::Null` when absent).
    Response(Value),
}

impl FrameData {
    /// The event, if this frame carried one.
    pub fn event(&self) -> Option<&Event> {
        match self {
            Self::Event(event) => Some(event),
            Self::Response(_) => None,
        }
    }
}

impl Serialize for FrameData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Event(event) => event.serialize(serializer),
            Self::Response(value) => value.serialize(serializer),
        }
    }
}

/// A response or event received from the desktop client.
pub type IncomingFrame = FramePacket<FrameData>;

impl IncomingFrame {
    /// An event frame as the client sends it: `cmd: DISPATCH`, no nonce.
    pub fn dispatch(event: impl Into<Event>) -> Self {
        Self {
            cmd: Command::Dispatch,
            nonce: None,
            data: FrameData::Event(event.into()),
        }
    }

    /// Second decode phase: resolves `data` against the `evt` sibling.
    fn from_raw(raw: RawFrame) -> Result<Self, ProtocolError> {
        check_dispatch_has_event(raw.cmd, raw.evt.is_some())?;
        let data = match raw.evt {
            Some(evt) => FrameData::Event(Event::from_parts(&evt, raw.data)?),
            None => FrameData::Response(raw.data),
        };
        Ok(Self {
            cmd: raw.cmd,
            nonce: raw.nonce,
            data,
        })
    }
}

/// `DISPATCH` frames always name their event.
fn check_dispatch_has_event(cmd: Command, has_event: bool) -> Result<(), ProtocolError> {
    if cmd == Command::Dispatch && !has_event {
        return Err(ProtocolError::MissingField("evt"));
    }
    Ok(())
}

/// First decode phase: the envelope, with `evt` and `data` left raw.
#[derive(Deserialize)]
struct RawFrame {
    cmd: Command,
    #[serde(default)]
    evt: Option<String>,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    nonce: Option<String>,
}

#[derive(Serialize)]
struct OutgoingWire<'a> {
    cmd: Command,
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    evt: Option<EventKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nonce: Option<&'a str>,
}

#[derive(Serialize)]
struct IncomingWire<'a> {
    cmd: Command,
    #[serde(skip_serializing_if = "Option::is_none")]
    evt: Option<EventKind>,
    #[serde(skip_serializing_if = "is_absent")]
    data: &'a FrameData,
    #[serde(skip_serializing_if = "Option::is_none")]
    nonce: Option<&'a str>,
}

fn is_absent(data: &&FrameData) -> bool {
    matches!(data, FrameData::Response(Value::Null))
}

impl Serialize for OutgoingFrame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        OutgoingWire {
            cmd: self.cmd,
            args: self.data.args.as_ref(),
            evt: self.data.evt,
            nonce: self.nonce.as_deref(),
        }
        .serialize(serializer)
    }
}

impl Serialize for IncomingFrame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        IncomingWire {
            cmd: self.cmd,
            evt: self.data.event().map(Event::kind),
            data: &self.data,
            nonce: self.nonce.as_deref(),
        }
        .serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// Close, Ping, Pong
// ---------------------------------------------------------------------------

/// Sent by either side before closing the connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosePacket {
    pub code: i32,
    pub message: String,
}

/// Keep-alive request. The payload is opaque and must be echoed in a
/// [`PongPacket`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PingPacket(pub Value);

/// Reply to a [`PingPacket`], carrying the same payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PongPacket(pub Value);

impl PingPacket {
    /// The pong that answers this ping.
    pub fn to_pong(&self) -> PongPacket {
        PongPacket(self.0.clone())
    }
}

// ---------------------------------------------------------------------------
// Packet
// ---------------------------------------------------------------------------

/// Any packet, tagged by kind.
///
/// Every variant has a schema and an opcode, so there is no way to build
/// a packet that cannot be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Handshake(HandshakePacket),
    OutgoingFrame(OutgoingFrame),
    IncomingFrame(IncomingFrame),
    Close(ClosePacket),
    Ping(PingPacket),
    Pong(PongPacket),
}

impl Packet {
    /// The opcode written in this packet's frame header.
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Handshake(_) => Opcode::Handshake,
            Self::OutgoingFrame(_) | Self::IncomingFrame(_) => Opcode::Frame,
            Self::Close(_) => Opcode::Close,
            Self::Ping(_) => Opcode::Ping,
            Self::Pong(_) => Opcode::Pong,
        }
    }

    /// The event carried by this packet, if any.
    pub fn event(&self) -> Option<&Event> {
        match self {
            Self::IncomingFrame(frame) => frame.data.event(),
            _ => None,
        }
    }

    /// Serializes this packet's payload (without the frame header).
    ///
    /// # Errors
    /// - `ProtocolError::Encode` if serialization fails.
    /// - `ProtocolError::MissingField("evt")` for a `DISPATCH` frame
    ///   carrying a plain response, which could not be read back.
    pub fn encode<C: Codec>(&self, codec: &C) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Self::Handshake(p) => codec.encode(p),
            Self::OutgoingFrame(p) => codec.encode(p),
            Self::IncomingFrame(p) => {
                check_dispatch_has_event(p.cmd, p.data.event().is_some())?;
                codec.encode(p)
            }
            Self::Close(p) => codec.encode(p),
            Self::Ping(p) => codec.encode(p),
            Self::Pong(p) => codec.encode(p),
        }
    }

    /// Decodes a received payload according to its opcode.
    ///
    /// Returns `Ok(None)` for `Handshake`, which is never received.
    ///
    /// # Errors
    /// Any structural problem with the payload: malformed JSON, missing
    /// required fields, an unknown `cmd` or an unknown `evt`.
    pub fn decode<C: Codec>(
        codec: &C,
        opcode: Opcode,
        payload: &[u8],
    ) -> Result<Option<Self>, ProtocolError> {
        let packet = match opcode {
            Opcode::Handshake => return Ok(None),
            Opcode::Frame => {
                let raw: RawFrame = codec.decode(payload)?;
                Self::IncomingFrame(IncomingFrame::from_raw(raw)?)
            }
            Opcode::Close => Self::Close(codec.decode(payload)?),
            Opcode::Ping => Self::Ping(codec.decode(payload)?),
            Opcode::Pong => Self::Pong(codec.decode(payload)?),
        };
        Ok(Some(packet))
    }
}

impl From<HandshakePacket> for Packet {
    fn from(packet: HandshakePacket) -> Self {
        Self::Handshake(packet)
    }
}

impl From<OutgoingFrame> for Packet {
    fn from(packet: OutgoingFrame) -> Self {
        Self::OutgoingFrame(packet)
    }
}

impl From<IncomingFrame> for Packet {
    fn from(packet: IncomingFrame) -> Self {
        Self::IncomingFrame(packet)
    }
}

impl From<ClosePacket> for Packet {
    fn from(packet: ClosePacket) -> Self {
        Self::Close(packet)
    }
}

impl From<PingPacket> for Packet {
    fn from(packet: PingPacket) -> Self {
        Self::Ping(packet)
    }
}

impl From<PongPacket> for Packet {
    fn from(packet: PongPacket) -> Self {
        Self::Pong(packet)
    }
}

// =========================================================================
// Tests
// =========================================================================
