//! Wire protocol for Discord's local IPC socket.
//!
//! This crate defines what travels between a client and the desktop
//! application, and how:
//!
//! - **Header** ([`FrameHeader`]): the 8-byte little-endian
//!   `opcode` + `length` prefix of every frame.
//! - **Packets** ([`Packet`], [`Opcode`], [`FramePacket`], …): the typed
//!   payloads selected by the opcode.
//! - **Events** ([`Event`], [`EventKind`]): what the desktop client
//!   dispatches inside incoming frames, selected by the `evt` property.
//! - **Codec** ([`Codec`], [`JsonCodec`]): payload bytes ↔ Rust types.
//! - **Framing** ([`PacketReader`], [`PacketWriter`], [`PacketCodec`]):
//!   whole packets over a transport.
//! - **Dispatch** ([`EventListener`]): per-variant event handlers.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → FrameHeader → Packet → Event → EventListener
//! ```
//!
//! The crate never opens a socket. It reads through
//! [`ReadFully`](discord_ipc_transport::ReadFully) and writes through
//! [`WriteBytes`](discord_ipc_transport::WriteBytes).

mod codec;
mod config;
mod dispatch;
mod error;
mod event;
mod framed;
mod header;
mod packet;

pub use codec::{Codec, JsonCodec};
pub use config::{CodecConfig, UnknownOpcodePolicy};
pub use dispatch::EventListener;
pub use error::ProtocolError;
pub use event::{
    ErrorEvent, Event, EventKind, ReadyConfig, ReadyEvent, User, VoiceChannelSelectEvent,
};
pub use framed::{PacketCodec, PacketReader, PacketWriter, ReadOutcome};
pub use header::{FrameHeader, HEADER_SIZE};
pub use packet::{
    ClosePacket, Command, CommandArgs, FrameData, FramePacket, HandshakePacket, IncomingFrame,
    Opcode, OutgoingFrame, Packet, PingPacket, PongPacket, PROTOCOL_VERSION,
};
