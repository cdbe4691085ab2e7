//! # discord-ipc
//!
//! Client for the local IPC socket of the Discord desktop application.
//!
//! The sub-crates do the real work: `discord-ipc-transport` defines the
//! byte-level transport shim, `discord-ipc-protocol` frames and decodes
//! packets. This crate adds [`IpcClient`], which sends the handshake,
//! answers pings, dispatches events to an
//! [`EventListener`](discord_ipc_protocol::EventListener) and lets other
//! threads send commands through a [`ClientHandle`].
//!
//! Finding the socket (`$XDG_RUNTIME_DIR/discord-ipc-0`,
//! `\\.\pipe\discord-ipc-0`, …) is up to the host.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use discord_ipc::prelude::*;
//!
//! struct Printer;
//!
//! impl EventListener for Printer {
//!     fn on_voice_channel_select(&mut self, event: &VoiceChannelSelectEvent) {
//!         println!("voice channel: {:?}", event.channel_id);
//!     }
//! }
//!
//! // let mut client = IpcClientBuilder::new(client_id).connect(read, write)?;
//! // client.handle().subscribe(EventKind::VoiceChannelSelect)?;
//! // client.run(&mut Printer)?;
//! ```

mod client;
mod config;
mod error;

pub use client::{ClientHandle, IpcClient, IpcClientBuilder};
pub use config::ClientConfig;
pub use error::DiscordIpcError;

pub use discord_ipc_protocol as protocol;
pub use discord_ipc_transport as transport;

pub mod prelude {
    //! Everything a typical host needs, in one import.

    pub use crate::{ClientConfig, ClientHandle, DiscordIpcError, IpcClient, IpcClientBuilder};
    pub use discord_ipc_protocol::{
        ClosePacket, Command, ErrorEvent, Event, EventKind, EventListener, Packet, ReadOutcome,
        ReadyEvent, VoiceChannelSelectEvent,
    };
    pub use discord_ipc_transport::{ReadFully, StreamTransport, WriteBytes};
}
