//! Logs the user's voice channel as it changes.
//!
//! ```text
//! voice-watch [SOCKET] [CLIENT_ID]
//! ```
//!
//! `SOCKET` defaults to `$XDG_RUNTIME_DIR/discord-ipc-0`; `CLIENT_ID`
//! falls back to the `DISCORD_CLIENT_ID` environment variable.

#![cfg_attr(not(unix), allow(dead_code))]

use discord_ipc::prelude::*;

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

struct VoiceWatch<W: WriteBytes> {
    handle: ClientHandle<W>,
}

impl<W: WriteBytes> EventListener for VoiceWatch<W> {
    fn on_ready(&mut self, event: &ReadyEvent) {
        let user = event.user.as_ref().map(|u| u.username.as_str());
        tracing::info!(version = ?event.v, ?user, "ready");

        if let Err(err) = self.handle.subscribe(EventKind::VoiceChannelSelect) {
            tracing::error!(%err, "subscribe failed");
        }
    }

    fn on_voice_channel_select(&mut self, event: &VoiceChannelSelectEvent) {
        if event.is_leave() {
            tracing::info!("left voice");
        } else {
            tracing::info!(
                channel_id = ?event.channel_id,
                guild_id = ?event.guild_id,
                "joined voice channel"
            );
        }
    }

    fn on_error(&mut self, event: &ErrorEvent) {
        tracing::warn!(code = event.code, message = %event.message, "error from desktop client");
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::os::unix::net::UnixStream;
    use std::path::PathBuf;

    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let socket = match args.next() {
        Some(path) => PathBuf::from(path),
        None => {
            let dir = std::env::var_os("XDG_RUNTIME_DIR").unwrap_or_else(|| "/tmp".into());
            PathBuf::from(dir).join("discord-ipc-0")
        }
    };
    let client_id = match args.next() {
        Some(id) => id,
        None => std::env::var("DISCORD_CLIENT_ID")
            .map_err(|_| "usage: voice-watch [SOCKET] [CLIENT_ID] (or set DISCORD_CLIENT_ID)")?,
    };

    tracing::info!(socket = %socket.display(), "connecting");
    let stream = UnixStream::connect(&socket)?;
    let mut client = IpcClientBuilder::new(client_id).connect(
        StreamTransport::new(stream.try_clone()?),
        StreamTransport::new(stream),
    )?;

    let mut listener = VoiceWatch {
        handle: client.handle(),
    };
    match client.run(&mut listener) {
        Err(DiscordIpcError::Closed { code, message }) => {
            tracing::warn!(code, %message, "desktop client closed the connection");
            Ok(())
        }
        other => Ok(other?),
    }
}

#[cfg(not(unix))]
fn main() {
    eprintln!("voice-watch only supports Unix domain sockets");
}
