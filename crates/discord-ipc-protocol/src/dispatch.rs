//! The `EventListener` trait: how hosts react to decoded events.
//!
//! Hosts implement only the handlers they care about. Every handler has
//! a no-op default, and [`EventListener::on_event`] routes an [`Event`]
//! to its handler with an exhaustive `match`, so a new event variant is
//! a compile error here and nowhere else.

use crate::{ErrorEvent, Event, ReadyEvent, VoiceChannelSelectEvent};

/// Receives events dispatched by the desktop client.
///
/// # Example
///
/// ```rust
/// use discord_ipc_protocol::{Event, EventListener, VoiceChannelSelectEvent};
///
/// #[derive(Default)]
/// struct VoiceTracker {
///     channel: Option<String>,
/// }
///
/// impl EventListener for VoiceTracker {
///     fn on_voice_channel_select(&mut self, event: &VoiceChannelSelectEvent) {
///         self.channel = event.channel_id.clone();
///     }
/// }
///
/// let mut tracker = VoiceTracker::default();
/// let event = Event::VoiceChannelSelect(VoiceChannelSelectEvent {
///     channel_id: Some("123".into()),
///     guild_id: None,
/// });
/// event.dispatch(&mut tracker);
/// assert_eq!(tracker.channel.as_deref(), Some("123"));
/// ```
pub trait EventListener {
    /// Called for every event. The default routes to the handler for
    /// the event's variant; override it to see every event in one place.
    fn on_event(&mut self, event: &Event) {
        match event {
            Event::Ready(e) => self.on_ready(e),
            Event::VoiceChannelSelect(e) => self.on_voice_channel_select(e),
            Event::Error(e) => self.on_error(e),
        }
    }

    /// The client accepted the handshake. Default: no-op.
    fn on_ready(&mut self, _event: &ReadyEvent) {}

    /// The user joined, switched or left a voice channel. Default: no-op.
    fn on_voice_channel_select(&mut self, _event: &VoiceChannelSelectEvent) {}

    /// A command failed. Default: no-op.
    fn on_error(&mut self, _event: &ErrorEvent) {}
}

impl<L: EventListener + ?Sized> EventListener for &mut L {
    fn on_event(&mut self, event: &Event) {
        (**self).on_event(event);
    }

    fn on_ready(&mut self, event: &ReadyEvent) {
        (**self).on_ready(event);
    }

    fn on_voice_channel_select(&mut self, event: &VoiceChannelSelectEvent) {
        (**self).on_voice_channel_select(event);
    }

    fn on_error(&mut self, event: &ErrorEvent) {
        (**self).on_error(event);
    }
}

/// A listener that ignores everything.
impl EventListener for () {}
