//! Events dispatched by the desktop client.
//!
//! An event arrives inside an incoming frame. The frame carries the
//! event's name in its `evt` property and the event's fields in its
//! `data` property, side by side:
//!
//! ```json
//! { "cmd": "DISPATCH", "evt": "VOICE_CHANNEL_SELECT",
//!   "data": { "channel_id": "123", "guild_id": "456" }, "nonce": null }
//! ```
//!
//! The discriminator lives *outside* the object it selects. Serde's
//! internally and adjacently tagged enums cannot express that shape
//! (the tag would have to be inside `data`, or `data` would have to be
//! the only other key), so decoding happens in two phases: the frame
//! layer captures `evt` and `data` as raw values, then
//! [`Event::from_parts`] picks the schema by name and parses `data`
//! against it. Encoding mirrors that with [`Event::kind`] and the
//! payload-only `Serialize` impl.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::{EventListener, ProtocolError};

// ---------------------------------------------------------------------------
// EventKind: the discriminator
// ---------------------------------------------------------------------------

/// The name of an event as it appears in a frame's `evt` property.
///
/// Also used as the argument of `SUBSCRIBE` / `UNSUBSCRIBE` commands.
/// `#[serde(rename_all = "SCREAMING_SNAKE_CASE")]` makes
/// `VoiceChannelSelect` travel as `"VOICE_CHANNEL_SELECT"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// The client finished the handshake and is ready for commands.
    Ready,
    /// The user joined, switched or left a voice channel.
    VoiceChannelSelect,
    /// A previously sent command failed.
    Error,
}

impl EventKind {
    /// Every known event kind.
    pub const ALL: [EventKind; 3] =
        [EventKind::Ready, EventKind::VoiceChannelSelect, EventKind::Error];

    /// The wire discriminator for this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::VoiceChannelSelect => "VOICE_CHANNEL_SELECT",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownEvent(s.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Event payloads
// ---------------------------------------------------------------------------

/// Sent once the client accepted the handshake.
///
/// Nothing here is required; the event itself is the signal. The client
/// usually includes the protocol version, some environment metadata and
/// the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReadyEvent {
    /// Protocol version the client speaks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<u32>,

    /// Client environment metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ReadyConfig>,

    /// The user logged into the desktop client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Environment metadata carried by [`ReadyEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReadyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdn_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

/// A Discord user as described by the desktop client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Sent when the user joins, switches or leaves a voice channel.
///
/// Both ids are `None` when the user left voice entirely. Unlike every
/// other optional field in this crate, `None` is meaningful here, so it
/// is written as an explicit `null` instead of being omitted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoiceChannelSelectEvent {
    pub channel_id: Option<String>,
    pub guild_id: Option<String>,
}

impl VoiceChannelSelectEvent {
    /// Returns `true` if this event means the user left voice.
    pub fn is_leave(&self) -> bool {
        self.channel_id.is_none()
    }
}

/// Sent in reply to a command that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub code: i32,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A decoded event. Closed set: an unknown name is a decode error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Ready(ReadyEvent),
    VoiceChannelSelect(VoiceChannelSelectEvent),
    Error(ErrorEvent),
}

impl Event {
    /// The discriminator written next to this event's payload.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Ready(_) => EventKind::Ready,
            Self::VoiceChannelSelect(_) => EventKind::VoiceChannelSelect,
            Self::Error(_) => EventKind::Error,
        }
    }

    /// Second decode phase: parses `data` against the schema named by `evt`.
    ///
    /// # Errors
    /// - `ProtocolError::UnknownEvent` if `evt` names no known event.
    /// - `ProtocolError::MissingField("data")` if `data` is absent.
    /// - `ProtocolError::Decode` if `data` does not match the schema.
    pub fn from_parts(evt: &str, data: Value) -> Result<Self, ProtocolError> {
        let kind: EventKind = evt.parse()?;
        if data.is_null() {
            return Err(ProtocolError::MissingField("data"));
        }
        let event = match kind {
            EventKind::Ready => Self::Ready(parse(data)?),
            EventKind::VoiceChannelSelect => Self::VoiceChannelSelect(parse(data)?),
            EventKind::Error => Self::Error(parse(data)?),
        };
        Ok(event)
    }

    /// Hands this event to the matching handler of `listener`.
    pub fn dispatch<L: EventListener + ?Sized>(&self, listener: &mut L) {
        listener.on_event(self);
    }
}

fn parse<T: serde::de::DeserializeOwned>(data: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(ProtocolError::Decode)
}

/// Serializes only the payload; the discriminator is the frame's job.
impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Ready(e) => e.serialize(serializer),
            Self::VoiceChannelSelect(e) => e.serialize(serializer),
            Self::Error(e) => e.serialize(serializer),
        }
    }
}

impl From<ReadyEvent> for Event {
    fn from(event: ReadyEvent) -> Self {
        Self::Ready(event)
    }
}

impl From<VoiceChannelSelectEvent> for Event {
    fn from(event: VoiceChannelSelectEvent) -> Self {
        Self::VoiceChannelSelect(event)
    }
}

impl From<ErrorEvent> for Event {
    fn from(event: ErrorEvent) -> Self {
        Self::Error(event)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_event_kind_wire_names() {
        for kind in EventKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.as_str());
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_event_kind_rejects_unknown_name() {
        let err = "SOMETHING_UNDEFINED".parse::<EventKind>().unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownEvent(name) if name == "SOMETHING_UNDEFINED"));
    }

    #[test]
    fn test_event_kind_is_case_sensitive() {
        assert!("ready".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_from_parts_voice_channel_select() {
        let event = Event::from_parts(
            "VOICE_CHANNEL_SELECT",
            json!({ "channel_id": "123", "guild_id": "456" }),
        )
        .unwrap();
        assert_eq!(
            event,
            Event::VoiceChannelSelect(VoiceChannelSelectEvent {
                channel_id: Some("123".into()),
                guild_id: Some("456".into()),
            })
        );
    }

    #[test]
    fn test_voice_channel_select_serializes_explicit_nulls() {
        let event = VoiceChannelSelectEvent::default();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, json!({ "channel_id": null, "guild_id": null }));
        assert!(event.is_leave());
    }

    #[test]
    fn test_voice_channel_select_accepts_nulls_and_missing_keys() {
        let from_nulls = Event::from_parts(
            "VOICE_CHANNEL_SELECT",
            json!({ "channel_id": null, "guild_id": null }),
        )
        .unwrap();
        let from_empty = Event::from_parts("VOICE_CHANNEL_SELECT", json!({})).unwrap();
        let left = Event::VoiceChannelSelect(VoiceChannelSelectEvent::default());
        assert_eq!(from_nulls, left);
        assert_eq!(from_empty, left);
    }

    #[test]
    fn test_ready_omits_absent_fields() {
        let event = Event::Ready(ReadyEvent {
            v: Some(1),
            ..ReadyEvent::default()
        });
        assert_eq!(serde_json::to_value(&event).unwrap(), json!({ "v": 1 }));
    }

    #[test]
    fn test_ready_ignores_unknown_fields() {
        let event = Event::from_parts(
            "READY",
            json!({
                "v": 1,
                "config": { "cdn_host": "cdn.discordapp.com", "future": true },
                "user": { "id": "42", "username": "wumpus", "flags": 0 },
                "something_new": [1, 2, 3],
            }),
        )
        .unwrap();
        let Event::Ready(ready) = event else {
            panic!("expected READY");
        };
        assert_eq!(ready.v, Some(1));
        assert_eq!(
            ready.config.unwrap().cdn_host.as_deref(),
            Some("cdn.discordapp.com")
        );
        assert_eq!(ready.user.unwrap().username, "wumpus");
    }

    #[test]
    fn test_ready_user_requires_id() {
        let err = Event::from_parts("READY", json!({ "user": { "username": "wumpus" } }))
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_error_event_requires_code_and_message() {
        let err = Event::from_parts("ERROR", json!({ "code": 4000 })).unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_from_parts_rejects_missing_data() {
        let err = Event::from_parts("READY", Value::Null).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingField("data")));
    }

    #[test]
    fn test_from_parts_checks_name_before_data() {
        let err = Event::from_parts("SOMETHING_UNDEFINED", Value::Null).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownEvent(_)));
    }

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(Event::from(ReadyEvent::default()).kind(), EventKind::Ready);
        assert_eq!(
            Event::from(VoiceChannelSelectEvent::default()).kind(),
            EventKind::VoiceChannelSelect
        );
        let error = ErrorEvent {
            code: 4006,
            message: "Not authenticated".into(),
        };
        assert_eq!(Event::from(error).kind(), EventKind::Error);
    }
}
