//! Bus envelope and its wire codec.
//!
//! On the wire an envelope is a JSON document
//! `{"type": …, "reply_topic": …, "payload": "<json text>"}`. The payload is an
//! independently encoded document: the bus forwards it untouched, payload-aware
//! consumers decode it according to `type`. In memory the type tag and the
//! payload are fused into the [`Message`] sum type, so a mismatch between the
//! two cannot be represented.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::command::{CommandPayload, CommandResultPayload};
use crate::error::{RelayHubError, TransportError};
use crate::log::{LogLevel, LogPayload};

/// Topic carrying commands for televisions.
pub const TOPIC_TV: &str = "tv";
/// Topic carrying [`LogPayload`] records.
pub const TOPIC_LOGGING: &str = "logging";
/// Prefix of every generated reply topic.
pub const REPLY_TOPIC_PREFIX: &str = "_reply.";

/// Generate a fresh reply topic from a random 128-bit token.
#[must_use]
pub fn new_reply_topic() -> String {
    format!("{REPLY_TOPIC_PREFIX}{}", uuid::Uuid::new_v4().simple())
}

/// Type tag of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Command,
    CommandResult,
    Log,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => f.write_str("command"),
            Self::CommandResult => f.write_str("command_result"),
            Self::Log => f.write_str("log"),
        }
    }
}

/// Decoded payload of an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Command(CommandPayload),
    CommandResult(CommandResultPayload),
    Log(LogPayload),
}

impl Message {
    #[must_use]
    pub fn kind(&self) -> MessageType {
        match self {
            Self::Command(_) => MessageType::Command,
            Self::CommandResult(_) => MessageType::CommandResult,
            Self::Log(_) => MessageType::Log,
        }
    }

    fn encode_payload(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Command(p) => serde_json::to_string(p),
            Self::CommandResult(p) => serde_json::to_string(p),
            Self::Log(p) => serde_json::to_string(p),
        }
    }

    fn decode_payload(kind: MessageType, payload: &str) -> Result<Self, RelayHubError> {
        let malformed = |source| RelayHubError::MalformedPayload { kind, source };
        match kind {
            MessageType::Command => serde_json::from_str(payload)
                .map(Self::Command)
                .map_err(malformed),
            MessageType::CommandResult => serde_json::from_str(payload)
                .map(Self::CommandResult)
                .map_err(malformed),
            MessageType::Log => serde_json::from_str(payload)
                .map(Self::Log)
                .map_err(malformed),
        }
    }
}

/// A message exchanged over the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Set only when the sender expects a correlated reply.
    pub reply_topic: Option<String>,
    pub message: Message,
}

#[derive(Serialize, Deserialize)]
struct WireEnvelope {
    #[serde(rename = "type")]
    kind: MessageType,
    #[serde(default)]
    reply_topic: Option<String>,
    payload: String,
}

impl Envelope {
    #[must_use]
    pub fn new(message: Message) -> Self {
        Self {
            reply_topic: None,
            message,
        }
    }

    /// A command envelope.
    #[must_use]
    pub fn command(payload: CommandPayload) -> Self {
        Self::new(Message::Command(payload))
    }

    /// A command-result envelope.
    #[must_use]
    pub fn command_result(payload: CommandResultPayload) -> Self {
        Self::new(Message::CommandResult(payload))
    }

    /// A log envelope stamped with the current time.
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::new(Message::Log(LogPayload::new(level, message)))
    }

    #[must_use]
    pub fn with_reply_topic(mut self, topic: impl Into<String>) -> Self {
        self.reply_topic = Some(topic.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> MessageType {
        self.message.kind()
    }

    /// Encode to the bus byte format.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Encode`] if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, TransportError> {
        let payload = self
            .message
            .encode_payload()
            .map_err(|err| TransportError::Encode(err.to_string()))?;
        let wire = WireEnvelope {
            kind: self.kind(),
            reply_topic: self.reply_topic.clone(),
            payload,
        };
        serde_json::to_vec(&wire).map_err(|err| TransportError::Encode(err.to_string()))
    }

    /// Decode from the bus byte format.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::MalformedEnvelope`] if the outer document is
    /// invalid, or [`RelayHubError::MalformedPayload`] if the payload does not
    /// match the shape implied by its type.
    pub fn decode(bytes: &[u8]) -> Result<Self, RelayHubError> {
        let wire: WireEnvelope =
            serde_json::from_slice(bytes).map_err(RelayHubError::MalformedEnvelope)?;
        let message = Message::decode_payload(wire.kind, &wire.payload)?;
        Ok(Self {
            reply_topic: wire.reply_topic,
            message,
        })
    }

    /// Consume the envelope, keeping the payload only if it is a command.
    #[must_use]
    pub fn into_command(self) -> Option<CommandPayload> {
        match self.message {
            Message::Command(cmd) => Some(cmd),
            _ => None,
        }
    }

    /// Consume the envelope, keeping the payload only if it is a command result.
    #[must_use]
    pub fn into_command_result(self) -> Option<CommandResultPayload> {
        match self.message {
            Message::CommandResult(result) => Some(result),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::SetChannelDetail;
    use crate::error::NoMatchFound;
    use crate::state::{ChannelState, DeviceState, InputState, PowerState, StateKind, VolumeState};

    #[test]
    fn should_roundtrip_command_with_reply_topic() {
        let cmd = CommandPayload::new("lounge", StateKind::Channel, "set")
            .with_detail_value(&SetChannelDetail::fuzzy("news twenty four"))
            .unwrap();
        let envelope = Envelope::command(cmd).with_reply_topic(new_reply_topic());

        let decoded = Envelope::decode(&envelope.encode().unwrap()).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn should_roundtrip_result_carrying_state() {
        let envelope = Envelope::command_result(CommandResultPayload::succeeded(Some(
            DeviceState::Channel(ChannelState {
                channel_number: 24,
                channel_name: "NEWS24".to_string(),
            }),
        )));
        let decoded = Envelope::decode(&envelope.encode().unwrap()).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn should_roundtrip_every_payload_variant() {
        let failure = RelayHubError::from(NoMatchFound::new("bbc"));
        let cases = [
            Envelope::command(CommandPayload::new("lounge", StateKind::Playback, "pause")),
            Envelope::command(
                CommandPayload::new("lounge", StateKind::Volume, "adjust").with_detail("-3"),
            )
            .with_reply_topic(new_reply_topic()),
            Envelope::command_result(CommandResultPayload::succeeded(Some(DeviceState::Power(
                PowerState { power_on: false },
            )))),
            Envelope::command_result(CommandResultPayload::succeeded(Some(DeviceState::Volume(
                VolumeState {
                    volume: 100,
                    is_muted: true,
                },
            )))),
            Envelope::command_result(CommandResultPayload::succeeded(Some(DeviceState::Input(
                InputState {
                    input_name: "HDMI_2".to_string(),
                },
            )))),
            Envelope::command_result(CommandResultPayload::succeeded(None)),
            Envelope::command_result(CommandResultPayload::failed(&failure)),
            Envelope::log(LogLevel::Error, "tv unreachable"),
            Envelope::log(LogLevel::Info, ""),
        ];

        for envelope in cases {
            let decoded = Envelope::decode(&envelope.encode().unwrap()).unwrap();
            assert_eq!(decoded, envelope, "{:?}", envelope.kind());
        }
    }

    #[test]
    fn should_roundtrip_log_record() {
        let envelope = Envelope::log(LogLevel::Warn, "tv is asleep");
        let decoded = Envelope::decode(&envelope.encode().unwrap()).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn should_embed_payload_as_json_text() {
        let envelope = Envelope::command(CommandPayload::new("lounge", StateKind::Power, "on"));
        let wire: serde_json::Value = serde_json::from_slice(&envelope.encode().unwrap()).unwrap();
        assert_eq!(wire["type"], "command");
        assert!(wire["reply_topic"].is_null());
        let payload: serde_json::Value =
            serde_json::from_str(wire["payload"].as_str().unwrap()).unwrap();
        assert_eq!(payload["device_id"], "lounge");
        assert_eq!(payload["state"], "power");
    }

    #[test]
    fn should_fail_with_malformed_envelope_for_garbage() {
        let result = Envelope::decode(b"not json");
        assert!(matches!(result, Err(RelayHubError::MalformedEnvelope(_))));
    }

    #[test]
    fn should_fail_with_malformed_envelope_for_unknown_type() {
        let bytes = br#"{"type":"shout","payload":"{}"}"#;
        assert!(matches!(
            Envelope::decode(bytes),
            Err(RelayHubError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn should_fail_with_malformed_payload_when_payload_mismatches_type() {
        let bytes = br#"{"type":"command","payload":"{\"success\":true}"}"#;
        assert!(matches!(
            Envelope::decode(bytes),
            Err(RelayHubError::MalformedPayload {
                kind: MessageType::Command,
                ..
            })
        ));
    }

    #[test]
    fn should_generate_distinct_reply_topics() {
        let a = new_reply_topic();
        let b = new_reply_topic();
        assert_ne!(a, b);
        assert!(a.starts_with(REPLY_TOPIC_PREFIX));
        assert_eq!(a.len(), REPLY_TOPIC_PREFIX.len() + 32);
    }

    #[test]
    fn should_extract_command_only_from_command_envelope() {
        let log = Envelope::log(LogLevel::Info, "hello");
        assert!(log.into_command().is_none());
    }
}
