//! State kinds, the command vocabulary, and device state snapshots.
//!
//! A command is addressed to one *state* of a device (power, volume, …) and
//! names one verb from a small fixed vocabulary for that state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The aspect of a device a command reads or modifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    Power,
    Volume,
    Channel,
    Playback,
    Input,
}

impl StateKind {
    pub const ALL: [Self; 5] = [
        Self::Power,
        Self::Volume,
        Self::Channel,
        Self::Playback,
        Self::Input,
    ];

    /// Commands that exist for this state.
    #[must_use]
    pub fn commands(self) -> &'static [Command] {
        match self {
            Self::Power => &[Command::On, Command::Off],
            Self::Volume => &[
                Command::Up,
                Command::Down,
                Command::Set,
                Command::Adjust,
                Command::SetMute,
            ],
            Self::Channel => &[Command::Up, Command::Down, Command::Set, Command::Adjust],
            Self::Playback => &[
                Command::Play,
                Command::Pause,
                Command::Rewind,
                Command::FastForward,
            ],
            Self::Input => &[Command::Set],
        }
    }

    /// Whether `command` belongs to the vocabulary of this state.
    #[must_use]
    pub fn accepts(self, command: Command) -> bool {
        self.commands().contains(&command)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Volume => "volume",
            Self::Channel => "channel",
            Self::Playback => "playback",
            Self::Input => "input",
        }
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateKind {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

/// A command verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    On,
    Off,
    Up,
    Down,
    Set,
    Adjust,
    SetMute,
    Play,
    Pause,
    Rewind,
    FastForward,
}

impl Command {
    pub const ALL: [Self; 11] = [
        Self::On,
        Self::Off,
        Self::Up,
        Self::Down,
        Self::Set,
        Self::Adjust,
        Self::SetMute,
        Self::Play,
        Self::Pause,
        Self::Rewind,
        Self::FastForward,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Up => "up",
            Self::Down => "down",
            Self::Set => "set",
            Self::Adjust => "adjust",
            Self::SetMute => "setmute",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Rewind => "rewind",
            Self::FastForward => "fastforward",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.as_str() == s)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

/// A state or command name outside the known vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown name {0:?}")]
pub struct UnknownName(pub String);

/// Snapshot of one device state, produced after a successful command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "state", rename_all = "lowercase")]
pub enum DeviceState {
    Power(PowerState),
    Volume(VolumeState),
    Channel(ChannelState),
    Input(InputState),
}

impl DeviceState {
    /// The state kind this snapshot describes.
    #[must_use]
    pub fn kind(&self) -> StateKind {
        match self {
            Self::Power(_) => StateKind::Power,
            Self::Volume(_) => StateKind::Volume,
            Self::Channel(_) => StateKind::Channel,
            Self::Input(_) => StateKind::Input,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerState {
    pub power_on: bool,
}

/// Volume is always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeState {
    pub volume: u8,
    pub is_muted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelState {
    pub channel_number: u32,
    pub channel_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    pub input_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_accept_setmute_only_for_volume() {
        assert!(StateKind::Volume.accepts(Command::SetMute));
        assert!(!StateKind::Channel.accepts(Command::SetMute));
        assert!(!StateKind::Power.accepts(Command::SetMute));
    }

    #[test]
    fn should_parse_every_state_from_its_name() {
        for kind in StateKind::ALL {
            assert_eq!(kind.as_str().parse::<StateKind>().unwrap(), kind);
        }
    }

    #[test]
    fn should_reject_unknown_command_name() {
        let err = "explode".parse::<Command>().unwrap_err();
        assert_eq!(err, UnknownName("explode".to_string()));
    }

    #[test]
    fn should_serialize_command_like_its_display() {
        for cmd in Command::ALL {
            let json = serde_json::to_string(&cmd).unwrap();
            assert_eq!(json, format!("\"{cmd}\""));
        }
    }

    #[test]
    fn should_serialize_device_state_as_type_and_state() {
        let state = DeviceState::Volume(VolumeState {
            volume: 12,
            is_muted: true,
        });
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "volume", "state": {"volume": 12, "is_muted": true}})
        );
    }

    #[test]
    fn should_reject_device_state_whose_body_does_not_match_type() {
        let json = serde_json::json!({"type": "power", "state": {"volume": 3, "is_muted": false}});
        assert!(serde_json::from_value::<DeviceState>(json).is_err());
    }

    #[test]
    fn should_report_kind_of_snapshot() {
        let state = DeviceState::Input(InputState {
            input_name: "HDMI_1".to_string(),
        });
        assert_eq!(state.kind(), StateKind::Input);
    }
}
