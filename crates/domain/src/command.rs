//! Command and command-result payloads.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{DetailError, RelayHubError};
use crate::state::{Command, DeviceState, StateKind};

/// A request to perform `command` on one `state` of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPayload {
    pub device_id: String,
    pub state: StateKind,
    /// Verb from the vocabulary of `state`; unknown verbs are rejected when handled.
    pub command: String,
    /// JSON text of the command parameter, for commands that need one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CommandPayload {
    pub fn new(device_id: impl Into<String>, state: StateKind, command: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            state,
            command: command.into(),
            detail: None,
        }
    }

    /// Attach raw JSON text as the command parameter.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach `value`, encoded as JSON, as the command parameter.
    ///
    /// # Errors
    ///
    /// Returns the serializer error when `value` cannot be encoded.
    pub fn with_detail_value<T: Serialize>(self, value: &T) -> Result<Self, serde_json::Error> {
        let text = serde_json::to_string(value)?;
        Ok(self.with_detail(text))
    }

    /// Resolve `command` against the vocabulary of `state`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::UnsupportedCommand`] when the verb is unknown
    /// or does not belong to `state`.
    pub fn verb(&self) -> Result<Command, RelayHubError> {
        self.command
            .parse::<Command>()
            .ok()
            .filter(|cmd| self.state.accepts(*cmd))
            .ok_or_else(|| RelayHubError::UnsupportedCommand {
                state: self.state.to_string(),
                command: self.command.clone(),
            })
    }

    /// Decode the parameter as JSON of type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::InvalidDetail`] when the parameter is missing
    /// or has the wrong shape.
    pub fn detail_as<T: DeserializeOwned>(&self) -> Result<T, RelayHubError> {
        let text = self.raw_detail()?;
        serde_json::from_str(text).map_err(|err| self.invalid(DetailError::Parse(err)))
    }

    /// Decode the parameter as a boolean.
    ///
    /// Accepts JSON booleans as well as `1`/`0`, `t`/`f` and the usual
    /// capitalisations of `true`/`false`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::InvalidDetail`] for any other spelling.
    pub fn detail_as_bool(&self) -> Result<bool, RelayHubError> {
        let text = self.raw_detail()?;
        match text.trim() {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            other => Err(self.invalid(DetailError::NotABoolean(other.to_string()))),
        }
    }

    /// Wrap `source` as an [`RelayHubError::InvalidDetail`] for this command.
    #[must_use]
    pub fn invalid(&self, source: DetailError) -> RelayHubError {
        RelayHubError::InvalidDetail {
            command: self.command.clone(),
            source,
        }
    }

    fn raw_detail(&self) -> Result<&str, RelayHubError> {
        self.detail
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| self.invalid(DetailError::Missing))
    }
}

/// Parameter of a channel `set` command.
///
/// Exact fields take precedence over the fuzzy identifier. Channel number `0`
/// and blank strings count as absent, so clients that always send every field
/// still get fuzzy resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetChannelDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact_channel_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact_channel_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzzy_channel_identifier: Option<String>,
}

impl SetChannelDetail {
    #[must_use]
    pub fn exact_number(number: u32) -> Self {
        Self {
            exact_channel_number: Some(number),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn exact_name(name: impl Into<String>) -> Self {
        Self {
            exact_channel_name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn fuzzy(identifier: impl Into<String>) -> Self {
        Self {
            fuzzy_channel_identifier: Some(identifier.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn number(&self) -> Option<u32> {
        self.exact_channel_number.filter(|number| *number > 0)
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        non_blank(self.exact_channel_name.as_deref())
    }

    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        non_blank(self.fuzzy_channel_identifier.as_deref())
    }

    /// Whether the request names a channel exactly (by number or name).
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.number().is_some() || self.name().is_some()
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

/// Outcome of a command, published back on the reply topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResultPayload {
    pub success: bool,
    /// Empty when `success` is true.
    #[serde(default)]
    pub error: String,
    /// `None` on failure and for commands that produce no state (playback).
    #[serde(default)]
    pub new_state: Option<DeviceState>,
}

impl CommandResultPayload {
    #[must_use]
    pub fn succeeded(new_state: Option<DeviceState>) -> Self {
        Self {
            success: true,
            error: String::new(),
            new_state,
        }
    }

    #[must_use]
    pub fn failed(err: &RelayHubError) -> Self {
        Self {
            success: false,
            error: err.describe(),
            new_state: None,
        }
    }
}

impl From<Result<Option<DeviceState>, RelayHubError>> for CommandResultPayload {
    fn from(result: Result<Option<DeviceState>, RelayHubError>) -> Self {
        match result {
            Ok(state) => Self::succeeded(state),
            Err(err) => Self::failed(&err),
        }
    }
}
