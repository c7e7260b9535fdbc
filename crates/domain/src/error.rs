//! Common error types used across the workspace.
//!
//! Every layer converts into [`RelayHubError`] via `#[from]`; the router turns
//! it into the `error` text of a failed command result.

use std::time::Duration;

use crate::envelope::MessageType;

/// Top-level error for everything that can go wrong while relaying a command.
#[derive(Debug, thiserror::Error)]
pub enum RelayHubError {
    /// The outer envelope document could not be decoded.
    #[error("malformed envelope")]
    MalformedEnvelope(#[source] serde_json::Error),

    /// The inner payload does not match the shape implied by the envelope type.
    #[error("malformed {kind} payload")]
    MalformedPayload {
        kind: MessageType,
        #[source]
        source: serde_json::Error,
    },

    /// A command referenced a device id that is not managed.
    #[error("unknown device id {0:?}")]
    UnknownDevice(String),

    /// Establishing or using the device session failed.
    #[error("connection failure")]
    ConnectionFailure(#[from] DeviceError),

    /// The state/command combination is not implemented for the device type.
    #[error("unsupported command {command:?} for state {state:?}")]
    UnsupportedCommand { state: String, command: String },

    /// Fuzzy resolution exhausted all candidates.
    #[error(transparent)]
    NoMatchFound(#[from] NoMatchFound),

    /// No reply arrived on the reply topic before the deadline.
    #[error("no reply on {topic} within {after:?}")]
    Timeout { topic: String, after: Duration },

    /// The command `detail` could not be parsed as the expected shape.
    #[error("invalid detail for {command:?}")]
    InvalidDetail {
        command: String,
        #[source]
        source: DetailError,
    },

    /// The device worker cannot take the command (queue full or stopped).
    #[error("device {0:?} is not accepting commands")]
    DeviceBusy(String),

    /// The underlying bus transport failed.
    #[error("transport error")]
    Transport(#[from] TransportError),
}

impl RelayHubError {
    /// Render the error together with its chain of sources, separated by `: `.
    ///
    /// This is the text carried in the `error` field of a failed result.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut text = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            text.push_str(": ");
            text.push_str(&err.to_string());
            source = err.source();
        }
        text
    }
}

/// Errors reported by a device connection.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The device could not be reached (powered off, network down, …).
    #[error("device unreachable: {0}")]
    Unreachable(String),

    /// The device refused the session credential.
    #[error("device rejected the session credential")]
    Rejected,

    /// The device did not answer within the allotted time.
    #[error("device did not respond within {0:?}")]
    Timeout(Duration),

    /// The device type does not implement the requested operation.
    #[error("device does not support {operation}")]
    NotCapable { operation: &'static str },

    /// The device reported a failure for an otherwise valid request.
    #[error("device reported an error: {0}")]
    Remote(String),

    /// The connection parameters in the device `info` block are invalid.
    #[error("invalid device info")]
    InvalidInfo(#[source] serde_json::Error),
}

impl DeviceError {
    /// Shorthand for [`DeviceError::NotCapable`].
    #[must_use]
    pub fn not_capable(operation: &'static str) -> Self {
        Self::NotCapable { operation }
    }
}

/// Details about why a command `detail` could not be used.
#[derive(Debug, thiserror::Error)]
pub enum DetailError {
    /// The command needs a parameter but none was sent.
    #[error("missing detail")]
    Missing,

    /// The parameter is not valid JSON of the expected shape.
    #[error("unexpected detail shape")]
    Parse(#[from] serde_json::Error),

    /// The parameter is not a recognised boolean spelling.
    #[error("expected a boolean, got {0:?}")]
    NotABoolean(String),

    /// The parameter parsed but carries no usable identifier.
    #[error("no identifier given")]
    EmptyIdentifier,
}

/// Returned when fuzzy resolution finds no candidate for a target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no match found for {target:?}")]
pub struct NoMatchFound {
    pub target: String,
}

impl NoMatchFound {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

/// Errors raised by a bus transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The transport connection is gone.
    #[error("transport closed")]
    Closed,

    /// The transport failed to encode the envelope for the wire.
    #[error("failed to encode envelope: {0}")]
    Encode(String),
}

/// Configuration-level validation failures for domain objects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("device id must not be empty")]
    EmptyDeviceId,

    #[error("duplicate device id {0:?}")]
    DuplicateDeviceId(String),

    #[error("device {device_id:?} declares capabilities for unknown state {state:?}")]
    UnknownState { device_id: String, state: String },
}
