//! Device: a controllable appliance as described by configuration.
//!
//! Devices are read-only to the core: they are loaded once at startup and
//! never added or removed while running.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::envelope::TOPIC_TV;
use crate::error::{DeviceError, ValidationError};
use crate::state::{Command, StateKind};

/// Broad family of a device; selects the command topic it listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    #[serde(alias = "TV")]
    Tv,
}

impl DeviceType {
    /// Bus topic that carries commands for devices of this type.
    #[must_use]
    pub fn topic(self) -> &'static str {
        match self {
            Self::Tv => TOPIC_TV,
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tv => f.write_str("tv"),
        }
    }
}

/// Declared (state, command) pairs a device supports, keyed by state name.
pub type Capabilities = BTreeMap<String, BTreeSet<Command>>;

/// A configured, controllable device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    /// Vendor/protocol flavour within the type (e.g. `"virtual"`).
    pub sub_type: String,
    #[serde(default)]
    pub capabilities: Capabilities,
    /// Type-specific connection parameters, interpreted by the connection factory.
    #[serde(default)]
    pub info: serde_json::Value,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyDeviceId`] when `id` is blank, or
    /// [`ValidationError::UnknownState`] when a capability names no known state.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyDeviceId);
        }
        if let Some(name) = self
            .capabilities
            .keys()
            .find(|name| name.parse::<StateKind>().is_err())
        {
            return Err(ValidationError::UnknownState {
                device_id: self.id.clone(),
                state: name.clone(),
            });
        }
        Ok(())
    }

    /// Whether the device declares support for `command` on `state`.
    #[must_use]
    pub fn supports(&self, state: StateKind, command: Command) -> bool {
        self.capabilities
            .get(state.as_str())
            .is_some_and(|commands| commands.contains(&command))
    }

    /// Deserialize the `info` block into a factory-specific shape.
    ///
    /// A missing block is treated as an empty object so that defaults apply.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::InvalidInfo`] if the block has the wrong shape.
    pub fn info_as<T: DeserializeOwned>(&self) -> Result<T, DeviceError> {
        let value = if self.info.is_null() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            self.info.clone()
        };
        serde_json::from_value(value).map_err(DeviceError::InvalidInfo)
    }
}

/// Validate every device and check that ids are unique.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn validate_all(devices: &[Device]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for device in devices {
        device.validate()?;
        if !seen.insert(device.id.as_str()) {
            return Err(ValidationError::DuplicateDeviceId(device.id.clone()));
        }
    }
    Ok(())
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<String>,
    sub_type: Option<String>,
    capabilities: Capabilities,
    info: serde_json::Value,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn sub_type(mut self, sub_type: impl Into<String>) -> Self {
        self.sub_type = Some(sub_type.into());
        self
    }

    /// Declare support for `commands` on `state`.
    #[must_use]
    pub fn capability(mut self, state: StateKind, commands: &[Command]) -> Self {
        self.capabilities
            .entry(state.as_str().to_string())
            .or_default()
            .extend(commands.iter().copied());
        self
    }

    /// Declare support for the full vocabulary of every state.
    #[must_use]
    pub fn all_capabilities(mut self) -> Self {
        for state in StateKind::ALL {
            self = self.capability(state, state.commands());
        }
        self
    }

    #[must_use]
    pub fn info(mut self, info: serde_json::Value) -> Self {
        self.info = info;
        self
    }

    /// Consume the builder, validate, and return a television [`Device`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyDeviceId`] if `id` is missing or blank.
    pub fn build(self) -> Result<Device, ValidationError> {
        let device = Device {
            id: self.id.unwrap_or_default(),
            device_type: DeviceType::Tv,
            sub_type: self.sub_type.unwrap_or_else(|| "virtual".to_string()),
            capabilities: self.capabilities,
            info: self.info,
        };
        device.validate()?;
        Ok(device)
    }
}
