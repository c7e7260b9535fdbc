//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `relayhub.toml` in the working directory. Every field has a
//! sensible default so the file is optional; without a `[[devices]]` table a
//! single virtual TV is managed. Environment variables take precedence over
//! file values.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use relayhub_adapter_messenger::MessengerConfig;
use relayhub_adapter_virtual::SUB_TYPE as VIRTUAL_SUB_TYPE;
use relayhub_app::router::RouterConfig;
use relayhub_domain::device::{Device, DeviceType, validate_all};
use relayhub_domain::error::ValidationError;
use relayhub_domain::state::StateKind;

/// Top-level configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Message bus settings.
    pub bus: BusConfig,
    /// Device command router tuning.
    pub router: RouterSection,
    /// Remote access through an MQTT broker.
    pub messenger: MessengerConfig,
    /// Managed devices.
    pub devices: Vec<Device>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Message bus configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// How long HTTP callers wait for a command result.
    pub request_timeout_ms: u64,
}

/// Device command router configuration, in milliseconds.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RouterSection {
    pub connect_timeout_ms: u64,
    pub operation_timeout_ms: u64,
    pub power_on_interval_ms: u64,
    pub power_on_attempts: u32,
    pub power_on_handshake_timeout_ms: u64,
    pub queue_capacity: usize,
}

impl Config {
    /// Load configuration from `relayhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("relayhub.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("RELAYHUB_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("RELAYHUB_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("RELAYHUB_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("RELAYHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        if self.bus.request_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("bus.request_timeout_ms"));
        }
        self.router.validate()?;
        if self.messenger.enabled && self.messenger.subject.trim().is_empty() {
            return Err(ConfigError::EmptySubject);
        }
        validate_all(&self.devices)?;
        if let Some(device) = self
            .devices
            .iter()
            .find(|d| !(d.device_type == DeviceType::Tv && d.sub_type == VIRTUAL_SUB_TYPE))
        {
            return Err(ConfigError::UnsupportedDevice {
                device_id: device.id.clone(),
                device_type: device.device_type,
                sub_type: device.sub_type.clone(),
            });
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.bus.request_timeout_ms)
    }

    /// Devices of the given type, in configuration order.
    pub fn devices_of(&self, device_type: DeviceType) -> Vec<Device> {
        self.devices
            .iter()
            .filter(|d| d.device_type == device_type)
            .cloned()
            .collect()
    }
}

impl RouterSection {
    fn validate(&self) -> Result<(), ConfigError> {
        let timeouts = [
            ("router.connect_timeout_ms", self.connect_timeout_ms),
            ("router.operation_timeout_ms", self.operation_timeout_ms),
            ("router.power_on_interval_ms", self.power_on_interval_ms),
            (
                "router.power_on_handshake_timeout_ms",
                self.power_on_handshake_timeout_ms,
            ),
        ];
        if let Some((name, _)) = timeouts.into_iter().find(|(_, ms)| *ms == 0) {
            return Err(ConfigError::ZeroTimeout(name));
        }
        if self.power_on_attempts == 0 {
            return Err(ConfigError::NoPowerOnAttempts);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        Ok(())
    }

    #[must_use]
    pub fn to_router_config(&self) -> RouterConfig {
        RouterConfig {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            operation_timeout: Duration::from_millis(self.operation_timeout_ms),
            power_on_interval: Duration::from_millis(self.power_on_interval_ms),
            power_on_attempts: self.power_on_attempts,
            power_on_handshake_timeout: Duration::from_millis(self.power_on_handshake_timeout_ms),
            queue_capacity: self.queue_capacity,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            bus: BusConfig::default(),
            router: RouterSection::default(),
            messenger: MessengerConfig::default(),
            devices: vec![demo_tv()],
        }
    }
}

/// The virtual TV managed when no devices are configured.
fn demo_tv() -> Device {
    let capabilities: BTreeMap<_, _> = StateKind::ALL
        .into_iter()
        .map(|state| {
            (
                state.as_str().to_string(),
                state.commands().iter().copied().collect(),
            )
        })
        .collect();
    Device {
        id: "living-room".to_string(),
        device_type: DeviceType::Tv,
        sub_type: VIRTUAL_SUB_TYPE.to_string(),
        capabilities,
        info: serde_json::Value::Null,
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "relayhubd=info,relayhub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 1000,
        }
    }
}

impl Default for RouterSection {
    fn default() -> Self {
        let defaults = RouterConfig::default();
        Self {
            connect_timeout_ms: millis(defaults.connect_timeout),
            operation_timeout_ms: millis(defaults.operation_timeout),
            power_on_interval_ms: millis(defaults.power_on_interval),
            power_on_attempts: defaults.power_on_attempts,
            power_on_handshake_timeout_ms: millis(defaults.power_on_handshake_timeout),
            queue_capacity: defaults.queue_capacity,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// A device definition is invalid.
    #[error("invalid device configuration")]
    Device(#[from] ValidationError),
    /// The server port is zero.
    #[error("port must be non-zero")]
    ZeroPort,
    /// A timeout or interval is zero.
    #[error("{0} must be non-zero")]
    ZeroTimeout(&'static str),
    /// The router would never retry the handshake after powering a device on.
    #[error("router.power_on_attempts must be at least 1")]
    NoPowerOnAttempts,
    /// Device queues could not hold a single command.
    #[error("router.queue_capacity must be at least 1")]
    ZeroQueueCapacity,
    /// The messenger is enabled without a subject to listen on.
    #[error("messenger.subject must not be empty when the messenger is enabled")]
    EmptySubject,
    /// No connection factory serves this device type and sub-type.
    #[error("device {device_id:?} has unsupported type {device_type}/{sub_type}")]
    UnsupportedDevice {
        device_id: String,
        device_type: DeviceType,
        sub_type: String,
    },
}

#[cfg(test)]
mod tests {
    use relayhub_domain::state::Command;

    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.request_timeout(), Duration::from_millis(1000));
        assert_eq!(config.router.to_router_config(), RouterConfig::default());
        assert_eq!(config.devices.len(), 1);
        assert!(config.devices[0].supports(StateKind::Channel, Command::Set));
        assert!(!config.messenger.enabled);
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.devices[0].id, "living-room");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = r#"
            [server]
            host = '127.0.0.1'
            port = 9090

            [logging]
            filter = 'debug'

            [bus]
            request_timeout_ms = 2500

            [messenger]
            enabled = true
            broker_host = "broker.local"
            subject = "hubs/42"

            [router]
            connect_timeout_ms = 300
            power_on_attempts = 6
            queue_capacity = 8

            [[devices]]
            id = "bedroom"
            type = "tv"
            sub_type = "virtual"
            capabilities = { volume = ["up", "down", "setmute"], power = ["on", "off"] }

            [devices.info]
            client_key = "abc"
            volume = 25
            channels = [{ number = 7, name = "Seven" }]
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.request_timeout(), Duration::from_millis(2500));
        assert!(config.messenger.enabled);
        assert_eq!(config.messenger.broker_host, "broker.local");
        assert_eq!(config.messenger.reply_topic(), "hubs/42/reply");

        let router = config.router.to_router_config();
        assert_eq!(router.connect_timeout, Duration::from_millis(300));
        assert_eq!(router.power_on_attempts, 6);
        assert_eq!(router.queue_capacity, 8);
        assert_eq!(router.operation_timeout, RouterConfig::default().operation_timeout);

        assert_eq!(config.devices.len(), 1);
        let device = &config.devices[0];
        assert_eq!(device.id, "bedroom");
        assert!(device.supports(StateKind::Volume, Command::SetMute));
        assert!(!device.supports(StateKind::Channel, Command::Set));
        assert_eq!(device.info["client_key"], "abc");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_accept_uppercase_device_type() {
        let toml = r#"
            [[devices]]
            id = "tv"
            type = "TV"
            sub_type = "virtual"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.devices[0].device_type, DeviceType::Tv);
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroPort)));
    }

    #[test]
    fn should_reject_zero_timeout() {
        let mut config = Config::default();
        config.router.operation_timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroTimeout("router.operation_timeout_ms"))
        ));
    }

    #[test]
    fn should_reject_zero_power_on_attempts() {
        let mut config = Config::default();
        config.router.power_on_attempts = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NoPowerOnAttempts)
        ));
    }

    #[test]
    fn should_reject_zero_request_timeout() {
        let mut config = Config::default();
        config.bus.request_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "bus.request_timeout_ms must be non-zero");
    }

    #[test]
    fn should_reject_zero_queue_capacity() {
        let mut config = Config::default();
        config.router.queue_capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroQueueCapacity)
        ));
    }

    #[test]
    fn should_reject_enabled_messenger_without_subject() {
        let mut config = Config::default();
        config.messenger.enabled = true;
        config.messenger.subject = " ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::EmptySubject)));

        config.messenger.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_reject_duplicate_device_ids() {
        let mut config = Config::default();
        config.devices.push(demo_tv());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Device(ValidationError::DuplicateDeviceId(_)))
        ));
    }

    #[test]
    fn should_reject_unknown_sub_type() {
        let mut config = Config::default();
        config.devices[0].sub_type = "webos".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            &err,
            ConfigError::UnsupportedDevice { device_id, sub_type, .. }
                if device_id == "living-room" && sub_type == "webos"
        ));
        assert_eq!(
            err.to_string(),
            "device \"living-room\" has unsupported type tv/webos"
        );
    }

    #[test]
    fn should_reject_unknown_capability_state() {
        let toml = r#"
            [[devices]]
            id = "tv"
            type = "tv"
            sub_type = "virtual"
            capabilities = { brightness = ["up"] }
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Device(ValidationError::UnknownState { .. }))
        ));
    }

    #[test]
    fn should_format_bind_addr() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9090;
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
