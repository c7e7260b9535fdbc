//! Remote messenger configuration.

use serde::Deserialize;

/// Configuration for the remote messenger.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessengerConfig {
    /// Whether to connect to the broker at all.
    pub enabled: bool,
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Topic this hub receives remote requests on.
    pub subject: String,
    /// Topic replies go to when a request names none; `<subject>/reply` if unset.
    pub reply_topic: Option<String>,
    /// Broker credentials.
    pub username: Option<String>,
    pub password: Option<String>,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
}

impl MessengerConfig {
    /// Topic used for replies to requests that carry no reply topic.
    #[must_use]
    pub fn reply_topic(&self) -> String {
        self.reply_topic
            .clone()
            .unwrap_or_else(|| format!("{}/reply", self.subject))
    }
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "relayhub".to_string(),
            subject: "relayhub".to_string(),
            reply_topic: None,
            username: None,
            password: None,
            keep_alive_secs: 30,
        }
    }
}
