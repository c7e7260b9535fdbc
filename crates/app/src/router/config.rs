//! Router tuning knobs.

use std::time::Duration;

/// Timeouts and limits applied by the device command router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterConfig {
    /// Deadline for the session handshake before a command.
    pub connect_timeout: Duration,
    /// Deadline for each individual device operation.
    pub operation_timeout: Duration,
    /// Pause between session attempts after powering a device on.
    pub power_on_interval: Duration,
    /// How many session attempts to make after powering a device on.
    pub power_on_attempts: u32,
    /// Handshake deadline for each of those attempts.
    pub power_on_handshake_timeout: Duration,
    /// Commands that may wait for one device before new ones are rejected.
    pub queue_capacity: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(1000),
            operation_timeout: Duration::from_millis(2000),
            power_on_interval: Duration::from_millis(1000),
            power_on_attempts: 4,
            power_on_handshake_timeout: Duration::from_millis(500),
            queue_capacity: 32,
        }
    }
}
