//! Shared application state for axum handlers.

use std::sync::Arc;
use std::time::Duration;

use relayhub_app::message_bus::MessageBus;
use relayhub_app::ports::Transport;
use relayhub_domain::device::Device;

/// Application state shared across all axum handlers.
///
/// Generic over the transport to avoid dynamic dispatch. `Clone` is
/// implemented manually so the transport itself does not need to be `Clone`.
pub struct AppState<T> {
    /// Bus used to send command requests.
    pub bus: Arc<MessageBus<T>>,
    /// Configured devices, in configuration order.
    pub devices: Arc<[Device]>,
    /// How long to wait for a command result.
    pub request_timeout: Duration,
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> Self {
        Self {
            bus: Arc::clone(&self.bus),
            devices: Arc::clone(&self.devices),
            request_timeout: self.request_timeout,
        }
    }
}

impl<T: Transport + 'static> AppState<T> {
    pub fn new(bus: Arc<MessageBus<T>>, devices: Vec<Device>, request_timeout: Duration) -> Self {
        Self {
            bus,
            devices: devices.into(),
            request_timeout,
        }
    }

    /// Look up a configured device by id.
    #[must_use]
    pub fn device(&self, id: &str) -> Option<&Device> {
        self.devices.iter().find(|device| device.id == id)
    }
}
