//! # relayhub-adapter-virtual
//!
//! Virtual television integration: simulated TVs for testing and
//! demonstration, driven through the same connection port as real ones.
//!
//! ## Behaviour
//!
//! | Aspect | Virtual TV |
//! |--------|------------|
//! | Session | Refused while powered off or booting; unknown keys are replaced by a fresh one |
//! | Volume | 0..=100, saturating |
//! | Channels | Any number can be tuned; unlisted numbers have an empty name |
//! | Apps / inputs | Only listed ids can be launched / selected |
//!
//! Initial state and catalogue come from the device `info` block, see
//! [`VirtualTvInfo`].
//!
//! ## Dependency rule
//!
//! Depends on `relayhub-app` (port traits) and `relayhub-domain` only.

mod activity;
mod tv;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use relayhub_app::ports::{ConnectionFactory, ConnectionHandle};
use relayhub_domain::device::Device;
use relayhub_domain::error::DeviceError;

pub use activity::Activity;
pub use tv::{Playback, VirtualTv, VirtualTvInfo, VirtualTvState};

/// Device sub-type served by this adapter.
pub const SUB_TYPE: &str = "virtual";

/// Builds [`VirtualTv`] sessions and remembers their activities by device id.
#[derive(Debug, Default)]
pub struct VirtualConnectionFactory {
    activities: Mutex<HashMap<String, Arc<Activity>>>,
}

impl VirtualConnectionFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters of the TV created for `device_id`, if any.
    #[must_use]
    pub fn activity(&self, device_id: &str) -> Option<Arc<Activity>> {
        self.activities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(device_id)
            .cloned()
    }
}

impl ConnectionFactory for VirtualConnectionFactory {
    type Connection = VirtualTv;

    fn create(&self, device: &Device) -> Result<ConnectionHandle<VirtualTv>, DeviceError> {
        let info: VirtualTvInfo = device.info_as()?;
        let credential = info.client_key.clone();
        let tv = VirtualTv::new(info);
        self.activities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(device.id.clone(), tv.activity());
        tracing::debug!(device_id = %device.id, "virtual tv created");
        Ok(ConnectionHandle {
            connection: tv,
            credential,
        })
    }
}
