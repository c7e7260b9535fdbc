//! Device connection port.
//!
//! A connection is the session with one physical device. The router owns each
//! connection exclusively and drives it from a single worker, so methods take
//! `&mut self` and never run concurrently for the same device.
//!
//! Only [`connect`](DeviceConnection::connect) is mandatory. Every other
//! operation defaults to [`DeviceError::NotCapable`], which the router reports
//! as an unsupported command; device types override what they can do.

use std::future::Future;
use std::time::Duration;

use relayhub_domain::device::Device;
use relayhub_domain::error::DeviceError;
use relayhub_domain::media::{App, Channel, Input};

macro_rules! not_capable {
    ($op:literal) => {
        async { Err(DeviceError::not_capable($op)) }
    };
}

/// Operations a device session may support.
pub trait DeviceConnection: Send + 'static {
    /// Perform the session handshake.
    ///
    /// `credential` is the key from a previous session, if any. Returns the
    /// credential to use from now on, which may be a fresh one.
    fn connect(
        &mut self,
        credential: Option<&str>,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, DeviceError>> + Send;

    fn power_on(&mut self) -> impl Future<Output = Result<(), DeviceError>> + Send {
        not_capable!("power_on")
    }

    fn power_off(&mut self) -> impl Future<Output = Result<(), DeviceError>> + Send {
        not_capable!("power_off")
    }

    fn volume_up(&mut self) -> impl Future<Output = Result<(), DeviceError>> + Send {
        not_capable!("volume_up")
    }

    fn volume_down(&mut self) -> impl Future<Output = Result<(), DeviceError>> + Send {
        not_capable!("volume_down")
    }

    fn get_volume(&mut self) -> impl Future<Output = Result<u8, DeviceError>> + Send {
        not_capable!("get_volume")
    }

    fn set_volume(&mut self, _volume: u8) -> impl Future<Output = Result<(), DeviceError>> + Send {
        not_capable!("set_volume")
    }

    fn get_mute(&mut self) -> impl Future<Output = Result<bool, DeviceError>> + Send {
        not_capable!("get_mute")
    }

    fn set_mute(&mut self, _muted: bool) -> impl Future<Output = Result<(), DeviceError>> + Send {
        not_capable!("set_mute")
    }

    fn channel_up(&mut self) -> impl Future<Output = Result<(), DeviceError>> + Send {
        not_capable!("channel_up")
    }

    fn channel_down(&mut self) -> impl Future<Output = Result<(), DeviceError>> + Send {
        not_capable!("channel_down")
    }

    fn current_channel(&mut self) -> impl Future<Output = Result<Channel, DeviceError>> + Send {
        not_capable!("current_channel")
    }

    fn list_channels(&mut self) -> impl Future<Output = Result<Vec<Channel>, DeviceError>> + Send {
        not_capable!("list_channels")
    }

    fn set_channel(&mut self, _number: u32) -> impl Future<Output = Result<(), DeviceError>> + Send {
        not_capable!("set_channel")
    }

    fn list_apps(&mut self) -> impl Future<Output = Result<Vec<App>, DeviceError>> + Send {
        not_capable!("list_apps")
    }

    fn launch_app(&mut self, _app_id: &str) -> impl Future<Output = Result<(), DeviceError>> + Send {
        not_capable!("launch_app")
    }

    fn play(&mut self) -> impl Future<Output = Result<(), DeviceError>> + Send {
        not_capable!("play")
    }

    fn pause(&mut self) -> impl Future<Output = Result<(), DeviceError>> + Send {
        not_capable!("pause")
    }

    fn rewind(&mut self) -> impl Future<Output = Result<(), DeviceError>> + Send {
        not_capable!("rewind")
    }

    fn fast_forward(&mut self) -> impl Future<Output = Result<(), DeviceError>> + Send {
        not_capable!("fast_forward")
    }

    fn list_inputs(&mut self) -> impl Future<Output = Result<Vec<Input>, DeviceError>> + Send {
        not_capable!("list_inputs")
    }

    fn switch_input(
        &mut self,
        _input_id: &str,
    ) -> impl Future<Output = Result<(), DeviceError>> + Send {
        not_capable!("switch_input")
    }
}

/// A connection ready to be handed to the router, with the stored credential
/// read from the device `info` block.
#[derive(Debug)]
pub struct ConnectionHandle<C> {
    pub connection: C,
    pub credential: Option<String>,
}

/// Builds connections from device configuration.
pub trait ConnectionFactory: Send + Sync {
    type Connection: DeviceConnection;

    /// Create a (not yet connected) session for `device`.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::InvalidInfo`] when the device `info` block does
    /// not hold valid connection parameters for this device kind.
    fn create(&self, device: &Device) -> Result<ConnectionHandle<Self::Connection>, DeviceError>;
}
