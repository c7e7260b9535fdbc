//! Virtual television: an in-memory TV that behaves like a networked one.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use relayhub_app::ports::DeviceConnection;
use relayhub_domain::error::DeviceError;
use relayhub_domain::media::{App, Channel, Input};

use crate::activity::Activity;

const MAX_VOLUME: u8 = 100;

/// Connection parameters and initial state, read from the device `info` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualTvInfo {
    /// Session key the TV already trusts.
    pub client_key: Option<String>,
    pub powered_on: bool,
    pub volume: u8,
    pub muted: bool,
    /// Starting channel; the first listed channel when absent.
    pub channel: Option<u32>,
    pub channels: Vec<Channel>,
    pub apps: Vec<App>,
    pub inputs: Vec<Input>,
    /// Artificial delay added to every operation.
    pub latency_ms: u64,
    /// Handshakes refused after power-on while the TV boots.
    pub boot_handshakes: u32,
}

impl Default for VirtualTvInfo {
    fn default() -> Self {
        Self {
            client_key: None,
            powered_on: true,
            volume: 10,
            muted: false,
            channel: None,
            channels: vec![
                Channel::new(1, "BBC ONE"),
                Channel::new(2, "BBC TWO"),
                Channel::new(5, "ESPN"),
                Channel::new(24, "NEWS24"),
            ],
            apps: vec![
                App::new("netflix", "Netflix"),
                App::new("youtube.leanback.v4", "YouTube"),
            ],
            inputs: vec![
                Input::new("HDMI_1", "Games Console"),
                Input::new("HDMI_2", "Blu-ray"),
            ],
            latency_ms: 0,
            boot_handshakes: 0,
        }
    }
}

/// Last transport control pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    Playing,
    Paused,
    Rewinding,
    FastForwarding,
}

/// Observable state of a virtual TV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualTvState {
    pub powered_on: bool,
    pub volume: u8,
    pub muted: bool,
    pub channel: u32,
    pub foreground_app: Option<String>,
    pub input: Option<String>,
    pub playback: Option<Playback>,
    channels: Vec<Channel>,
    apps: Vec<App>,
    inputs: Vec<Input>,
    paired_keys: HashSet<String>,
    booting: u32,
    boot_handshakes: u32,
}

impl VirtualTvState {
    fn channel_name(&self, number: u32) -> String {
        self.channels
            .iter()
            .find(|c| c.number == number)
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }

    /// Step through the channel list in number order, wrapping around.
    fn step_channel(&mut self, up: bool) {
        let mut numbers: Vec<u32> = self.channels.iter().map(|c| c.number).collect();
        numbers.sort_unstable();
        let next = if up {
            numbers
                .iter()
                .find(|n| **n > self.channel)
                .or_else(|| numbers.first())
        } else {
            numbers
                .iter()
                .rev()
                .find(|n| **n < self.channel)
                .or_else(|| numbers.last())
        };
        if let Some(next) = next {
            self.channel = *next;
            self.foreground_app = None;
        }
    }
}

/// A simulated TV session.
///
/// State lives behind a shared lock so tests can inspect it through
/// [`state`](Self::state) while the router owns the connection.
#[derive(Debug)]
pub struct VirtualTv {
    state: Arc<Mutex<VirtualTvState>>,
    activity: Arc<Activity>,
    latency: Duration,
}

impl VirtualTv {
    #[must_use]
    pub fn new(info: VirtualTvInfo) -> Self {
        let channel = info
            .channel
            .or_else(|| info.channels.first().map(|c| c.number))
            .unwrap_or(1);
        let state = VirtualTvState {
            powered_on: info.powered_on,
            volume: info.volume.min(MAX_VOLUME),
            muted: info.muted,
            channel,
            foreground_app: None,
            input: None,
            playback: None,
            channels: info.channels,
            apps: info.apps,
            inputs: info.inputs,
            paired_keys: info.client_key.into_iter().collect(),
            booting: 0,
            boot_handshakes: info.boot_handshakes,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            activity: Arc::new(Activity::default()),
            latency: Duration::from_millis(info.latency_ms),
        }
    }

    /// A snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> VirtualTvState {
        self.lock().clone()
    }

    #[must_use]
    pub fn activity(&self) -> Arc<Activity> {
        Arc::clone(&self.activity)
    }

    fn lock(&self) -> MutexGuard<'_, VirtualTvState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against a powered-on TV after the configured latency.
    async fn op<R>(
        &self,
        name: &'static str,
        f: impl FnOnce(&mut VirtualTvState) -> Result<R, DeviceError> + Send,
    ) -> Result<R, DeviceError> {
        let _in_flight = self.activity.enter();
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let mut state = self.lock();
        if !state.powered_on {
            return Err(DeviceError::Unreachable("tv is powered off".to_string()));
        }
        tracing::trace!(operation = name, "virtual tv operation");
        f(&mut state)
    }
}

impl DeviceConnection for VirtualTv {
    async fn connect(
        &mut self,
        credential: Option<&str>,
        _timeout: Duration,
    ) -> Result<String, DeviceError> {
        self.activity.record_connect();
        let mut state = self.lock();
        if state.booting > 0 {
            state.booting -= 1;
            return Err(DeviceError::Unreachable("tv is booting".to_string()));
        }
        if !state.powered_on {
            return Err(DeviceError::Unreachable("tv is powered off".to_string()));
        }
        if let Some(key) = credential.filter(|key| state.paired_keys.contains(*key)) {
            return Ok(key.to_string());
        }
        let key = uuid::Uuid::new_v4().simple().to_string();
        state.paired_keys.insert(key.clone());
        tracing::debug!("virtual tv paired a new client");
        Ok(key)
    }

    async fn power_on(&mut self) -> Result<(), DeviceError> {
        let _in_flight = self.activity.enter();
        let mut state = self.lock();
        if !state.powered_on {
            state.powered_on = true;
            state.booting = state.boot_handshakes;
        }
        Ok(())
    }

    async fn power_off(&mut self) -> Result<(), DeviceError> {
        self.op("power_off", |s| {
            s.powered_on = false;
            s.playback = None;
            Ok(())
        })
        .await
    }

    async fn volume_up(&mut self) -> Result<(), DeviceError> {
        self.op("volume_up", |s| {
            s.volume = s.volume.saturating_add(1).min(MAX_VOLUME);
            Ok(())
        })
        .await
    }

    async fn volume_down(&mut self) -> Result<(), DeviceError> {
        self.op("volume_down", |s| {
            s.volume = s.volume.saturating_sub(1);
            Ok(())
        })
        .await
    }

    async fn get_volume(&mut self) -> Result<u8, DeviceError> {
        self.op("get_volume", |s| Ok(s.volume)).await
    }

    async fn set_volume(&mut self, volume: u8) -> Result<(), DeviceError> {
        self.op("set_volume", move |s| {
            s.volume = volume.min(MAX_VOLUME);
            Ok(())
        })
        .await
    }

    async fn get_mute(&mut self) -> Result<bool, DeviceError> {
        self.op("get_mute", |s| Ok(s.muted)).await
    }

    async fn set_mute(&mut self, muted: bool) -> Result<(), DeviceError> {
        self.op("set_mute", move |s| {
            s.muted = muted;
            Ok(())
        })
        .await
    }

    async fn channel_up(&mut self) -> Result<(), DeviceError> {
        self.op("channel_up", |s| {
            s.step_channel(true);
            Ok(())
        })
        .await
    }

    async fn channel_down(&mut self) -> Result<(), DeviceError> {
        self.op("channel_down", |s| {
            s.step_channel(false);
            Ok(())
        })
        .await
    }

    async fn current_channel(&mut self) -> Result<Channel, DeviceError> {
        self.op("current_channel", |s| {
            Ok(Channel::new(s.channel, s.channel_name(s.channel)))
        })
        .await
    }

    async fn list_channels(&mut self) -> Result<Vec<Channel>, DeviceError> {
        self.op("list_channels", |s| Ok(s.channels.clone())).await
    }

    async fn set_channel(&mut self, number: u32) -> Result<(), DeviceError> {
        self.op("set_channel", move |s| {
            s.channel = number;
            s.foreground_app = None;
            Ok(())
        })
        .await
    }

    async fn list_apps(&mut self) -> Result<Vec<App>, DeviceError> {
        self.op("list_apps", |s| Ok(s.apps.clone())).await
    }

    async fn launch_app(&mut self, app_id: &str) -> Result<(), DeviceError> {
        let app_id = app_id.to_string();
        self.op("launch_app", move |s| {
            if !s.apps.iter().any(|app| app.id == app_id) {
                return Err(DeviceError::Remote(format!("no app with id {app_id:?}")));
            }
            s.foreground_app = Some(app_id);
            Ok(())
        })
        .await
    }

    async fn play(&mut self) -> Result<(), DeviceError> {
        self.op("play", |s| {
            s.playback = Some(Playback::Playing);
            Ok(())
        })
        .await
    }

    async fn pause(&mut self) -> Result<(), DeviceError> {
        self.op("pause", |s| {
            s.playback = Some(Playback::Paused);
            Ok(())
        })
        .await
    }

    async fn rewind(&mut self) -> Result<(), DeviceError> {
        self.op("rewind", |s| {
            s.playback = Some(Playback::Rewinding);
            Ok(())
        })
        .await
    }

    async fn fast_forward(&mut self) -> Result<(), DeviceError> {
        self.op("fast_forward", |s| {
            s.playback = Some(Playback::FastForwarding);
            Ok(())
        })
        .await
    }

    async fn list_inputs(&mut self) -> Result<Vec<Input>, DeviceError> {
        self.op("list_inputs", |s| Ok(s.inputs.clone())).await
    }

    async fn switch_input(&mut self, input_id: &str) -> Result<(), DeviceError> {
        let input_id = input_id.to_string();
        self.op("switch_input", move |s| {
            if !s.inputs.iter().any(|input| input.id == input_id) {
                return Err(DeviceError::Remote(format!("no input with id {input_id:?}")));
            }
            s.input = Some(input_id);
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Duration = Duration::from_millis(100);

    #[tokio::test]
    async fn should_issue_key_to_unknown_client_and_accept_it_later() {
        let mut tv = VirtualTv::new(VirtualTvInfo::default());

        let key = tv.connect(None, T).await.unwrap();
        assert_eq!(key.len(), 32);
        assert_eq!(tv.connect(Some(&key), T).await.unwrap(), key);
    }

    #[tokio::test]
    async fn should_replace_key_it_does_not_know() {
        let mut tv = VirtualTv::new(VirtualTvInfo::default());
        let key = tv.connect(Some("stale"), T).await.unwrap();
        assert_ne!(key, "stale");
    }

    #[tokio::test]
    async fn should_accept_preconfigured_client_key() {
        let mut tv = VirtualTv::new(VirtualTvInfo {
            client_key: Some("known".to_string()),
            ..VirtualTvInfo::default()
        });
        assert_eq!(tv.connect(Some("known"), T).await.unwrap(), "known");
    }

    #[tokio::test]
    async fn should_refuse_session_while_powered_off() {
        let mut tv = VirtualTv::new(VirtualTvInfo {
            powered_on: false,
            ..VirtualTvInfo::default()
        });
        assert!(matches!(
            tv.connect(None, T).await,
            Err(DeviceError::Unreachable(_))
        ));
        assert!(tv.volume_up().await.is_err());
    }

    #[tokio::test]
    async fn should_refuse_sessions_while_booting() {
        let mut tv = VirtualTv::new(VirtualTvInfo {
            powered_on: false,
            boot_handshakes: 2,
            ..VirtualTvInfo::default()
        });
        tv.power_on().await.unwrap();

        assert!(tv.connect(None, T).await.is_err());
        assert!(tv.connect(None, T).await.is_err());
        assert!(tv.connect(None, T).await.is_ok());
        assert_eq!(tv.activity().connects(), 3);
    }

    #[tokio::test]
    async fn should_keep_volume_within_range() {
        let mut tv = VirtualTv::new(VirtualTvInfo {
            volume: 100,
            ..VirtualTvInfo::default()
        });
        tv.volume_up().await.unwrap();
        assert_eq!(tv.get_volume().await.unwrap(), 100);

        tv.set_volume(0).await.unwrap();
        tv.volume_down().await.unwrap();
        assert_eq!(tv.get_volume().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn should_step_channels_in_number_order_and_wrap() {
        let mut tv = VirtualTv::new(VirtualTvInfo {
            channel: Some(24),
            ..VirtualTvInfo::default()
        });
        tv.channel_up().await.unwrap();
        assert_eq!(tv.current_channel().await.unwrap(), Channel::new(1, "BBC ONE"));

        tv.channel_down().await.unwrap();
        assert_eq!(tv.current_channel().await.unwrap().number, 24);
    }

    #[tokio::test]
    async fn should_accept_unlisted_channel_number_with_empty_name() {
        let mut tv = VirtualTv::new(VirtualTvInfo::default());
        tv.set_channel(999).await.unwrap();
        assert_eq!(tv.current_channel().await.unwrap(), Channel::new(999, ""));
    }

    #[tokio::test]
    async fn should_launch_known_app_only() {
        let mut tv = VirtualTv::new(VirtualTvInfo::default());
        tv.launch_app("netflix").await.unwrap();
        assert_eq!(tv.state().foreground_app.as_deref(), Some("netflix"));

        assert!(matches!(
            tv.launch_app("missing").await,
            Err(DeviceError::Remote(_))
        ));
    }

    #[tokio::test]
    async fn should_switch_to_known_input() {
        let mut tv = VirtualTv::new(VirtualTvInfo::default());
        tv.switch_input("HDMI_2").await.unwrap();
        assert_eq!(tv.state().input.as_deref(), Some("HDMI_2"));
        assert!(tv.switch_input("HDMI_9").await.is_err());
    }

    #[tokio::test]
    async fn should_record_playback_controls() {
        let mut tv = VirtualTv::new(VirtualTvInfo::default());
        tv.fast_forward().await.unwrap();
        assert_eq!(tv.state().playback, Some(Playback::FastForwarding));
    }

    #[test]
    fn should_read_info_with_defaults() {
        let info: VirtualTvInfo =
            serde_json::from_value(serde_json::json!({ "volume": 30 })).unwrap();
        assert_eq!(info.volume, 30);
        assert!(info.powered_on);
        assert_eq!(info.channels.len(), 4);
    }
}
