//! Per-device worker: one task owns one connection and runs its commands in
//! arrival order.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use relayhub_domain::command::{CommandPayload, CommandResultPayload};
use relayhub_domain::device::{Capabilities, Device};
use relayhub_domain::envelope::{Envelope, TOPIC_LOGGING};
use relayhub_domain::error::{DeviceError, RelayHubError};
use relayhub_domain::log::LogLevel;
use relayhub_domain::state::{Command, DeviceState, StateKind};

use super::config::RouterConfig;
use super::handlers;
use crate::message_bus::MessageBus;
use crate::ports::{ConnectionHandle, DeviceConnection, Transport};

pub(super) type Outcome = Result<Option<DeviceState>, RelayHubError>;

/// A queued command and where to send its result.
#[derive(Debug)]
pub(super) struct Job {
    pub command: CommandPayload,
    pub reply_topic: Option<String>,
}

/// The connection of one device together with its session credential.
pub(super) struct Session<C> {
    pub device_id: String,
    capabilities: Capabilities,
    pub connection: C,
    pub credential: Option<String>,
    pub config: RouterConfig,
}

impl<C: DeviceConnection> Session<C> {
    pub fn new(device: &Device, handle: ConnectionHandle<C>, config: RouterConfig) -> Self {
        Self {
            device_id: device.id.clone(),
            capabilities: device.capabilities.clone(),
            connection: handle.connection,
            credential: handle.credential,
            config,
        }
    }

    /// Whether the device declares `command` on `state`.
    pub fn supports(&self, state: StateKind, command: Command) -> bool {
        self.capabilities
            .get(state.as_str())
            .is_some_and(|commands| commands.contains(&command))
    }

    /// Establish the session with the regular connect timeout.
    pub async fn connect(&mut self) -> Result<(), RelayHubError> {
        self.handshake(self.config.connect_timeout).await
    }

    /// Run the handshake and keep whatever credential the device hands back.
    pub async fn handshake(&mut self, timeout: Duration) -> Result<(), RelayHubError> {
        let key = bounded(
            timeout,
            self.connection.connect(self.credential.as_deref(), timeout),
        )
        .await?;
        if self.credential.as_deref() != Some(key.as_str()) {
            tracing::info!(device_id = %self.device_id, "session credential refreshed");
            self.credential = Some(key);
        }
        Ok(())
    }
}

/// Run a device operation under a deadline.
pub(super) async fn bounded<T>(
    timeout: Duration,
    operation: impl Future<Output = Result<T, DeviceError>>,
) -> Result<T, RelayHubError> {
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result.map_err(RelayHubError::from),
        Err(_) => Err(DeviceError::Timeout(timeout).into()),
    }
}

pub(super) async fn run<C, T>(
    mut session: Session<C>,
    mut queue: mpsc::Receiver<Job>,
    bus: Arc<MessageBus<T>>,
) where
    C: DeviceConnection,
    T: Transport + 'static,
{
    while let Some(job) = queue.recv().await {
        let outcome = handlers::execute(&mut session, &job.command).await;
        respond(&bus, job.reply_topic.as_deref(), &job.command, outcome).await;
    }
    tracing::debug!(device_id = %session.device_id, "device worker stopped");
}

/// Publish the result of `command` and, on failure, a log record.
///
/// Without a reply topic the result goes to the empty topic, where nobody
/// normally listens.
pub(super) async fn respond<T: Transport + 'static>(
    bus: &MessageBus<T>,
    reply_topic: Option<&str>,
    command: &CommandPayload,
    outcome: Outcome,
) {
    if let Err(err) = &outcome {
        let level = match err {
            RelayHubError::ConnectionFailure(_) => LogLevel::Error,
            _ => LogLevel::Warn,
        };
        let text = format!(
            "{} {} {}: {}",
            command.device_id,
            command.state,
            command.command,
            err.describe()
        );
        tracing::debug!(device_id = %command.device_id, error = %text, "command failed");
        if let Err(err) = bus.publish(TOPIC_LOGGING, &Envelope::log(level, text)).await {
            tracing::warn!(error = %err.describe(), "failed to publish log record");
        }
    }

    let reply = Envelope::command_result(CommandResultPayload::from(outcome));
    if let Err(err) = bus.publish(reply_topic.unwrap_or_default(), &reply).await {
        tracing::warn!(
            device_id = %command.device_id,
            error = %err.describe(),
            "failed to publish command result"
        );
    }
}
