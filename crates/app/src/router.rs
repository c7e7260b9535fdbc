//! Device command router.
//!
//! Subscribes to a device-type topic and runs each command against the
//! addressed device. Every device gets its own worker task and bounded queue:
//! commands for one device run strictly one after another, commands for
//! different devices never wait on each other. Each command produces exactly
//! one result envelope on its reply topic.

mod config;
mod handlers;
mod worker;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use relayhub_domain::device::Device;
use relayhub_domain::envelope::Envelope;
use relayhub_domain::error::RelayHubError;

pub use config::RouterConfig;

use crate::message_bus::{MessageBus, SubscriptionHandle};
use crate::ports::{ConnectionFactory, Transport};
use worker::{Job, Session};

/// Routes command envelopes to per-device workers.
pub struct DeviceCommandRouter<T> {
    bus: Arc<MessageBus<T>>,
    queues: HashMap<String, mpsc::Sender<Job>>,
}

impl<T: Transport + 'static> DeviceCommandRouter<T> {
    /// Build sessions for `devices`, start their workers and subscribe to `topic`.
    ///
    /// Each device gets one best-effort connection attempt; a device that is
    /// unreachable now is retried on its first command.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::ConnectionFailure`] if a device's connection
    /// parameters are invalid, or [`RelayHubError::Transport`] if the topic
    /// cannot be subscribed.
    pub async fn launch<F: ConnectionFactory>(
        bus: Arc<MessageBus<T>>,
        topic: &str,
        devices: &[Device],
        factory: &F,
        config: RouterConfig,
    ) -> Result<RouterHandle, RelayHubError> {
        let mut queues = HashMap::with_capacity(devices.len());
        let mut workers = Vec::with_capacity(devices.len());

        for device in devices {
            let handle = factory.create(device)?;
            let mut session = Session::new(device, handle, config);
            if let Err(err) = session.connect().await {
                tracing::warn!(
                    device_id = %device.id,
                    error = %err.describe(),
                    "initial connection failed, retrying on first command"
                );
            }
            let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
            workers.push(tokio::spawn(worker::run(
                session,
                receiver,
                Arc::clone(&bus),
            )));
            queues.insert(device.id.clone(), sender);
        }

        let router = Arc::new(Self {
            bus: Arc::clone(&bus),
            queues,
        });
        let subscription = bus
            .subscribe(topic, move |envelope| {
                let router = Arc::clone(&router);
                async move { router.route(envelope).await }
            })
            .await;
        let subscription = match subscription {
            Ok(subscription) => subscription,
            Err(err) => {
                workers.iter().for_each(JoinHandle::abort);
                return Err(err);
            }
        };

        tracing::info!(topic, devices = workers.len(), "device command router started");
        Ok(RouterHandle {
            subscription,
            workers,
        })
    }

    /// Hand the command to its device worker without waiting for it to run.
    async fn route(&self, envelope: Envelope) {
        let reply_topic = envelope.reply_topic.clone();
        let Some(command) = envelope.into_command() else {
            tracing::debug!("ignoring non-command envelope");
            return;
        };

        let Some(queue) = self.queues.get(&command.device_id) else {
            let err = RelayHubError::UnknownDevice(command.device_id.clone());
            worker::respond(&self.bus, reply_topic.as_deref(), &command, Err(err)).await;
            return;
        };

        if let Err(err) = queue.try_send(Job {
            command,
            reply_topic,
        }) {
            let job = err.into_inner();
            let err = RelayHubError::DeviceBusy(job.command.device_id.clone());
            worker::respond(&self.bus, job.reply_topic.as_deref(), &job.command, Err(err)).await;
        }
    }
}

/// Running router returned by [`DeviceCommandRouter::launch`].
#[derive(Debug)]
pub struct RouterHandle {
    subscription: SubscriptionHandle,
    workers: Vec<JoinHandle<()>>,
}

impl RouterHandle {
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop accepting commands and wait for queued ones to finish.
    pub async fn shutdown(self) {
        self.subscription.abort();
        for worker in self.workers {
            if let Err(err) = worker.await {
                if err.is_panic() {
                    tracing::error!("device worker panicked");
                }
            }
        }
        tracing::info!("device command router stopped");
    }
}
