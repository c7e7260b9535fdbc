//! Broker session: subscribe to the hub subject and answer each request.

use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::task::JoinHandle;

use crate::config::MessengerConfig;
use crate::error::MessengerError;
use crate::forwarder::Forwarder;

const REQUEST_CAPACITY: usize = 10;
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Running messenger returned by [`launch`].
pub struct MessengerHandle {
    client: AsyncClient,
    task: JoinHandle<()>,
}

impl MessengerHandle {
    /// Disconnect from the broker and stop relaying.
    ///
    /// # Errors
    ///
    /// Returns [`MessengerError::Client`] if the disconnect request cannot be
    /// queued; the relay task is stopped regardless.
    pub async fn shutdown(self) -> Result<(), MessengerError> {
        let result = self.client.disconnect().await.map_err(MessengerError::Client);
        self.task.abort();
        tracing::info!("messenger stopped");
        result
    }
}

/// Connect to the broker and relay requests on the configured subject to
/// `forwarder`.
///
/// The connection is established in the background; the subject is
/// (re)subscribed on every connection acknowledgement, so broker restarts are
/// survived. Must be called from within a tokio runtime.
#[must_use]
pub fn launch(config: &MessengerConfig, forwarder: Forwarder) -> MessengerHandle {
    let mut options = MqttOptions::new(
        config.client_id.clone(),
        config.broker_host.clone(),
        config.broker_port,
    );
    options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs.max(5))));
    if let Some(username) = &config.username {
        options.set_credentials(username.clone(), config.password.clone().unwrap_or_default());
    }

    let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
    let session = Session {
        client: client.clone(),
        forwarder: Arc::new(forwarder),
        subject: config.subject.clone(),
        reply_topic: config.reply_topic(),
    };
    let task = tokio::spawn(session.run(eventloop));
    tracing::info!(
        broker = %config.broker_host,
        port = config.broker_port,
        subject = %config.subject,
        "messenger started"
    );
    MessengerHandle { client, task }
}

struct Session {
    client: AsyncClient,
    forwarder: Arc<Forwarder>,
    subject: String,
    reply_topic: String,
}

impl Session {
    async fn run(self, mut eventloop: EventLoop) {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    tracing::info!(subject = %self.subject, "connected to broker");
                    if let Err(err) = self.client.try_subscribe(&self.subject, QoS::AtLeastOnce) {
                        tracing::error!(error = %err, "failed to subscribe to subject");
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) if publish.topic == self.subject => {
                    let client = self.client.clone();
                    let forwarder = Arc::clone(&self.forwarder);
                    let reply_topic = self.reply_topic.clone();
                    tokio::spawn(async move {
                        relay(&client, &forwarder, &publish.payload, &reply_topic).await;
                    });
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "broker connection lost, retrying");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }
}

async fn relay(client: &AsyncClient, forwarder: &Forwarder, payload: &[u8], default_topic: &str) {
    let outgoing = match forwarder.handle(payload).await {
        Ok(outgoing) => outgoing,
        Err(err) => {
            tracing::error!(error = %err, "failed to process remote request");
            return;
        }
    };
    let bytes = match serde_json::to_vec(&outgoing.envelope) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!(error = %err, "failed to encode remote reply");
            return;
        }
    };
    let topic = outgoing.reply_topic.as_deref().unwrap_or(default_topic);
    if let Err(err) = client.publish(topic, QoS::AtLeastOnce, false, bytes).await {
        tracing::error!(error = %err, topic, "failed to publish remote reply");
    }
}
