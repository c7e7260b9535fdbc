//! Envelope-level publish/subscribe and request/reply over a [`Transport`].

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

use relayhub_domain::envelope::{Envelope, new_reply_topic};
use relayhub_domain::error::{RelayHubError, TransportError};

use crate::ports::{SubscriptionId, Transport};

/// A running subscription created by [`MessageBus::subscribe`].
///
/// Dropping the handle does not stop delivery; call
/// [`MessageBus::unsubscribe`] or [`abort`](Self::abort).
#[derive(Debug)]
pub struct SubscriptionHandle {
    topic: String,
    id: SubscriptionId,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Stop the delivery task. The transport prunes the subscription lazily.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Whether the delivery task has ended (unsubscribed or transport closed).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Envelope bus used by every component of the hub.
pub struct MessageBus<T> {
    transport: T,
}

impl<T: Transport + 'static> MessageBus<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Encode `envelope` and publish it on `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::Transport`] if encoding or delivery fails.
    #[tracing::instrument(skip(self, envelope), fields(kind = %envelope.kind()))]
    pub async fn publish(&self, topic: &str, envelope: &Envelope) -> Result<(), RelayHubError> {
        let bytes = envelope.encode()?;
        self.transport.publish(topic, bytes).await?;
        Ok(())
    }

    /// Deliver every envelope published on `topic` to `callback`.
    ///
    /// Envelopes are handed over one at a time in arrival order: the next one
    /// waits until the callback's future completes. Messages that fail to
    /// decode are dropped with a debug log.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::Transport`] if the transport refuses the
    /// subscription.
    pub async fn subscribe<F, Fut>(
        &self,
        topic: &str,
        callback: F,
    ) -> Result<SubscriptionHandle, RelayHubError>
    where
        F: Fn(Envelope) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut subscription = self.transport.subscribe(topic).await?;
        let id = subscription.id;
        let task = tokio::spawn(async move {
            while let Some(bytes) = subscription.recv().await {
                match Envelope::decode(&bytes) {
                    Ok(envelope) => callback(envelope).await,
                    Err(err) => tracing::debug!(
                        topic = %subscription.topic,
                        error = %err.describe(),
                        "dropping malformed message"
                    ),
                }
            }
            tracing::debug!(topic = %subscription.topic, "subscription ended");
        });
        tracing::debug!(topic, id, "subscribed");
        Ok(SubscriptionHandle {
            topic: topic.to_string(),
            id,
            task,
        })
    }

    /// Stop a subscription created by [`subscribe`](Self::subscribe).
    pub async fn unsubscribe(&self, handle: SubscriptionHandle) {
        handle.task.abort();
        self.transport.unsubscribe(&handle.topic, handle.id).await;
    }

    /// Publish `envelope` on `topic` and wait for the first reply.
    ///
    /// A fresh reply topic is subscribed before publishing, so a fast reply
    /// cannot be missed, and it is unsubscribed again on every outcome.
    ///
    /// # Errors
    ///
    /// - [`RelayHubError::Timeout`] if no reply arrives within `timeout`
    /// - [`RelayHubError::Transport`] if publishing fails or the transport closes
    /// - [`RelayHubError::MalformedEnvelope`] / [`RelayHubError::MalformedPayload`]
    ///   if the reply cannot be decoded
    #[tracing::instrument(skip(self, envelope), fields(kind = %envelope.kind()))]
    pub async fn request(
        &self,
        topic: &str,
        envelope: Envelope,
        timeout: Duration,
    ) -> Result<Envelope, RelayHubError> {
        let reply_topic = new_reply_topic();
        let mut subscription = self.transport.subscribe(&reply_topic).await?;
        let envelope = envelope.with_reply_topic(reply_topic.clone());

        let outcome = match self.publish(topic, &envelope).await {
            Ok(()) => match tokio::time::timeout(timeout, subscription.recv()).await {
                Ok(Some(bytes)) => Envelope::decode(&bytes),
                Ok(None) => Err(TransportError::Closed.into()),
                Err(_) => Err(RelayHubError::Timeout {
                    topic: reply_topic.clone(),
                    after: timeout,
                }),
            },
            Err(err) => Err(err),
        };

        self.transport.unsubscribe(&reply_topic, subscription.id).await;
        if let Err(err) = &outcome {
            tracing::warn!(error = %err.describe(), "request failed");
        }
        outcome
    }
}
