//! Transport port: topic-addressed delivery of opaque byte messages.
//!
//! The message bus layers envelopes and request/reply on top of this. A
//! transport guarantees that one subscription sees the messages of one
//! publisher in publication order; nothing is promised across publishers.

use std::future::Future;

use tokio::sync::mpsc;

use relayhub_domain::error::TransportError;

/// Identifies one subscription within its topic.
pub type SubscriptionId = u64;

/// A live subscription to a topic.
///
/// Messages are buffered until read. [`recv`](Self::recv) yields `None` once
/// the transport drops the subscription (unsubscribe or connection loss).
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub topic: String,
    receiver: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl Subscription {
    #[must_use]
    pub fn new(
        id: SubscriptionId,
        topic: impl Into<String>,
        receiver: mpsc::UnboundedReceiver<Vec<u8>>,
    ) -> Self {
        Self {
            id,
            topic: topic.into(),
            receiver,
        }
    }

    /// Wait for the next message.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.receiver.recv().await
    }
}

/// Publish/subscribe over named topics.
pub trait Transport: Send + Sync {
    /// Deliver `bytes` to every current subscriber of `topic`.
    ///
    /// Publishing to a topic nobody listens on is not an error.
    fn publish(
        &self,
        topic: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Start receiving messages published to `topic` from now on.
    fn subscribe(
        &self,
        topic: &str,
    ) -> impl Future<Output = Result<Subscription, TransportError>> + Send;

    /// Stop delivering to the given subscription. Unknown ids are ignored.
    fn unsubscribe(&self, topic: &str, id: SubscriptionId) -> impl Future<Output = ()> + Send;
}

impl<T: Transport> Transport for std::sync::Arc<T> {
    fn publish(
        &self,
        topic: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        (**self).publish(topic, bytes)
    }

    fn subscribe(
        &self,
        topic: &str,
    ) -> impl Future<Output = Result<Subscription, TransportError>> + Send {
        (**self).subscribe(topic)
    }

    fn unsubscribe(&self, topic: &str, id: SubscriptionId) -> impl Future<Output = ()> + Send {
        (**self).unsubscribe(topic, id)
    }
}
