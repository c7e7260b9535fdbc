//! In-process transport backed by unbounded tokio mpsc channels.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use relayhub_domain::error::TransportError;

use crate::ports::{Subscription, SubscriptionId, Transport};

type Subscribers = Vec<(SubscriptionId, mpsc::UnboundedSender<Vec<u8>>)>;

#[derive(Default)]
struct Topics {
    closed: bool,
    next_id: SubscriptionId,
    by_topic: HashMap<String, Subscribers>,
}

/// Topic fan-out inside one process.
///
/// Each subscription gets its own queue, so a slow subscriber never holds up
/// publishers or other subscribers. Subscriptions whose receiving side was
/// dropped are pruned on the next publish to their topic.
#[derive(Default)]
pub struct MemoryTransport {
    topics: Mutex<Topics>,
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing the broker connection.
    ///
    /// Every open subscription ends and all later operations fail with
    /// [`TransportError::Closed`].
    pub fn close(&self) {
        let mut topics = self.lock();
        topics.closed = true;
        topics.by_topic.clear();
        tracing::debug!("memory transport closed");
    }

    /// Number of live subscriptions on `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.lock().by_topic.get(topic).map_or(0, Vec::len)
    }

    fn lock(&self) -> MutexGuard<'_, Topics> {
        self.topics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish_now(&self, topic: &str, bytes: Vec<u8>) -> Result<(), TransportError> {
        let mut topics = self.lock();
        if topics.closed {
            return Err(TransportError::Closed);
        }
        if let Some(subscribers) = topics.by_topic.get_mut(topic) {
            subscribers.retain(|(_, sender)| sender.send(bytes.clone()).is_ok());
            if subscribers.is_empty() {
                topics.by_topic.remove(topic);
            }
        }
        Ok(())
    }

    fn subscribe_now(&self, topic: &str) -> Result<Subscription, TransportError> {
        let mut topics = self.lock();
        if topics.closed {
            return Err(TransportError::Closed);
        }
        topics.next_id += 1;
        let id = topics.next_id;
        let (sender, receiver) = mpsc::unbounded_channel();
        topics
            .by_topic
            .entry(topic.to_string())
            .or_default()
            .push((id, sender));
        Ok(Subscription::new(id, topic, receiver))
    }

    fn unsubscribe_now(&self, topic: &str, id: SubscriptionId) {
        let mut topics = self.lock();
        if let Some(subscribers) = topics.by_topic.get_mut(topic) {
            subscribers.retain(|(sub_id, _)| *sub_id != id);
            if subscribers.is_empty() {
                topics.by_topic.remove(topic);
            }
        }
    }
}

impl Transport for MemoryTransport {
    fn publish(
        &self,
        topic: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        let result = self.publish_now(topic, bytes);
        async move { result }
    }

    fn subscribe(
        &self,
        topic: &str,
    ) -> impl Future<Output = Result<Subscription, TransportError>> + Send {
        let result = self.subscribe_now(topic);
        async move { result }
    }

    fn unsubscribe(&self, topic: &str, id: SubscriptionId) -> impl Future<Output = ()> + Send {
        self.unsubscribe_now(topic, id);
        async {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_deliver_to_every_subscriber_of_topic() {
        let transport = MemoryTransport::new();
        let mut first = transport.subscribe("tv").await.unwrap();
        let mut second = transport.subscribe("tv").await.unwrap();

        transport.publish("tv", b"hello".to_vec()).await.unwrap();

        assert_eq!(first.recv().await.unwrap(), b"hello");
        assert_eq!(second.recv().await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn should_not_deliver_to_other_topics() {
        let transport = MemoryTransport::new();
        let mut logging = transport.subscribe("logging").await.unwrap();

        transport.publish("tv", b"cmd".to_vec()).await.unwrap();
        transport.publish("logging", b"log".to_vec()).await.unwrap();

        assert_eq!(logging.recv().await.unwrap(), b"log");
    }

    #[tokio::test]
    async fn should_keep_publication_order() {
        let transport = MemoryTransport::new();
        let mut sub = transport.subscribe("tv").await.unwrap();
        for i in 0..10u8 {
            transport.publish("tv", vec![i]).await.unwrap();
        }
        for i in 0..10u8 {
            assert_eq!(sub.recv().await.unwrap(), vec![i]);
        }
    }

    #[tokio::test]
    async fn should_succeed_when_no_subscribers() {
        let transport = MemoryTransport::new();
        assert!(transport.publish("nobody", b"x".to_vec()).await.is_ok());
    }

    #[tokio::test]
    async fn should_stop_delivering_after_unsubscribe() {
        let transport = MemoryTransport::new();
        let mut sub = transport.subscribe("tv").await.unwrap();
        transport.unsubscribe("tv", sub.id).await;

        assert_eq!(transport.subscriber_count("tv"), 0);
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn should_prune_dropped_subscriptions_on_publish() {
        let transport = MemoryTransport::new();
        let sub = transport.subscribe("tv").await.unwrap();
        drop(sub);

        transport.publish("tv", b"x".to_vec()).await.unwrap();
        assert_eq!(transport.subscriber_count("tv"), 0);
    }

    #[tokio::test]
    async fn should_fail_every_operation_after_close() {
        let transport = MemoryTransport::new();
        let mut sub = transport.subscribe("tv").await.unwrap();
        transport.close();

        assert!(sub.recv().await.is_none());
        assert_eq!(
            transport.publish("tv", b"x".to_vec()).await,
            Err(TransportError::Closed)
        );
        assert!(matches!(
            transport.subscribe("tv").await,
            Err(TransportError::Closed)
        ));
    }
}
