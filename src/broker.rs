//! Publish/subscribe broker seam.
//!
//! Topics are plain strings. Every subscriber gets an independent bounded
//! buffer; when a slow consumer falls behind, its oldest undelivered messages
//! are dropped so publishers never block. Messages published before a
//! subscription exists are not delivered to it.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::warn;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("publish to topic '{topic}' failed: {reason}")]
    Publish { topic: String, reason: String },
}

pub trait Broker: Send + Sync {
    /// Best-effort fan-out of one already-serialized message to every live
    /// subscriber of `topic`.
    fn publish(&self, topic: &str, message: String) -> Result<(), BrokerError>;

    /// Opens an independent subscription. Dropping the returned handle is the
    /// unsubscribe.
    fn subscribe(&self, topic: &str) -> Subscription;
}

/// Receive side of one subscription. Owned exclusively by the session that
/// created it.
pub struct Subscription {
    topic: String,
    rx: broadcast::Receiver<String>,
}

impl Subscription {
    /// Waits for the next message. Skips over gaps caused by this consumer
    /// lagging; returns `None` once the topic can produce nothing further.
    pub async fn recv(&mut self) -> Option<String> {
        loop {
            match self.rx.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(
                        topic = %self.topic,
                        missed,
                        "slow subscriber, oldest undelivered messages dropped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Broker backed by one bounded `tokio::sync::broadcast` channel per topic.
///
/// Channels are created lazily on first subscribe and reaped on publish once
/// their last subscriber is gone.
pub struct InProcessBroker {
    topics: Mutex<HashMap<String, broadcast::Sender<String>>>,
    buffer_size: usize,
}

impl InProcessBroker {
    #[must_use]
    pub fn new(buffer_size: usize) -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
            buffer_size: buffer_size.max(1),
        }
    }

    #[cfg(test)]
    pub(crate) fn topic_count(&self) -> usize {
        self.topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Broker for InProcessBroker {
    fn publish(&self, topic: &str, message: String) -> Result<(), BrokerError> {
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);

        let Some(sender) = topics.get(topic) else {
            // Nobody has ever subscribed; delivery is undefined pre-subscribe.
            return Ok(());
        };

        if sender.receiver_count() == 0 {
            topics.remove(topic);
            return Ok(());
        }

        sender
            .send(message)
            .map(|_| ())
            .map_err(|e| BrokerError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            })
    }

    fn subscribe(&self, topic: &str) -> Subscription {
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);

        let sender = topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.buffer_size).0);

        Subscription {
            topic: topic.to_string(),
            rx: sender.subscribe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_to_live_subscriber() {
        let broker = InProcessBroker::new(16);
        let mut sub = broker.subscribe("notifications");

        broker
            .publish("notifications", "hello".to_string())
            .unwrap();

        assert_eq!(sub.recv().await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn no_delivery_of_messages_published_before_subscribe() {
        let broker = InProcessBroker::new(16);

        // Published into the void; a later subscriber must not see it.
        broker.publish("notifications", "early".to_string()).unwrap();

        let mut sub = broker.subscribe("notifications");
        broker.publish("notifications", "late".to_string()).unwrap();

        assert_eq!(sub.recv().await.as_deref(), Some("late"));
    }

    #[tokio::test]
    async fn topics_are_isolated() {
        let broker = InProcessBroker::new(16);
        let mut global = broker.subscribe("notifications");
        let mut scoped = broker.subscribe("alb1");

        broker.publish("alb1", "album event".to_string()).unwrap();
        broker
            .publish("notifications", "private event".to_string())
            .unwrap();

        assert_eq!(scoped.recv().await.as_deref(), Some("album event"));
        assert_eq!(global.recv().await.as_deref(), Some("private event"));
    }

    #[tokio::test]
    async fn slow_subscriber_drops_oldest_not_publisher() {
        let broker = InProcessBroker::new(2);
        let mut sub = broker.subscribe("notifications");

        for i in 0..5 {
            broker.publish("notifications", format!("m{i}")).unwrap();
        }

        // The two newest survive; recv skips over the gap.
        assert_eq!(sub.recv().await.as_deref(), Some("m3"));
        assert_eq!(sub.recv().await.as_deref(), Some("m4"));
    }

    #[tokio::test]
    async fn dropped_subscription_is_reaped() {
        let broker = InProcessBroker::new(16);
        let sub = broker.subscribe("alb1");
        assert_eq!(broker.topic_count(), 1);

        drop(sub);
        broker.publish("alb1", "nobody home".to_string()).unwrap();
        assert_eq!(broker.topic_count(), 0);
    }

    #[tokio::test]
    async fn independent_subscribers_each_get_a_copy() {
        let broker = InProcessBroker::new(16);
        let mut a = broker.subscribe("alb1");
        let mut b = broker.subscribe("alb1");

        broker.publish("alb1", "fan-out".to_string()).unwrap();

        assert_eq!(a.recv().await.as_deref(), Some("fan-out"));
        assert_eq!(b.recv().await.as_deref(), Some("fan-out"));
    }
}
