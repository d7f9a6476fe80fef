//! The two tasks owning one live connection: the relay loop writing matching
//! events to the socket, and the closure watcher reading solely to detect
//! that the peer went away.

use std::fmt::Display;

use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::broker::Subscription;
use crate::domain::events::EventRecord;

/// Per-session delivery rule, fixed at upgrade time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionFilter {
    /// Private notification stream: only events addressed to this identity.
    Global { identity: String },
    /// Live album view: every event for this album, whoever it is addressed
    /// to. `recipient_id` is ignored here.
    Scoped { album_id: String },
}

impl SessionFilter {
    #[must_use]
    pub fn should_deliver(&self, record: &EventRecord) -> bool {
        match self {
            Self::Global { identity } => record.recipient_id == *identity,
            Self::Scoped { album_id } => record.scope_key.as_deref() == Some(album_id.as_str()),
        }
    }
}

/// Forwards matching broker messages to the socket until the subscription
/// ends, a write fails, or the closure watcher signals shutdown.
///
/// This function is the single owner of the subscription and the write half;
/// both are released exactly once when it returns, regardless of which arm
/// ended the loop.
pub async fn relay_loop<S>(
    mut sink: S,
    mut subscription: Subscription,
    filter: SessionFilter,
    mut shutdown: oneshot::Receiver<()>,
) where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    loop {
        tokio::select! {
            message = subscription.recv() => {
                let Some(raw) = message else { break };

                let record: EventRecord = match serde_json::from_str(&raw) {
                    Ok(record) => record,
                    Err(e) => {
                        warn!("Discarding undecodable broker message: {}", e);
                        continue;
                    }
                };

                if !filter.should_deliver(&record) {
                    continue;
                }

                if let Err(e) = sink.send(Message::Text(raw.into())).await {
                    // Peer presumed gone; fatal for this session only.
                    debug!("Socket write failed, closing session: {}", e);
                    break;
                }
            }
            _ = &mut shutdown => break,
        }
    }

    debug!(topic = %subscription.topic(), "session ended, subscription released");
    drop(subscription);
    let _ = sink.close().await;
}

/// Blocks on inbound frames solely to observe the peer closing. Fires the
/// single-shot shutdown signal and returns; the relay loop does the actual
/// teardown.
pub async fn closure_watcher<R>(mut stream: R, shutdown: oneshot::Sender<()>)
where
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Close(_)) => break,
            // The channel is server-to-client; other inbound traffic is
            // ignored, not an error.
            Ok(_) => {}
            Err(e) => {
                debug!("Socket read failed, closing session: {}", e);
                break;
            }
        }
    }

    let _ = shutdown.send(());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::{Broker, InProcessBroker};
    use crate::domain::events::{EventKind, EventRecord, Operation};
    use futures::channel::mpsc;
    use std::time::Duration;

    fn record(recipient: &str, scope: Option<&str>) -> EventRecord {
        EventRecord::new(
            Operation::Add,
            EventKind::Like,
            recipient,
            scope.map(str::to_string),
            &serde_json::json!({}),
        )
        .unwrap()
    }

    #[test]
    fn global_filter_matches_recipient_only() {
        let filter = SessionFilter::Global {
            identity: "u1".to_string(),
        };

        assert!(filter.should_deliver(&record("u1", Some("alb1"))));
        assert!(!filter.should_deliver(&record("u2", Some("alb1"))));
    }

    #[test]
    fn scoped_filter_ignores_recipient() {
        let filter = SessionFilter::Scoped {
            album_id: "alb1".to_string(),
        };

        assert!(filter.should_deliver(&record("u1", Some("alb1"))));
        assert!(filter.should_deliver(&record("u2", Some("alb1"))));
        assert!(!filter.should_deliver(&record("u1", Some("alb2"))));
        assert!(!filter.should_deliver(&record("u1", None)));
    }

    /// Spawns a full session over in-memory halves: a sink receiving what the
    /// peer would, and a frame channel standing in for the read half.
    fn spawn_session(
        broker: &InProcessBroker,
        filter: SessionFilter,
    ) -> (
        mpsc::UnboundedReceiver<Message>,
        mpsc::UnboundedSender<Result<Message, axum::Error>>,
        tokio::task::JoinHandle<()>,
        tokio::task::JoinHandle<()>,
    ) {
        let subscription = broker.subscribe("notifications");
        let (sink_tx, sink_rx) = mpsc::unbounded::<Message>();
        let (frame_tx, frame_rx) = mpsc::unbounded::<Result<Message, axum::Error>>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let relay = tokio::spawn(relay_loop(sink_tx, subscription, filter, shutdown_rx));
        let watcher = tokio::spawn(closure_watcher(frame_rx, shutdown_tx));
        (sink_rx, frame_tx, relay, watcher)
    }

    fn delivered_user_id(message: &Message) -> String {
        let Message::Text(text) = message else {
            panic!("expected a text frame, got {message:?}");
        };
        let value: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
        value["user_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn peer_close_tears_down_the_session_and_releases_the_subscription() {
        let broker = InProcessBroker::new(16);
        let filter = SessionFilter::Global {
            identity: "u1".to_string(),
        };
        let (mut sink_rx, frame_tx, relay, watcher) = spawn_session(&broker, filter);

        broker
            .publish("notifications", record("u1", None).to_json().unwrap())
            .unwrap();
        broker
            .publish("notifications", record("u2", None).to_json().unwrap())
            .unwrap();
        broker
            .publish("notifications", record("u1", Some("alb1")).to_json().unwrap())
            .unwrap();

        // Only the events addressed to u1 reach the peer, in order.
        let first = sink_rx.next().await.expect("first delivery");
        assert_eq!(delivered_user_id(&first), "u1");
        let second = sink_rx.next().await.expect("second delivery");
        assert_eq!(delivered_user_id(&second), "u1");

        frame_tx
            .unbounded_send(Ok(Message::Close(None)))
            .expect("send close frame");

        tokio::time::timeout(Duration::from_secs(2), watcher)
            .await
            .expect("watcher should finish")
            .unwrap();
        tokio::time::timeout(Duration::from_secs(2), relay)
            .await
            .expect("relay should finish")
            .unwrap();

        // The relay closed its sink on the way out...
        assert!(sink_rx.next().await.is_none());

        // ...and dropped its subscription: the next publish reaps the topic.
        broker.publish("notifications", "noop".to_string()).unwrap();
        assert_eq!(broker.topic_count(), 0);
    }

    #[tokio::test]
    async fn read_error_tears_the_session_down_too() {
        let broker = InProcessBroker::new(16);
        let filter = SessionFilter::Global {
            identity: "u1".to_string(),
        };
        let (mut sink_rx, frame_tx, relay, watcher) = spawn_session(&broker, filter);

        frame_tx
            .unbounded_send(Err(axum::Error::new(std::io::Error::other(
                "connection reset",
            ))))
            .expect("send read error");

        tokio::time::timeout(Duration::from_secs(2), watcher)
            .await
            .expect("watcher should finish")
            .unwrap();
        tokio::time::timeout(Duration::from_secs(2), relay)
            .await
            .expect("relay should finish")
            .unwrap();

        assert!(sink_rx.next().await.is_none());
    }

    #[tokio::test]
    async fn inbound_traffic_other_than_close_keeps_the_session_alive() {
        let broker = InProcessBroker::new(16);
        let filter = SessionFilter::Global {
            identity: "u1".to_string(),
        };
        let (mut sink_rx, frame_tx, relay, _watcher) = spawn_session(&broker, filter);

        frame_tx
            .unbounded_send(Ok(Message::Text("client chatter".into())))
            .expect("send text frame");

        broker
            .publish("notifications", record("u1", None).to_json().unwrap())
            .unwrap();

        // Still relaying after the ignored inbound frame.
        let delivered = sink_rx.next().await.expect("delivery after chatter");
        assert_eq!(delivered_user_id(&delivered), "u1");

        frame_tx
            .unbounded_send(Ok(Message::Close(None)))
            .expect("send close frame");
        tokio::time::timeout(Duration::from_secs(2), relay)
            .await
            .expect("relay should finish")
            .unwrap();
    }
}
