//! Per-connection websocket gateway.
//!
//! Each accepted upgrade becomes one session owning exactly one broker
//! subscription and two tasks: a relay loop on the write half and a closure
//! watcher on the read half, coordinated by a single-shot shutdown channel.

pub mod relay;

use std::sync::Arc;

use axum::extract::ws::WebSocket;
use futures::StreamExt;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::info;

use crate::broker::Broker;
use crate::db::{Store, User};
use crate::domain::events::GLOBAL_TOPIC;
use relay::{SessionFilter, closure_watcher, relay_loop};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Unknown session identity: {0}")]
    IdentityLookup(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for GatewayError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

pub struct ConnectionGateway {
    store: Store,
    broker: Arc<dyn Broker>,
}

impl ConnectionGateway {
    #[must_use]
    pub fn new(store: Store, broker: Arc<dyn Broker>) -> Self {
        Self { store, broker }
    }

    /// Maps the authenticated session subject to the internal user id used
    /// for filtering. Must succeed before the upgrade is served.
    pub async fn resolve_identity(&self, username: &str) -> Result<User, GatewayError> {
        self.store
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| GatewayError::IdentityLookup(username.to_string()))
    }

    /// Takes ownership of an upgraded socket and spawns the session tasks.
    /// Returns immediately; the tasks own the connection's remaining
    /// lifetime.
    pub fn open(&self, socket: WebSocket, identity: &User, channel: Option<String>) {
        let (filter, topic) = match channel {
            Some(album_id) => {
                let topic = album_id.clone();
                (SessionFilter::Scoped { album_id }, topic)
            }
            None => (
                SessionFilter::Global {
                    identity: identity.user_id.clone(),
                },
                GLOBAL_TOPIC.to_string(),
            ),
        };

        // Subscribe once, before either task runs; the relay loop owns the
        // handle from here on.
        let subscription = self.broker.subscribe(&topic);

        info!(
            user = %identity.username,
            topic = %topic,
            "websocket session opened"
        );

        let (sink, stream) = socket.split();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(relay_loop(sink, subscription, filter, shutdown_rx));
        tokio::spawn(closure_watcher(stream, shutdown_tx));
    }
}
