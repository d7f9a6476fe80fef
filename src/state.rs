use std::sync::Arc;

use crate::broker::{Broker, InProcessBroker};
use crate::clients::PushClient;
use crate::config::Config;
use crate::db::Store;
use crate::realtime::ConnectionGateway;
use crate::services::{EngagementService, InviteService, NotificationService};

/// Everything long-lived the handlers share: the store, the broker and the
/// services built on top of them.
#[derive(Clone)]
pub struct SharedState {
    pub config: Config,

    pub store: Store,

    pub broker: Arc<dyn Broker>,

    pub push: PushClient,

    pub engagements: Arc<EngagementService>,

    pub invites: Arc<InviteService>,

    pub notifications: Arc<NotificationService>,

    pub gateway: Arc<ConnectionGateway>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let broker: Arc<dyn Broker> =
            Arc::new(InProcessBroker::new(config.general.broker_buffer_size));

        let push = PushClient::new(config.push.clone())?;

        let engagements = Arc::new(EngagementService::new(store.clone(), broker.clone()));
        let invites = Arc::new(InviteService::new(
            store.clone(),
            broker.clone(),
            push.clone(),
        ));
        let notifications = Arc::new(NotificationService::new(store.clone()));
        let gateway = Arc::new(ConnectionGateway::new(store.clone(), broker.clone()));

        Ok(Self {
            config,
            store,
            broker,
            push,
            engagements,
            invites,
            notifications,
            gateway,
        })
    }
}
