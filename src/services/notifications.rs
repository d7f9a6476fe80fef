//! Read side of the notification pipeline: the feed a client fetches on
//! connect, and the explicit seen acknowledgements.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::db::{Store, User};
use crate::entities::{album_requests, friend_requests};

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for NotificationError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct EngagementFeedItem {
    pub notification_id: String,
    pub image_id: String,
    pub album_id: String,
    pub notifier_id: String,
    pub notifier_first: String,
    pub notifier_last: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub seen: bool,
    pub received_at: String,
}

#[derive(Debug, Serialize)]
pub struct RequestFeedItem {
    pub request_id: String,
    pub actor_id: String,
    pub actor_first: String,
    pub actor_last: String,
    pub status: String,
    pub seen: bool,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_name: Option<String>,
}

/// Everything a client needs to render its notification tray after a cold
/// start, before any live events arrive.
#[derive(Debug, Serialize)]
pub struct NotificationFeed {
    pub engagements: Vec<EngagementFeedItem>,
    pub friend_requests: Vec<RequestFeedItem>,
    pub friend_responses: Vec<RequestFeedItem>,
    pub album_invites: Vec<RequestFeedItem>,
    pub album_responses: Vec<RequestFeedItem>,
}

pub struct NotificationService {
    store: Store,
}

impl NotificationService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn feed(&self, user: &User) -> Result<NotificationFeed, NotificationError> {
        let mut names: HashMap<String, (String, String)> = HashMap::new();

        let mut engagements = Vec::new();
        for n in self
            .store
            .unseen_notifications_for(&user.user_id)
            .await?
        {
            let (first, last) = self.actor_name(&mut names, &n.notifier_id).await?;
            engagements.push(EngagementFeedItem {
                notification_id: n.notification_id,
                image_id: n.image_id,
                album_id: n.album_id,
                notifier_id: n.notifier_id,
                notifier_first: first,
                notifier_last: last,
                kind: n.kind,
                seen: n.seen,
                received_at: n.received_at,
            });
        }

        let mut friend_requests = Vec::new();
        for r in self
            .store
            .pending_friend_requests_for(&user.user_id)
            .await?
        {
            friend_requests.push(self.friend_item(&mut names, r, true).await?);
        }

        let mut friend_responses = Vec::new();
        for r in self.store.friend_responses_for(&user.user_id).await? {
            friend_responses.push(self.friend_item(&mut names, r, false).await?);
        }

        let mut album_invites = Vec::new();
        for r in self
            .store
            .pending_album_requests_for(&user.user_id)
            .await?
        {
            album_invites.push(self.album_item(&mut names, r, true).await?);
        }

        let mut album_responses = Vec::new();
        for r in self
            .store
            .unseen_album_responses_for(&user.user_id)
            .await?
        {
            album_responses.push(self.album_item(&mut names, r, false).await?);
        }

        Ok(NotificationFeed {
            engagements,
            friend_requests,
            friend_responses,
            album_invites,
            album_responses,
        })
    }

    pub async fn mark_seen(
        &self,
        notification_id: &str,
        receiver: &User,
    ) -> Result<(), NotificationError> {
        let updated = self
            .store
            .mark_notification_seen(notification_id, &receiver.user_id)
            .await?;
        if updated == 0 {
            return Err(NotificationError::NotFound);
        }
        Ok(())
    }

    /// For an incoming request the actor is the other side; for a response
    /// the actor is whoever answered.
    async fn friend_item(
        &self,
        names: &mut HashMap<String, (String, String)>,
        r: friend_requests::Model,
        incoming: bool,
    ) -> Result<RequestFeedItem, NotificationError> {
        let actor_id = if incoming {
            r.sender_id.clone()
        } else {
            r.receiver_id.clone()
        };
        let (first, last) = self.actor_name(names, &actor_id).await?;
        Ok(RequestFeedItem {
            request_id: r.request_id,
            actor_id,
            actor_first: first,
            actor_last: last,
            status: r.status,
            seen: r.seen,
            created_at: r.created_at,
            album_id: None,
            album_name: None,
        })
    }

    async fn album_item(
        &self,
        names: &mut HashMap<String, (String, String)>,
        r: album_requests::Model,
        incoming: bool,
    ) -> Result<RequestFeedItem, NotificationError> {
        let actor_id = if incoming {
            r.inviter_id.clone()
        } else {
            r.invited_id.clone()
        };
        let (first, last) = self.actor_name(names, &actor_id).await?;
        let album_name = self
            .store
            .get_album(&r.album_id)
            .await?
            .map(|a| a.name);
        Ok(RequestFeedItem {
            request_id: r.request_id,
            actor_id,
            actor_first: first,
            actor_last: last,
            status: r.status,
            seen: if incoming { r.invite_seen } else { r.response_seen },
            created_at: r.created_at,
            album_id: Some(r.album_id),
            album_name,
        })
    }

    async fn actor_name(
        &self,
        names: &mut HashMap<String, (String, String)>,
        user_id: &str,
    ) -> Result<(String, String), NotificationError> {
        if let Some(name) = names.get(user_id) {
            return Ok(name.clone());
        }
        let name = self
            .store
            .get_user(user_id)
            .await?
            .map_or_else(Default::default, |u| (u.first_name, u.last_name));
        names.insert(user_id.to_string(), name.clone());
        Ok(name)
    }
}
