//! Likes, upvotes and comments, plus the notification fan-out they trigger.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::broker::Broker;
use crate::db::{Store, User};
use crate::domain::EngagementKind;
use crate::domain::events::{
    CommentNotification, EngagementNotification, EventKind, EventRecord, GLOBAL_TOPIC, Operation,
};
use crate::entities::comments;

#[derive(Debug, Error)]
pub enum EngagementError {
    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("Engagement not found")]
    NotFound,

    #[error("Engagement already recorded")]
    AlreadyExists,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for EngagementError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for EngagementError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

pub struct EngagementService {
    store: Store,
    broker: Arc<dyn Broker>,
}

impl EngagementService {
    #[must_use]
    pub fn new(store: Store, broker: Arc<dyn Broker>) -> Self {
        Self { store, broker }
    }

    /// Records a like/upvote and fans the event out. Returns the new
    /// aggregate count for the image.
    pub async fn add_engagement(
        &self,
        image_id: &str,
        actor: &User,
        kind: EngagementKind,
    ) -> Result<i64, EngagementError> {
        let context = self
            .store
            .get_image_context(image_id)
            .await?
            .ok_or_else(|| EngagementError::ImageNotFound(image_id.to_string()))?;

        let inserted = self
            .store
            .add_engagement(image_id, &actor.user_id, kind)
            .await?;
        if inserted == 0 {
            return Err(EngagementError::AlreadyExists);
        }

        let new_count = self.store.count_engagements(image_id, kind).await?;

        // A user engaging with their own content never notifies itself; the
        // event is still published so live album views refresh their counts.
        let notification = if actor.user_id == context.owner_id {
            None
        } else {
            Some(
                self.store
                    .insert_notification(
                        image_id,
                        &context.album_id,
                        &context.owner_id,
                        &actor.user_id,
                        kind.as_str(),
                        false,
                    )
                    .await?,
            )
        };

        let payload = EngagementNotification {
            notification_id: notification.as_ref().map(|n| n.notification_id.clone()),
            image_id: image_id.to_string(),
            album_id: context.album_id.clone(),
            album_name: context.album_name.clone(),
            receiver_id: context.owner_id.clone(),
            notifier_id: actor.user_id.clone(),
            notifier_first: actor.first_name.clone(),
            notifier_last: actor.last_name.clone(),
            notification_seen: false,
            notification_type: kind.as_str().to_string(),
            new_count,
            received_at: notification.map(|n| n.received_at),
        };

        let record = EventRecord::new(
            Operation::Add,
            EventKind::from(kind),
            &context.owner_id,
            Some(context.album_id.clone()),
            &payload,
        )?;
        self.publish(&record);

        Ok(new_count)
    }

    /// Withdraws a like/upvote. Removing an engagement that was never added
    /// is an error, not a no-op: it means client and server state diverged.
    pub async fn remove_engagement(
        &self,
        image_id: &str,
        actor: &User,
        kind: EngagementKind,
    ) -> Result<i64, EngagementError> {
        let context = self
            .store
            .get_image_context(image_id)
            .await?
            .ok_or_else(|| EngagementError::ImageNotFound(image_id.to_string()))?;

        let removed = self
            .store
            .remove_engagement(image_id, &actor.user_id, kind)
            .await?;
        if removed == 0 {
            return Err(EngagementError::NotFound);
        }

        if actor.user_id != context.owner_id {
            self.store
                .delete_notification_for_engagement(image_id, &actor.user_id, kind.as_str())
                .await?;
        }

        let new_count = self.store.count_engagements(image_id, kind).await?;

        let payload = EngagementNotification {
            notification_id: None,
            image_id: image_id.to_string(),
            album_id: context.album_id.clone(),
            album_name: context.album_name.clone(),
            receiver_id: context.owner_id.clone(),
            notifier_id: actor.user_id.clone(),
            notifier_first: actor.first_name.clone(),
            notifier_last: actor.last_name.clone(),
            notification_seen: false,
            notification_type: kind.as_str().to_string(),
            new_count,
            received_at: None,
        };

        let record = EventRecord::new(
            Operation::Remove,
            EventKind::from(kind),
            &context.owner_id,
            Some(context.album_id.clone()),
            &payload,
        )?;
        self.publish(&record);

        Ok(new_count)
    }

    /// Persists a comment and notifies the image owner. A comment on one's
    /// own image still gets a notification row, pre-marked seen.
    pub async fn add_comment(
        &self,
        image_id: &str,
        actor: &User,
        body: &str,
    ) -> Result<comments::Model, EngagementError> {
        let context = self
            .store
            .get_image_context(image_id)
            .await?
            .ok_or_else(|| EngagementError::ImageNotFound(image_id.to_string()))?;

        let comment = self.store.add_comment(image_id, &actor.user_id, body).await?;

        let pre_seen = actor.user_id == context.owner_id;
        let notification = self
            .store
            .insert_notification(
                image_id,
                &context.album_id,
                &context.owner_id,
                &actor.user_id,
                "comment",
                pre_seen,
            )
            .await?;

        let payload = CommentNotification {
            comment_id: comment.comment_id.clone(),
            notification_id: Some(notification.notification_id.clone()),
            image_id: image_id.to_string(),
            album_id: context.album_id.clone(),
            album_name: context.album_name.clone(),
            receiver_id: context.owner_id.clone(),
            notifier_id: actor.user_id.clone(),
            notifier_first: actor.first_name.clone(),
            notifier_last: actor.last_name.clone(),
            body: body.to_string(),
            notification_seen: pre_seen,
            received_at: notification.received_at,
        };

        let record = EventRecord::new(
            Operation::Add,
            EventKind::Comment,
            &context.owner_id,
            Some(context.album_id.clone()),
            &payload,
        )?;
        self.publish(&record);

        Ok(comment)
    }

    /// Post-commit fan-out. The mutation already succeeded, so a broker
    /// failure here is logged and swallowed, never surfaced to the caller.
    fn publish(&self, record: &EventRecord) {
        let json = match record.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize event record: {}", e);
                return;
            }
        };

        if let Err(e) = self.broker.publish(GLOBAL_TOPIC, json.clone()) {
            warn!("Publish to global topic failed: {}", e);
        }

        if let Some(scope) = &record.scope_key {
            if let Err(e) = self.broker.publish(scope, json) {
                warn!("Publish to album topic '{}' failed: {}", scope, e);
            }
        }
    }
}
