use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::notifications;

pub struct NotificationRepository {
    conn: DatabaseConnection,
}

impl NotificationRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        &self,
        image_id: &str,
        album_id: &str,
        receiver_id: &str,
        notifier_id: &str,
        kind: &str,
        seen: bool,
    ) -> Result<notifications::Model> {
        let model = notifications::ActiveModel {
            notification_id: Set(uuid::Uuid::new_v4().to_string()),
            image_id: Set(image_id.to_string()),
            album_id: Set(album_id.to_string()),
            receiver_id: Set(receiver_id.to_string()),
            notifier_id: Set(notifier_id.to_string()),
            kind: Set(kind.to_string()),
            seen: Set(seen),
            received_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        model
            .insert(&self.conn)
            .await
            .context("Failed to insert notification")
    }

    /// Deletes the notification matching the (media, actor, kind) triple.
    /// Returns rows affected.
    pub async fn delete_for_engagement(
        &self,
        image_id: &str,
        notifier_id: &str,
        kind: &str,
    ) -> Result<u64> {
        let result = notifications::Entity::delete_many()
            .filter(notifications::Column::ImageId.eq(image_id))
            .filter(notifications::Column::NotifierId.eq(notifier_id))
            .filter(notifications::Column::Kind.eq(kind))
            .exec(&self.conn)
            .await
            .context("Failed to delete notification")?;

        Ok(result.rows_affected)
    }

    /// `seen` transitions false→true only through this call. Scoped to the
    /// receiver so one user cannot acknowledge another's notification.
    pub async fn mark_seen(&self, notification_id: &str, receiver_id: &str) -> Result<u64> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::Seen, Expr::value(true))
            .filter(notifications::Column::NotificationId.eq(notification_id))
            .filter(notifications::Column::ReceiverId.eq(receiver_id))
            .exec(&self.conn)
            .await
            .context("Failed to mark notification seen")?;

        Ok(result.rows_affected)
    }

    pub async fn list_for_receiver(&self, receiver_id: &str) -> Result<Vec<notifications::Model>> {
        notifications::Entity::find()
            .filter(notifications::Column::ReceiverId.eq(receiver_id))
            .filter(notifications::Column::Seen.eq(false))
            .order_by_desc(notifications::Column::ReceivedAt)
            .all(&self.conn)
            .await
            .context("Failed to list notifications")
    }
}
