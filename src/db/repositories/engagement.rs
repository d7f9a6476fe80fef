use anyhow::{Context, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::domain::EngagementKind;
use crate::entities::{comments, engagements};

pub struct EngagementRepository {
    conn: DatabaseConnection,
}

impl EngagementRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts the engagement row unless the (image, user, kind) triple
    /// already exists. Returns the number of rows inserted so callers can
    /// distinguish a fresh engagement from a repeat.
    pub async fn add(&self, image_id: &str, user_id: &str, kind: EngagementKind) -> Result<u64> {
        let model = engagements::ActiveModel {
            image_id: Set(image_id.to_string()),
            user_id: Set(user_id.to_string()),
            kind: Set(kind.as_str().to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let inserted = engagements::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    engagements::Column::ImageId,
                    engagements::Column::UserId,
                    engagements::Column::Kind,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to insert engagement")?;

        Ok(inserted)
    }

    /// Deletes the actor's engagement row. Returns the number of rows
    /// removed so callers can distinguish "was never there" from success.
    pub async fn remove(
        &self,
        image_id: &str,
        user_id: &str,
        kind: EngagementKind,
    ) -> Result<u64> {
        let result = engagements::Entity::delete_many()
            .filter(engagements::Column::ImageId.eq(image_id))
            .filter(engagements::Column::UserId.eq(user_id))
            .filter(engagements::Column::Kind.eq(kind.as_str()))
            .exec(&self.conn)
            .await
            .context("Failed to delete engagement")?;

        Ok(result.rows_affected)
    }

    /// Authoritative count, recomputed by direct query.
    pub async fn count(&self, image_id: &str, kind: EngagementKind) -> Result<i64> {
        let count = engagements::Entity::find()
            .filter(engagements::Column::ImageId.eq(image_id))
            .filter(engagements::Column::Kind.eq(kind.as_str()))
            .count(&self.conn)
            .await
            .context("Failed to count engagements")?;

        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    pub async fn add_comment(
        &self,
        image_id: &str,
        user_id: &str,
        body: &str,
    ) -> Result<comments::Model> {
        let model = comments::ActiveModel {
            comment_id: Set(uuid::Uuid::new_v4().to_string()),
            image_id: Set(image_id.to_string()),
            user_id: Set(user_id.to_string()),
            body: Set(body.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        model
            .insert(&self.conn)
            .await
            .context("Failed to insert comment")
    }

    pub async fn list_comments(&self, image_id: &str) -> Result<Vec<comments::Model>> {
        comments::Entity::find()
            .filter(comments::Column::ImageId.eq(image_id))
            .order_by_asc(comments::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list comments")
    }
}
