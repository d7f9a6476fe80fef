use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::domain::RequestStatus;
use crate::entities::{album_guests, album_requests, albums};

pub struct AlbumRepository {
    conn: DatabaseConnection,
}

impl AlbumRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, owner_id: &str, name: &str) -> Result<albums::Model> {
        let model = albums::ActiveModel {
            album_id: Set(uuid::Uuid::new_v4().to_string()),
            owner_id: Set(owner_id.to_string()),
            name: Set(name.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        model
            .insert(&self.conn)
            .await
            .context("Failed to insert album")
    }

    pub async fn get(&self, album_id: &str) -> Result<Option<albums::Model>> {
        albums::Entity::find_by_id(album_id)
            .one(&self.conn)
            .await
            .context("Failed to query album")
    }

    pub async fn insert_request(
        &self,
        album_id: &str,
        inviter_id: &str,
        invited_id: &str,
    ) -> Result<album_requests::Model> {
        let model = album_requests::ActiveModel {
            request_id: Set(uuid::Uuid::new_v4().to_string()),
            album_id: Set(album_id.to_string()),
            inviter_id: Set(inviter_id.to_string()),
            invited_id: Set(invited_id.to_string()),
            status: Set(RequestStatus::Pending.as_str().to_string()),
            invite_seen: Set(false),
            response_seen: Set(false),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            responded_at: Set(None),
        };

        model
            .insert(&self.conn)
            .await
            .context("Failed to insert album request")
    }

    pub async fn get_request(&self, request_id: &str) -> Result<Option<album_requests::Model>> {
        album_requests::Entity::find_by_id(request_id)
            .one(&self.conn)
            .await
            .context("Failed to query album request")
    }

    /// Moves a pending request to `to`. The `status = 'pending'` predicate is
    /// the concurrency guard: of two racing transitions, exactly one sees a
    /// nonzero row count.
    pub async fn transition_request(&self, request_id: &str, to: RequestStatus) -> Result<u64> {
        let result = album_requests::Entity::update_many()
            .col_expr(album_requests::Column::Status, Expr::value(to.as_str()))
            .col_expr(
                album_requests::Column::RespondedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(album_requests::Column::RequestId.eq(request_id))
            .filter(album_requests::Column::Status.eq(RequestStatus::Pending.as_str()))
            .exec(&self.conn)
            .await
            .context("Failed to transition album request")?;

        Ok(result.rows_affected)
    }

    pub async fn add_guest(&self, album_id: &str, user_id: &str) -> Result<()> {
        let model = album_guests::ActiveModel {
            album_id: Set(album_id.to_string()),
            user_id: Set(user_id.to_string()),
            added_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        model
            .insert(&self.conn)
            .await
            .context("Failed to insert album guest")?;

        Ok(())
    }

    /// Guest ids for fan-out on accept: everyone already in the album except
    /// `exclude_user` (the actor never notifies itself).
    pub async fn accepted_guests(&self, album_id: &str, exclude_user: &str) -> Result<Vec<String>> {
        let guests: Vec<String> = album_guests::Entity::find()
            .select_only()
            .column(album_guests::Column::UserId)
            .filter(album_guests::Column::AlbumId.eq(album_id))
            .filter(album_guests::Column::UserId.ne(exclude_user))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query album guests")?;

        Ok(guests)
    }

    pub async fn mark_invite_seen(&self, request_id: &str, invited_id: &str) -> Result<u64> {
        let result = album_requests::Entity::update_many()
            .col_expr(album_requests::Column::InviteSeen, Expr::value(true))
            .filter(album_requests::Column::RequestId.eq(request_id))
            .filter(album_requests::Column::InvitedId.eq(invited_id))
            .exec(&self.conn)
            .await
            .context("Failed to mark invite seen")?;

        Ok(result.rows_affected)
    }

    pub async fn mark_response_seen(&self, request_id: &str, inviter_id: &str) -> Result<u64> {
        let result = album_requests::Entity::update_many()
            .col_expr(album_requests::Column::ResponseSeen, Expr::value(true))
            .filter(album_requests::Column::RequestId.eq(request_id))
            .filter(album_requests::Column::InviterId.eq(inviter_id))
            .exec(&self.conn)
            .await
            .context("Failed to mark response seen")?;

        Ok(result.rows_affected)
    }

    pub async fn pending_requests_for(&self, invited_id: &str) -> Result<Vec<album_requests::Model>> {
        album_requests::Entity::find()
            .filter(album_requests::Column::InvitedId.eq(invited_id))
            .filter(album_requests::Column::Status.eq(RequestStatus::Pending.as_str()))
            .order_by_desc(album_requests::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list pending album requests")
    }

    /// Accept/deny responses the inviter has not acknowledged yet.
    pub async fn unseen_responses_for(&self, inviter_id: &str) -> Result<Vec<album_requests::Model>> {
        album_requests::Entity::find()
            .filter(album_requests::Column::InviterId.eq(inviter_id))
            .filter(album_requests::Column::Status.ne(RequestStatus::Pending.as_str()))
            .filter(album_requests::Column::ResponseSeen.eq(false))
            .order_by_desc(album_requests::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list album request responses")
    }
}
