use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::RequestStatus;
use crate::entities::{friend_requests, friendships};

pub struct FriendRepository {
    conn: DatabaseConnection,
}

impl FriendRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert_request(
        &self,
        sender_id: &str,
        receiver_id: &str,
    ) -> Result<friend_requests::Model> {
        let model = friend_requests::ActiveModel {
            request_id: Set(uuid::Uuid::new_v4().to_string()),
            sender_id: Set(sender_id.to_string()),
            receiver_id: Set(receiver_id.to_string()),
            status: Set(RequestStatus::Pending.as_str().to_string()),
            seen: Set(false),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            responded_at: Set(None),
        };

        model
            .insert(&self.conn)
            .await
            .context("Failed to insert friend request")
    }

    pub async fn get_request(&self, request_id: &str) -> Result<Option<friend_requests::Model>> {
        friend_requests::Entity::find_by_id(request_id)
            .one(&self.conn)
            .await
            .context("Failed to query friend request")
    }

    /// Same guarded single-shot transition as album requests.
    pub async fn transition_request(&self, request_id: &str, to: RequestStatus) -> Result<u64> {
        let result = friend_requests::Entity::update_many()
            .col_expr(friend_requests::Column::Status, Expr::value(to.as_str()))
            .col_expr(
                friend_requests::Column::RespondedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(friend_requests::Column::RequestId.eq(request_id))
            .filter(friend_requests::Column::Status.eq(RequestStatus::Pending.as_str()))
            .exec(&self.conn)
            .await
            .context("Failed to transition friend request")?;

        Ok(result.rows_affected)
    }

    pub async fn add_friendship(&self, user_id: &str, friend_id: &str) -> Result<()> {
        let model = friendships::ActiveModel {
            user_id: Set(user_id.to_string()),
            friend_id: Set(friend_id.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        model
            .insert(&self.conn)
            .await
            .context("Failed to insert friendship")?;

        Ok(())
    }

    pub async fn mark_seen(&self, request_id: &str, receiver_id: &str) -> Result<u64> {
        let result = friend_requests::Entity::update_many()
            .col_expr(friend_requests::Column::Seen, Expr::value(true))
            .filter(friend_requests::Column::RequestId.eq(request_id))
            .filter(friend_requests::Column::ReceiverId.eq(receiver_id))
            .exec(&self.conn)
            .await
            .context("Failed to mark friend request seen")?;

        Ok(result.rows_affected)
    }

    pub async fn pending_for(&self, receiver_id: &str) -> Result<Vec<friend_requests::Model>> {
        friend_requests::Entity::find()
            .filter(friend_requests::Column::ReceiverId.eq(receiver_id))
            .filter(friend_requests::Column::Status.eq(RequestStatus::Pending.as_str()))
            .order_by_desc(friend_requests::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list pending friend requests")
    }

    /// Requests this user sent that were answered.
    pub async fn responses_for(&self, sender_id: &str) -> Result<Vec<friend_requests::Model>> {
        friend_requests::Entity::find()
            .filter(friend_requests::Column::SenderId.eq(sender_id))
            .filter(friend_requests::Column::Status.ne(RequestStatus::Pending.as_str()))
            .order_by_desc(friend_requests::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list friend request responses")
    }
}
