use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
};

use crate::entities::push_tokens;

pub struct PushTokenRepository {
    conn: DatabaseConnection,
}

impl PushTokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Upsert keyed on (user, device): a device re-registering replaces its
    /// previous token.
    pub async fn upsert(&self, user_id: &str, device_id: &str, token: &str) -> Result<()> {
        let updated = push_tokens::Entity::update_many()
            .col_expr(push_tokens::Column::Token, Expr::value(token))
            .col_expr(
                push_tokens::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(push_tokens::Column::UserId.eq(user_id))
            .filter(push_tokens::Column::DeviceId.eq(device_id))
            .exec(&self.conn)
            .await
            .context("Failed to update push token")?;

        if updated.rows_affected > 0 {
            return Ok(());
        }

        let model = push_tokens::ActiveModel {
            user_id: Set(user_id.to_string()),
            device_id: Set(device_id.to_string()),
            token: Set(token.to_string()),
            updated_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        model
            .insert(&self.conn)
            .await
            .context("Failed to insert push token")?;

        Ok(())
    }

    pub async fn tokens_for(&self, user_id: &str) -> Result<Vec<String>> {
        let tokens: Vec<String> = push_tokens::Entity::find()
            .select_only()
            .column(push_tokens::Column::Token)
            .filter(push_tokens::Column::UserId.eq(user_id))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query push tokens")?;

        Ok(tokens)
    }
}
