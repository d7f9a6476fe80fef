use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "album_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub request_id: String,

    pub album_id: String,

    pub inviter_id: String,

    pub invited_id: String,

    /// "pending", "accepted" or "denied". Transitions are guarded in SQL.
    pub status: String,

    /// Read-state on the invitee's side.
    pub invite_seen: bool,

    /// Read-state of the accept/deny response on the inviter's side.
    pub response_seen: bool,

    pub created_at: String,

    pub responded_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
