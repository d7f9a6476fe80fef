use sea_orm::entity::prelude::*;

/// A persisted engagement notification directed at a content owner.
/// Never created when the actor is the owner.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub notification_id: String,

    pub image_id: String,

    pub album_id: String,

    pub receiver_id: String,

    pub notifier_id: String,

    /// "like", "upvote" or "comment"
    pub kind: String,

    pub seen: bool,

    pub received_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
