use sea_orm::entity::prelude::*;

/// One like or upvote on an image. Uniqueness of (image, user, kind) is
/// enforced by an index created in the initial migration.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "engagements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub image_id: String,

    pub user_id: String,

    /// "like" or "upvote"
    pub kind: String,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
