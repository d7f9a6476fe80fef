use sea_orm::entity::prelude::*;

/// Users who accepted an invite to an album. The owner is not listed here.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "album_guests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub album_id: String,

    pub user_id: String,

    pub added_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
