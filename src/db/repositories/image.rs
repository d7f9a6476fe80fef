use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{albums, images};

/// Routing metadata for one image: who owns it and which album it lives in.
/// This is the narrow read contract the notification generator depends on.
#[derive(Debug, Clone)]
pub struct ImageContext {
    pub image_id: String,
    pub owner_id: String,
    pub album_id: String,
    pub album_name: String,
}

pub struct ImageRepository {
    conn: DatabaseConnection,
}

impl ImageRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        album_id: &str,
        owner_id: &str,
        file_name: &str,
        caption: Option<&str>,
    ) -> Result<images::Model> {
        let model = images::ActiveModel {
            image_id: Set(uuid::Uuid::new_v4().to_string()),
            album_id: Set(album_id.to_string()),
            owner_id: Set(owner_id.to_string()),
            file_name: Set(file_name.to_string()),
            caption: Set(caption.map(str::to_string)),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        model
            .insert(&self.conn)
            .await
            .context("Failed to insert image")
    }

    pub async fn get_context(&self, image_id: &str) -> Result<Option<ImageContext>> {
        let Some(image) = images::Entity::find_by_id(image_id)
            .one(&self.conn)
            .await
            .context("Failed to query image")?
        else {
            return Ok(None);
        };

        let album = albums::Entity::find_by_id(&image.album_id)
            .one(&self.conn)
            .await
            .context("Failed to query album for image")?;

        let album_name = album.map(|a| a.name).unwrap_or_default();

        Ok(Some(ImageContext {
            image_id: image.image_id,
            owner_id: image.owner_id,
            album_id: image.album_id,
            album_name,
        }))
    }

    pub async fn list_for_album(&self, album_id: &str) -> Result<Vec<images::Model>> {
        images::Entity::find()
            .filter(images::Column::AlbumId.eq(album_id))
            .order_by_desc(images::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list album images")
    }
}
