use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::{EngagementKind, RequestStatus};
use crate::entities::{album_requests, albums, comments, friend_requests, notifications};

pub mod migrator;
pub mod repositories;

pub use repositories::image::ImageContext;
pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn album_repo(&self) -> repositories::album::AlbumRepository {
        repositories::album::AlbumRepository::new(self.conn.clone())
    }

    fn image_repo(&self) -> repositories::image::ImageRepository {
        repositories::image::ImageRepository::new(self.conn.clone())
    }

    fn engagement_repo(&self) -> repositories::engagement::EngagementRepository {
        repositories::engagement::EngagementRepository::new(self.conn.clone())
    }

    fn notification_repo(&self) -> repositories::notification::NotificationRepository {
        repositories::notification::NotificationRepository::new(self.conn.clone())
    }

    fn friend_repo(&self) -> repositories::friend::FriendRepository {
        repositories::friend::FriendRepository::new(self.conn.clone())
    }

    fn push_token_repo(&self) -> repositories::push_token::PushTokenRepository {
        repositories::push_token::PushTokenRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        security: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo()
            .create(username, password, first_name, last_name, security)
            .await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        self.user_repo().get_by_id(user_id).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    // ========== Albums ==========

    pub async fn create_album(&self, owner_id: &str, name: &str) -> Result<albums::Model> {
        self.album_repo().create(owner_id, name).await
    }

    pub async fn get_album(&self, album_id: &str) -> Result<Option<albums::Model>> {
        self.album_repo().get(album_id).await
    }

    pub async fn insert_album_request(
        &self,
        album_id: &str,
        inviter_id: &str,
        invited_id: &str,
    ) -> Result<album_requests::Model> {
        self.album_repo()
            .insert_request(album_id, inviter_id, invited_id)
            .await
    }

    pub async fn get_album_request(
        &self,
        request_id: &str,
    ) -> Result<Option<album_requests::Model>> {
        self.album_repo().get_request(request_id).await
    }

    pub async fn transition_album_request(
        &self,
        request_id: &str,
        to: RequestStatus,
    ) -> Result<u64> {
        self.album_repo().transition_request(request_id, to).await
    }

    pub async fn add_album_guest(&self, album_id: &str, user_id: &str) -> Result<()> {
        self.album_repo().add_guest(album_id, user_id).await
    }

    pub async fn album_guests_excluding(
        &self,
        album_id: &str,
        exclude_user: &str,
    ) -> Result<Vec<String>> {
        self.album_repo()
            .accepted_guests(album_id, exclude_user)
            .await
    }

    pub async fn mark_album_invite_seen(&self, request_id: &str, invited_id: &str) -> Result<u64> {
        self.album_repo()
            .mark_invite_seen(request_id, invited_id)
            .await
    }

    pub async fn mark_album_response_seen(
        &self,
        request_id: &str,
        inviter_id: &str,
    ) -> Result<u64> {
        self.album_repo()
            .mark_response_seen(request_id, inviter_id)
            .await
    }

    pub async fn pending_album_requests_for(
        &self,
        invited_id: &str,
    ) -> Result<Vec<album_requests::Model>> {
        self.album_repo().pending_requests_for(invited_id).await
    }

    pub async fn unseen_album_responses_for(
        &self,
        inviter_id: &str,
    ) -> Result<Vec<album_requests::Model>> {
        self.album_repo().unseen_responses_for(inviter_id).await
    }

    // ========== Images ==========

    pub async fn add_image(
        &self,
        album_id: &str,
        owner_id: &str,
        file_name: &str,
        caption: Option<&str>,
    ) -> Result<crate::entities::images::Model> {
        self.image_repo()
            .create(album_id, owner_id, file_name, caption)
            .await
    }

    pub async fn get_image_context(&self, image_id: &str) -> Result<Option<ImageContext>> {
        self.image_repo().get_context(image_id).await
    }

    pub async fn list_album_images(
        &self,
        album_id: &str,
    ) -> Result<Vec<crate::entities::images::Model>> {
        self.image_repo().list_for_album(album_id).await
    }

    // ========== Engagements & comments ==========

    pub async fn add_engagement(
        &self,
        image_id: &str,
        user_id: &str,
        kind: EngagementKind,
    ) -> Result<u64> {
        self.engagement_repo().add(image_id, user_id, kind).await
    }

    pub async fn remove_engagement(
        &self,
        image_id: &str,
        user_id: &str,
        kind: EngagementKind,
    ) -> Result<u64> {
        self.engagement_repo().remove(image_id, user_id, kind).await
    }

    pub async fn count_engagements(&self, image_id: &str, kind: EngagementKind) -> Result<i64> {
        self.engagement_repo().count(image_id, kind).await
    }

    pub async fn add_comment(
        &self,
        image_id: &str,
        user_id: &str,
        body: &str,
    ) -> Result<comments::Model> {
        self.engagement_repo()
            .add_comment(image_id, user_id, body)
            .await
    }

    pub async fn list_comments(&self, image_id: &str) -> Result<Vec<comments::Model>> {
        self.engagement_repo().list_comments(image_id).await
    }

    // ========== Notifications ==========

    pub async fn insert_notification(
        &self,
        image_id: &str,
        album_id: &str,
        receiver_id: &str,
        notifier_id: &str,
        kind: &str,
        seen: bool,
    ) -> Result<notifications::Model> {
        self.notification_repo()
            .insert(image_id, album_id, receiver_id, notifier_id, kind, seen)
            .await
    }

    pub async fn delete_notification_for_engagement(
        &self,
        image_id: &str,
        notifier_id: &str,
        kind: &str,
    ) -> Result<u64> {
        self.notification_repo()
            .delete_for_engagement(image_id, notifier_id, kind)
            .await
    }

    pub async fn mark_notification_seen(
        &self,
        notification_id: &str,
        receiver_id: &str,
    ) -> Result<u64> {
        self.notification_repo()
            .mark_seen(notification_id, receiver_id)
            .await
    }

    pub async fn unseen_notifications_for(
        &self,
        receiver_id: &str,
    ) -> Result<Vec<notifications::Model>> {
        self.notification_repo().list_for_receiver(receiver_id).await
    }

    // ========== Friends ==========

    pub async fn insert_friend_request(
        &self,
        sender_id: &str,
        receiver_id: &str,
    ) -> Result<friend_requests::Model> {
        self.friend_repo()
            .insert_request(sender_id, receiver_id)
            .await
    }

    pub async fn get_friend_request(
        &self,
        request_id: &str,
    ) -> Result<Option<friend_requests::Model>> {
        self.friend_repo().get_request(request_id).await
    }

    pub async fn transition_friend_request(
        &self,
        request_id: &str,
        to: RequestStatus,
    ) -> Result<u64> {
        self.friend_repo().transition_request(request_id, to).await
    }

    pub async fn add_friendship(&self, user_id: &str, friend_id: &str) -> Result<()> {
        self.friend_repo().add_friendship(user_id, friend_id).await
    }

    pub async fn mark_friend_request_seen(
        &self,
        request_id: &str,
        receiver_id: &str,
    ) -> Result<u64> {
        self.friend_repo().mark_seen(request_id, receiver_id).await
    }

    pub async fn pending_friend_requests_for(
        &self,
        receiver_id: &str,
    ) -> Result<Vec<friend_requests::Model>> {
        self.friend_repo().pending_for(receiver_id).await
    }

    pub async fn friend_responses_for(
        &self,
        sender_id: &str,
    ) -> Result<Vec<friend_requests::Model>> {
        self.friend_repo().responses_for(sender_id).await
    }

    // ========== Push tokens ==========

    pub async fn upsert_push_token(
        &self,
        user_id: &str,
        device_id: &str,
        token: &str,
    ) -> Result<()> {
        self.push_token_repo()
            .upsert(user_id, device_id, token)
            .await
    }

    pub async fn push_tokens_for(&self, user_id: &str) -> Result<Vec<String>> {
        self.push_token_repo().tokens_for(user_id).await
    }
}
