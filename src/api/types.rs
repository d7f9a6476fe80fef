use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub user_id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: String,
}

impl From<crate::db::User> for UserDto {
    fn from(user: crate::db::User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AlbumDto {
    pub album_id: String,
    pub owner_id: String,
    pub name: String,
    pub created_at: String,
}

impl From<crate::entities::albums::Model> for AlbumDto {
    fn from(album: crate::entities::albums::Model) -> Self {
        Self {
            album_id: album.album_id,
            owner_id: album.owner_id,
            name: album.name,
            created_at: album.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImageDto {
    pub image_id: String,
    pub album_id: String,
    pub owner_id: String,
    pub file_name: String,
    pub caption: Option<String>,
    pub created_at: String,
}

impl From<crate::entities::images::Model> for ImageDto {
    fn from(image: crate::entities::images::Model) -> Self {
        Self {
            image_id: image.image_id,
            album_id: image.album_id,
            owner_id: image.owner_id,
            file_name: image.file_name,
            caption: image.caption,
            created_at: image.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentDto {
    pub comment_id: String,
    pub image_id: String,
    pub user_id: String,
    pub body: String,
    pub created_at: String,
}

impl From<crate::entities::comments::Model> for CommentDto {
    fn from(comment: crate::entities::comments::Model) -> Self {
        Self {
            comment_id: comment.comment_id,
            image_id: comment.image_id,
            user_id: comment.user_id,
            body: comment.body,
            created_at: comment.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RequestDto {
    pub request_id: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateAlbumRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddImageRequest {
    pub file_name: String,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub invited_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct FriendRequestBody {
    pub receiver_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
pub struct PushTokenRequest {
    pub device_id: String,
    pub token: String,
}
