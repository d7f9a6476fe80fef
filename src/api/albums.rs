use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::current_user;
use super::{
    AddImageRequest, AlbumDto, ApiError, ApiResponse, AppState, CreateAlbumRequest, ImageDto,
    InviteRequest, MessageResponse, RequestDto,
};

/// POST /albums
pub async fn create_album(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<CreateAlbumRequest>,
) -> Result<Json<ApiResponse<AlbumDto>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Album name is required"));
    }

    let owner = current_user(&state, &session).await?;
    let album = state.store().create_album(&owner.user_id, &payload.name).await?;

    Ok(Json(ApiResponse::success(AlbumDto::from(album))))
}

/// GET /albums/{id}
pub async fn get_album(
    State(state): State<Arc<AppState>>,
    Path(album_id): Path<String>,
) -> Result<Json<ApiResponse<AlbumDto>>, ApiError> {
    let album = state
        .store()
        .get_album(&album_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Album", &album_id))?;

    Ok(Json(ApiResponse::success(AlbumDto::from(album))))
}

/// POST /albums/{id}/images
pub async fn add_image(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(album_id): Path<String>,
    Json(payload): Json<AddImageRequest>,
) -> Result<Json<ApiResponse<ImageDto>>, ApiError> {
    if payload.file_name.trim().is_empty() {
        return Err(ApiError::validation("File name is required"));
    }

    let owner = current_user(&state, &session).await?;

    if state.store().get_album(&album_id).await?.is_none() {
        return Err(ApiError::not_found("Album", &album_id));
    }

    let image = state
        .store()
        .add_image(
            &album_id,
            &owner.user_id,
            &payload.file_name,
            payload.caption.as_deref(),
        )
        .await?;

    Ok(Json(ApiResponse::success(ImageDto::from(image))))
}

/// GET /albums/{id}/images
pub async fn list_images(
    State(state): State<Arc<AppState>>,
    Path(album_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ImageDto>>>, ApiError> {
    let images = state
        .store()
        .list_album_images(&album_id)
        .await?
        .into_iter()
        .map(ImageDto::from)
        .collect();

    Ok(Json(ApiResponse::success(images)))
}

/// POST /albums/{id}/invites
pub async fn invite(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(album_id): Path<String>,
    Json(payload): Json<InviteRequest>,
) -> Result<Json<ApiResponse<Vec<RequestDto>>>, ApiError> {
    if payload.invited_ids.is_empty() {
        return Err(ApiError::validation("At least one invitee is required"));
    }

    let inviter = current_user(&state, &session).await?;

    let requests = state
        .shared
        .invites
        .send_album_invites(&album_id, &inviter, &payload.invited_ids)
        .await?;

    let dtos = requests
        .into_iter()
        .map(|r| RequestDto {
            request_id: r.request_id,
            status: r.status,
            created_at: r.created_at,
        })
        .collect();

    Ok(Json(ApiResponse::success(dtos)))
}

/// POST /invites/{id}/accept
pub async fn accept_invite(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(request_id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let actor = current_user(&state, &session).await?;

    state
        .shared
        .invites
        .accept_album_invite(&request_id, &actor)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Invite accepted".to_string(),
    })))
}

/// POST /invites/{id}/deny
pub async fn deny_invite(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(request_id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let actor = current_user(&state, &session).await?;

    state
        .shared
        .invites
        .deny_album_invite(&request_id, &actor)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Invite denied".to_string(),
    })))
}

/// PATCH /invites/{id}/seen — the invitee acknowledges the invite.
pub async fn mark_invite_seen(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(request_id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let user = current_user(&state, &session).await?;

    state
        .shared
        .invites
        .mark_album_invite_seen(&request_id, &user)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Invite marked seen".to_string(),
    })))
}

/// PATCH /invites/{id}/response-seen — the inviter acknowledges the answer.
pub async fn mark_response_seen(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(request_id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let user = current_user(&state, &session).await?;

    state
        .shared
        .invites
        .mark_album_response_seen(&request_id, &user)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Response marked seen".to_string(),
    })))
}
