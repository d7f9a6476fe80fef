use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::current_user;
use super::{ApiError, ApiResponse, AppState, FriendRequestBody, MessageResponse, RequestDto};

/// POST /friends/requests
pub async fn send_request(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<FriendRequestBody>,
) -> Result<Json<ApiResponse<RequestDto>>, ApiError> {
    let sender = current_user(&state, &session).await?;

    let request = state
        .shared
        .invites
        .send_friend_request(&sender, &payload.receiver_id)
        .await?;

    Ok(Json(ApiResponse::success(RequestDto {
        request_id: request.request_id,
        status: request.status,
        created_at: request.created_at,
    })))
}

/// POST /friends/requests/{id}/accept
pub async fn accept_request(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(request_id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let actor = current_user(&state, &session).await?;

    state
        .shared
        .invites
        .accept_friend_request(&request_id, &actor)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Friend request accepted".to_string(),
    })))
}

/// POST /friends/requests/{id}/deny
pub async fn deny_request(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(request_id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let actor = current_user(&state, &session).await?;

    state
        .shared
        .invites
        .deny_friend_request(&request_id, &actor)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Friend request denied".to_string(),
    })))
}

/// PATCH /friends/requests/{id}/seen
pub async fn mark_seen(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(request_id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let user = current_user(&state, &session).await?;

    state
        .shared
        .invites
        .mark_friend_request_seen(&request_id, &user)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Friend request marked seen".to_string(),
    })))
}
