use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::current_user;
use super::{AddCommentRequest, ApiError, ApiResponse, AppState, CommentDto, CountResponse};
use crate::domain::EngagementKind;

/// POST /images/{id}/likes and /images/{id}/upvotes
pub async fn add_like(
    state: State<Arc<AppState>>,
    session: Session,
    path: Path<String>,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    add_engagement(state, session, path, EngagementKind::Like).await
}

pub async fn add_upvote(
    state: State<Arc<AppState>>,
    session: Session,
    path: Path<String>,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    add_engagement(state, session, path, EngagementKind::Upvote).await
}

/// DELETE /images/{id}/likes and /images/{id}/upvotes
pub async fn remove_like(
    state: State<Arc<AppState>>,
    session: Session,
    path: Path<String>,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    remove_engagement(state, session, path, EngagementKind::Like).await
}

pub async fn remove_upvote(
    state: State<Arc<AppState>>,
    session: Session,
    path: Path<String>,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    remove_engagement(state, session, path, EngagementKind::Upvote).await
}

async fn add_engagement(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(image_id): Path<String>,
    kind: EngagementKind,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let actor = current_user(&state, &session).await?;

    let count = state
        .shared
        .engagements
        .add_engagement(&image_id, &actor, kind)
        .await?;

    Ok(Json(ApiResponse::success(CountResponse { count })))
}

async fn remove_engagement(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(image_id): Path<String>,
    kind: EngagementKind,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let actor = current_user(&state, &session).await?;

    let count = state
        .shared
        .engagements
        .remove_engagement(&image_id, &actor, kind)
        .await?;

    Ok(Json(ApiResponse::success(CountResponse { count })))
}

/// POST /images/{id}/comments
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(image_id): Path<String>,
    Json(payload): Json<AddCommentRequest>,
) -> Result<Json<ApiResponse<CommentDto>>, ApiError> {
    if payload.body.trim().is_empty() {
        return Err(ApiError::validation("Comment body is required"));
    }

    let actor = current_user(&state, &session).await?;

    let comment = state
        .shared
        .engagements
        .add_comment(&image_id, &actor, &payload.body)
        .await?;

    Ok(Json(ApiResponse::success(CommentDto::from(comment))))
}

/// GET /images/{id}/comments
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(image_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<CommentDto>>>, ApiError> {
    let comments = state
        .store()
        .list_comments(&image_id)
        .await?
        .into_iter()
        .map(CommentDto::from)
        .collect();

    Ok(Json(ApiResponse::success(comments)))
}
