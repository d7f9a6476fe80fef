use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::current_user;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::services::notifications::NotificationFeed;

/// GET /notifications — the cold-start tray, fetched before live events.
pub async fn get_feed(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<NotificationFeed>>, ApiError> {
    let user = current_user(&state, &session).await?;

    let feed = state.shared.notifications.feed(&user).await?;

    Ok(Json(ApiResponse::success(feed)))
}

/// PATCH /notifications/{id}/seen
pub async fn mark_seen(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(notification_id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let user = current_user(&state, &session).await?;

    state
        .shared
        .notifications
        .mark_seen(&notification_id, &user)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Notification marked seen".to_string(),
    })))
}
