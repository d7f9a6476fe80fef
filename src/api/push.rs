use axum::{Json, extract::State};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::current_user;
use super::{ApiError, ApiResponse, AppState, MessageResponse, PushTokenRequest};

/// PUT /push/token — register or refresh this device's push token.
pub async fn put_token(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<PushTokenRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if payload.device_id.trim().is_empty() || payload.token.trim().is_empty() {
        return Err(ApiError::validation("device_id and token are required"));
    }

    let user = current_user(&state, &session).await?;

    state
        .store()
        .upsert_push_token(&user.user_id, &payload.device_id, &payload.token)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Push token registered".to_string(),
    })))
}
