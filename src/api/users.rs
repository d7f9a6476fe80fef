use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, RegisterRequest, UserDto};

/// POST /users/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    if payload.username.trim().is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::validation(
            "Password must be at least 8 characters",
        ));
    }

    if state
        .store()
        .get_user_by_username(&payload.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "Username '{}' is already taken",
            payload.username
        )));
    }

    let user = state
        .store()
        .create_user(
            &payload.username,
            &payload.password,
            &payload.first_name,
            &payload.last_name,
            &state.shared.config.security,
        )
        .await?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}
