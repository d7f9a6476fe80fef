use axum::{
    extract::{Query, State, WebSocketUpgrade},
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, AppState};

#[derive(Deserialize)]
pub struct WsQuery {
    /// Album id selecting the album-scoped live stream instead of the
    /// private notification stream.
    #[serde(default)]
    pub channel: Option<String>,
}

/// GET /ws — upgrade an authenticated session to a live event stream.
pub async fn upgrade(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(params): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let username = session
        .get::<String>("user")
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    // Identity must resolve before the upgrade is served; an unknown
    // subject never gets a connection.
    let identity = state.shared.gateway.resolve_identity(&username).await?;

    let gateway = state.shared.gateway.clone();
    let channel = params.channel;

    Ok(ws.on_upgrade(move |socket| async move {
        gateway.open(socket, &identity, channel);
    }))
}
