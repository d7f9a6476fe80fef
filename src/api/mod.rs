use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, patch, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::state::SharedState;

mod albums;
pub mod auth;
mod engagements;
mod error;
mod friends;
mod notifications;
mod observability;
mod push;
mod types;
mod users;
mod ws;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }
}

pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let server_config = &state.shared.config.server;
    let cors_origins = server_config.cors_allowed_origins.clone();

    let protected_routes = create_protected_router();

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(server_config.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            server_config.session_expiry_minutes,
        )));

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/users/register", post(users::register))
        .route("/health", get(observability::health))
        .layer(session_layer)
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::get_current_user))
        .route("/albums", post(albums::create_album))
        .route("/albums/{id}", get(albums::get_album))
        .route("/albums/{id}/images", post(albums::add_image))
        .route("/albums/{id}/images", get(albums::list_images))
        .route("/albums/{id}/invites", post(albums::invite))
        .route("/invites/{id}/accept", post(albums::accept_invite))
        .route("/invites/{id}/deny", post(albums::deny_invite))
        .route("/invites/{id}/seen", patch(albums::mark_invite_seen))
        .route(
            "/invites/{id}/response-seen",
            patch(albums::mark_response_seen),
        )
        .route("/images/{id}/likes", post(engagements::add_like))
        .route("/images/{id}/likes", delete(engagements::remove_like))
        .route("/images/{id}/upvotes", post(engagements::add_upvote))
        .route("/images/{id}/upvotes", delete(engagements::remove_upvote))
        .route("/images/{id}/comments", post(engagements::add_comment))
        .route("/images/{id}/comments", get(engagements::list_comments))
        .route("/friends/requests", post(friends::send_request))
        .route("/friends/requests/{id}/accept", post(friends::accept_request))
        .route("/friends/requests/{id}/deny", post(friends::deny_request))
        .route("/friends/requests/{id}/seen", patch(friends::mark_seen))
        .route("/notifications", get(notifications::get_feed))
        .route("/notifications/{id}/seen", patch(notifications::mark_seen))
        .route("/push/token", put(push::put_token))
        .route("/ws", get(ws::upgrade))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn(auth::auth_middleware))
}
