//! Smoke tests for the HTTP surface: registration, session auth, and the
//! engagement endpoints driven end to end through the router.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use fotohub::api::AppState;
use fotohub::config::Config;
use http_body_util::BodyExt;
use tower::ServiceExt;

async fn spawn_app() -> (Arc<AppState>, Router) {
    let db_path =
        std::env::temp_dir().join(format!("fotohub-smoke-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.observability.metrics_enabled = false;
    config.server.secure_cookies = false;

    let state = fotohub::api::create_app_state_from_config(config, None)
        .await
        .expect("failed to create app state");

    let router = fotohub::api::router(state.clone());
    (state, router)
}

async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be json")
}

async fn post_json(
    app: &Router,
    uri: &str,
    cookie: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

async fn register(app: &Router, username: &str, first: &str, last: &str) {
    let response = post_json(
        app,
        "/api/users/register",
        None,
        serde_json::json!({
            "username": username,
            "password": "hunter2hunter2",
            "first_name": first,
            "last_name": last,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

/// Logs in and returns the session cookie to echo back on later requests.
async fn login(app: &Router, username: &str) -> String {
    let response = post_json(
        app,
        "/api/auth/login",
        None,
        serde_json::json!({ "username": username, "password": "hunter2hunter2" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login should set a session cookie")
        .to_str()
        .expect("cookie should be ascii");
    set_cookie
        .split(';')
        .next()
        .expect("cookie value")
        .to_string()
}

#[tokio::test]
async fn registration_and_session_flow() {
    let (_, app) = spawn_app().await;

    register(&app, "ada", "Ada", "Lovelace").await;

    // Duplicate usernames are a conflict, not a silent overwrite.
    let duplicate = post_json(
        &app,
        "/api/users/register",
        None,
        serde_json::json!({
            "username": "ada",
            "password": "hunter2hunter2",
            "first_name": "Ada",
            "last_name": "Lovelace",
        }),
    )
    .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let bad_login = post_json(
        &app,
        "/api/auth/login",
        None,
        serde_json::json!({ "username": "ada", "password": "wrong-password" }),
    )
    .await;
    assert_eq!(bad_login.status(), StatusCode::UNAUTHORIZED);

    let cookie = login(&app, "ada").await;

    let me = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
    let body = json_body(me).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["username"], "ada");

    // No session, no access.
    let anonymous = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn engagement_endpoints_round_trip() {
    let (_, app) = spawn_app().await;

    register(&app, "ada", "Ada", "Lovelace").await;
    register(&app, "grace", "Grace", "Hopper").await;
    let owner_cookie = login(&app, "ada").await;
    let actor_cookie = login(&app, "grace").await;

    let album = post_json(
        &app,
        "/api/albums",
        Some(&owner_cookie),
        serde_json::json!({ "name": "Summer Trip" }),
    )
    .await;
    assert_eq!(album.status(), StatusCode::OK);
    let album_id = json_body(album).await["data"]["album_id"]
        .as_str()
        .expect("album_id")
        .to_string();

    let image = post_json(
        &app,
        &format!("/api/albums/{album_id}/images"),
        Some(&owner_cookie),
        serde_json::json!({ "file_name": "beach.jpg", "caption": "low tide" }),
    )
    .await;
    assert_eq!(image.status(), StatusCode::OK);
    let image_body = json_body(image).await;
    assert_eq!(image_body["data"]["caption"], "low tide");
    let image_id = image_body["data"]["image_id"]
        .as_str()
        .expect("image_id")
        .to_string();

    let like = post_json(
        &app,
        &format!("/api/images/{image_id}/likes"),
        Some(&actor_cookie),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(like.status(), StatusCode::OK);
    assert_eq!(json_body(like).await["data"]["count"], 1);

    // Liking the same image twice is a conflict, not a server error.
    let like_again = post_json(
        &app,
        &format!("/api/images/{image_id}/likes"),
        Some(&actor_cookie),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(like_again.status(), StatusCode::CONFLICT);

    let unlike = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/images/{image_id}/likes"))
                .header(header::COOKIE, &actor_cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(unlike.status(), StatusCode::OK);
    assert_eq!(json_body(unlike).await["data"]["count"], 0);

    // Withdrawing twice means client and server state diverged.
    let unlike_again = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/images/{image_id}/likes"))
                .header(header::COOKIE, &actor_cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(unlike_again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_database_round_trip() {
    let (_, app) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], "ok");
    assert!(body["data"]["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn notification_feed_requires_a_session() {
    let (_, app) = spawn_app().await;

    register(&app, "ada", "Ada", "Lovelace").await;
    let cookie = login(&app, "ada").await;

    let anonymous = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/notifications")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let feed = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/notifications")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(feed.status(), StatusCode::OK);
    let body = json_body(feed).await;
    assert_eq!(body["success"], true);
    assert!(body["data"]["engagements"].is_array());
}
