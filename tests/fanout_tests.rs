//! Delivery-side behavior: session filters applied to real published events,
//! identity resolution at upgrade time, and subscription lifecycle.

use std::sync::Arc;
use std::time::Duration;

use fotohub::api::AppState;
use fotohub::broker::Subscription;
use fotohub::config::Config;
use fotohub::db::User;
use fotohub::domain::EngagementKind;
use fotohub::domain::events::EventRecord;
use fotohub::realtime::GatewayError;
use fotohub::realtime::relay::SessionFilter;

async fn spawn_app() -> Arc<AppState> {
    let db_path =
        std::env::temp_dir().join(format!("fotohub-fanout-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.observability.metrics_enabled = false;

    fotohub::api::create_app_state_from_config(config, None)
        .await
        .expect("failed to create app state")
}

async fn create_user(state: &AppState, username: &str, first: &str, last: &str) -> User {
    state
        .store()
        .create_user(username, "hunter2hunter2", first, last, &state.config().security)
        .await
        .expect("create user")
}

async fn seed_image(state: &AppState, owner: &User, album_name: &str) -> (String, String) {
    let album = state
        .store()
        .create_album(&owner.user_id, album_name)
        .await
        .expect("create album");
    let image = state
        .store()
        .add_image(&album.album_id, &owner.user_id, "photo.jpg", None)
        .await
        .expect("add image");
    (album.album_id, image.image_id)
}

async fn next_record(sub: &mut Subscription) -> EventRecord {
    let raw = tokio::time::timeout(Duration::from_secs(2), sub.recv())
        .await
        .expect("timed out waiting for event")
        .expect("topic closed before delivering an event");
    serde_json::from_str(&raw).expect("event should decode as a record")
}

#[tokio::test]
async fn private_stream_filter_passes_only_events_addressed_to_the_identity() {
    let state = spawn_app().await;
    let ada = create_user(&state, "ada", "Ada", "Lovelace").await;
    let grace = create_user(&state, "grace", "Grace", "Hopper").await;
    let actor = create_user(&state, "edsger", "Edsger", "Dijkstra").await;
    let (_, ada_image) = seed_image(&state, &ada, "Ada's Album").await;
    let (_, grace_image) = seed_image(&state, &grace, "Grace's Album").await;

    let mut sub = state.shared.broker.subscribe("notifications");
    let filter = SessionFilter::Global {
        identity: ada.user_id.clone(),
    };

    state
        .shared
        .engagements
        .add_engagement(&ada_image, &actor, EngagementKind::Like)
        .await
        .expect("like ada's image");
    state
        .shared
        .engagements
        .add_engagement(&grace_image, &actor, EngagementKind::Like)
        .await
        .expect("like grace's image");

    // Both events arrive on the shared topic; the per-session filter is
    // what keeps grace's notification out of ada's stream.
    let for_ada = next_record(&mut sub).await;
    let for_grace = next_record(&mut sub).await;

    assert_eq!(for_ada.recipient_id, ada.user_id);
    assert!(filter.should_deliver(&for_ada));

    assert_eq!(for_grace.recipient_id, grace.user_id);
    assert!(!filter.should_deliver(&for_grace));
}

#[tokio::test]
async fn album_stream_filter_passes_every_event_for_that_album() {
    let state = spawn_app().await;
    let ada = create_user(&state, "ada", "Ada", "Lovelace").await;
    let grace = create_user(&state, "grace", "Grace", "Hopper").await;
    let (album_id, image_id) = seed_image(&state, &ada, "Shared Album").await;

    let mut sub = state.shared.broker.subscribe(&album_id);
    let filter = SessionFilter::Scoped {
        album_id: album_id.clone(),
    };

    // An engagement event addressed to ada still passes grace's album
    // session; scoped delivery ignores the recipient entirely.
    state
        .shared
        .engagements
        .add_engagement(&image_id, &grace, EngagementKind::Upvote)
        .await
        .expect("upvote");

    let record = next_record(&mut sub).await;
    assert_eq!(record.recipient_id, ada.user_id);
    assert_eq!(record.scope_key.as_deref(), Some(album_id.as_str()));
    assert!(filter.should_deliver(&record));
}

#[tokio::test]
async fn invite_events_never_reach_album_streams() {
    let state = spawn_app().await;
    let ada = create_user(&state, "ada", "Ada", "Lovelace").await;
    let grace = create_user(&state, "grace", "Grace", "Hopper").await;
    let album = state
        .store()
        .create_album(&ada.user_id, "Invite Only")
        .await
        .expect("create album");

    let mut scoped = state.shared.broker.subscribe(&album.album_id);
    let mut global = state.shared.broker.subscribe("notifications");

    state
        .shared
        .invites
        .send_album_invites(&album.album_id, &ada, &[grace.user_id.clone()])
        .await
        .expect("send invite");

    let record = next_record(&mut global).await;
    assert_eq!(record.scope_key, None);

    // Invite lifecycle events are private; the album topic stays silent.
    let outcome = tokio::time::timeout(Duration::from_millis(200), scoped.recv()).await;
    assert!(outcome.is_err(), "unexpected event on album topic");
}

#[tokio::test]
async fn identity_must_resolve_before_a_session_opens() {
    let state = spawn_app().await;
    let ada = create_user(&state, "ada", "Ada", "Lovelace").await;

    let resolved = state
        .shared
        .gateway
        .resolve_identity("ada")
        .await
        .expect("known identity resolves");
    assert_eq!(resolved.user_id, ada.user_id);

    let unknown = state.shared.gateway.resolve_identity("ghost").await;
    assert!(matches!(unknown, Err(GatewayError::IdentityLookup(_))));
}

#[tokio::test]
async fn dropped_subscription_does_not_block_later_publishes() {
    let state = spawn_app().await;
    let ada = create_user(&state, "ada", "Ada", "Lovelace").await;
    let grace = create_user(&state, "grace", "Grace", "Hopper").await;
    let (album_id, image_id) = seed_image(&state, &ada, "Short Lived").await;

    let sub = state.shared.broker.subscribe(&album_id);
    drop(sub);

    // Publishing into the now-empty topic is a no-op, not an error, and a
    // fresh subscriber sees only what comes after it.
    state
        .shared
        .engagements
        .add_engagement(&image_id, &grace, EngagementKind::Like)
        .await
        .expect("like with no album listener");

    let mut sub = state.shared.broker.subscribe(&album_id);
    state
        .shared
        .engagements
        .add_engagement(&image_id, &ada, EngagementKind::Like)
        .await
        .expect("like with a listener");

    let record = next_record(&mut sub).await;
    assert_eq!(record.payload["notifier_id"], ada.user_id);
    assert_eq!(record.payload["new_count"], 2);
}
