//! Engagement flows: likes, upvotes and comments, and the notification
//! fan-out each one produces.

use std::sync::Arc;
use std::time::Duration;

use fotohub::api::AppState;
use fotohub::broker::Subscription;
use fotohub::config::Config;
use fotohub::db::User;
use fotohub::domain::EngagementKind;
use fotohub::services::EngagementError;

async fn spawn_app() -> Arc<AppState> {
    let db_path = std::env::temp_dir().join(format!(
        "fotohub-engagement-test-{}.db",
        uuid::Uuid::new_v4()
    ));

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

/// One album with one image, both owned by `owner`. Returns (album_id, image_id).
async fn seed_image(state: &AppState, owner: &User) -> (String, String) {
    let album = state
        .store()
        .create_album(&owner.user_id, "Summer Trip")
        .await
        .expect("create album");
    let image = state
        .store()
        .add_image(&album.album_id, &owner.user_id, "beach.jpg", None)
        .await
        .expect("add image");
    (album.album_id, image.image_id)
}

async fn next_event(sub: &mut Subscription) -> serde_json::Value {
    let raw = tokio::time::timeout(Duration::from_secs(2), sub.recv())
        .await
        .expect("timed out waiting for event")
        .expect("topic closed before delivering an event");
    serde_json::from_str(&raw).expect("event should be valid json")
}

async fn assert_no_event(sub: &mut Subscription) {
    let outcome = tokio::time::timeout(Duration::from_millis(200), sub.recv()).await;
    assert!(outcome.is_err(), "unexpected event: {outcome:?}");
}

#[tokio::test]
async fn like_notifies_the_image_owner() {
    let state = spawn_app().await;
    let owner = create_user(&state, "ada", "Ada", "Lovelace").await;
    let actor = create_user(&state, "grace", "Grace", "Hopper").await;
    let (album_id, image_id) = seed_image(&state, &owner).await;

    let mut sub = state.shared.broker.subscribe("notifications");

    let count = state
        .shared
        .engagements
        .add_engagement(&image_id, &actor, EngagementKind::Like)
        .await
        .expect("add like");
    assert_eq!(count, 1);

    let event = next_event(&mut sub).await;
    assert_eq!(event["operation"], "ADD");
    assert_eq!(event["type"], "like");
    assert_eq!(event["user_id"], owner.user_id);
    assert_eq!(event["album_id"], album_id);
    assert_eq!(event["payload"]["notifier_id"], actor.user_id);
    assert_eq!(event["payload"]["new_count"], 1);
    assert!(event["payload"]["notification_id"].is_string());

    let unseen = state
        .store()
        .unseen_notifications_for(&owner.user_id)
        .await
        .expect("list notifications");
    assert_eq!(unseen.len(), 1);
    assert_eq!(unseen[0].kind, "like");
    assert_eq!(unseen[0].notifier_id, actor.user_id);
}

#[tokio::test]
async fn self_engagement_skips_the_notification_row() {
    let state = spawn_app().await;
    let owner = create_user(&state, "ada", "Ada", "Lovelace").await;
    let (_, image_id) = seed_image(&state, &owner).await;

    let mut sub = state.shared.broker.subscribe("notifications");

    state
        .shared
        .engagements
        .add_engagement(&image_id, &owner, EngagementKind::Upvote)
        .await
        .expect("self upvote");

    // The event still goes out so live album views refresh their counts,
    // but no notification was persisted for it.
    let event = next_event(&mut sub).await;
    assert_eq!(event["type"], "upvote");
    assert!(event["payload"].get("notification_id").is_none());

    let unseen = state
        .store()
        .unseen_notifications_for(&owner.user_id)
        .await
        .expect("list notifications");
    assert!(unseen.is_empty());
}

#[tokio::test]
async fn add_then_remove_restores_baseline() {
    let state = spawn_app().await;
    let owner = create_user(&state, "ada", "Ada", "Lovelace").await;
    let actor = create_user(&state, "grace", "Grace", "Hopper").await;
    let (_, image_id) = seed_image(&state, &owner).await;

    let mut sub = state.shared.broker.subscribe("notifications");

    let count = state
        .shared
        .engagements
        .add_engagement(&image_id, &actor, EngagementKind::Upvote)
        .await
        .expect("add upvote");
    assert_eq!(count, 1);

    let count = state
        .shared
        .engagements
        .remove_engagement(&image_id, &actor, EngagementKind::Upvote)
        .await
        .expect("remove upvote");
    assert_eq!(count, 0);

    let add = next_event(&mut sub).await;
    assert_eq!(add["operation"], "ADD");
    let remove = next_event(&mut sub).await;
    assert_eq!(remove["operation"], "REMOVE");
    assert_eq!(remove["payload"]["new_count"], 0);
    assert!(remove["payload"].get("notification_id").is_none());

    let unseen = state
        .store()
        .unseen_notifications_for(&owner.user_id)
        .await
        .expect("list notifications");
    assert!(unseen.is_empty(), "remove should retract the notification");
}

#[tokio::test]
async fn repeating_an_engagement_is_a_conflict() {
    let state = spawn_app().await;
    let owner = create_user(&state, "ada", "Ada", "Lovelace").await;
    let actor = create_user(&state, "grace", "Grace", "Hopper").await;
    let (_, image_id) = seed_image(&state, &owner).await;

    let mut sub = state.shared.broker.subscribe("notifications");

    state
        .shared
        .engagements
        .add_engagement(&image_id, &actor, EngagementKind::Like)
        .await
        .expect("first like");
    let _ = next_event(&mut sub).await;

    let repeat = state
        .shared
        .engagements
        .add_engagement(&image_id, &actor, EngagementKind::Like)
        .await;
    assert!(matches!(repeat, Err(EngagementError::AlreadyExists)));

    // The repeat neither double-counts nor publishes a second event.
    let count = state
        .store()
        .count_engagements(&image_id, EngagementKind::Like)
        .await
        .expect("count likes");
    assert_eq!(count, 1);
    assert_no_event(&mut sub).await;
}

#[tokio::test]
async fn removing_an_engagement_never_added_is_an_error() {
    let state = spawn_app().await;
    let owner = create_user(&state, "ada", "Ada", "Lovelace").await;
    let actor = create_user(&state, "grace", "Grace", "Hopper").await;
    let (_, image_id) = seed_image(&state, &owner).await;

    let mut sub = state.shared.broker.subscribe("notifications");

    let result = state
        .shared
        .engagements
        .remove_engagement(&image_id, &actor, EngagementKind::Like)
        .await;
    assert!(matches!(result, Err(EngagementError::NotFound)));

    // A failed removal mutates nothing and publishes nothing.
    assert_no_event(&mut sub).await;
}

#[tokio::test]
async fn comment_notifies_the_owner() {
    let state = spawn_app().await;
    let owner = create_user(&state, "ada", "Ada", "Lovelace").await;
    let actor = create_user(&state, "grace", "Grace", "Hopper").await;
    let (_, image_id) = seed_image(&state, &owner).await;

    let mut sub = state.shared.broker.subscribe("notifications");

    let comment = state
        .shared
        .engagements
        .add_comment(&image_id, &actor, "great shot")
        .await
        .expect("add comment");
    assert_eq!(comment.body, "great shot");

    let event = next_event(&mut sub).await;
    assert_eq!(event["operation"], "ADD");
    assert_eq!(event["type"], "comment");
    assert_eq!(event["user_id"], owner.user_id);
    assert_eq!(event["payload"]["body"], "great shot");
    assert_eq!(event["payload"]["notification_seen"], false);

    let unseen = state
        .store()
        .unseen_notifications_for(&owner.user_id)
        .await
        .expect("list notifications");
    assert_eq!(unseen.len(), 1);
    assert_eq!(unseen[0].kind, "comment");
}

#[tokio::test]
async fn comment_on_own_image_is_pre_marked_seen() {
    let state = spawn_app().await;
    let owner = create_user(&state, "ada", "Ada", "Lovelace").await;
    let (_, image_id) = seed_image(&state, &owner).await;

    let mut sub = state.shared.broker.subscribe("notifications");

    state
        .shared
        .engagements
        .add_comment(&image_id, &owner, "caption says it all")
        .await
        .expect("self comment");

    // Unlike likes, a self-comment still persists a notification row; it
    // arrives already seen so the unseen feed never shows it.
    let event = next_event(&mut sub).await;
    assert!(event["payload"]["notification_id"].is_string());
    assert_eq!(event["payload"]["notification_seen"], true);

    let unseen = state
        .store()
        .unseen_notifications_for(&owner.user_id)
        .await
        .expect("list notifications");
    assert!(unseen.is_empty());
}

#[tokio::test]
async fn engagement_events_reach_the_album_channel_too() {
    let state = spawn_app().await;
    let owner = create_user(&state, "ada", "Ada", "Lovelace").await;
    let actor = create_user(&state, "grace", "Grace", "Hopper").await;
    let (album_id, image_id) = seed_image(&state, &owner).await;

    let mut global = state.shared.broker.subscribe("notifications");
    let mut scoped = state.shared.broker.subscribe(&album_id);

    state
        .shared
        .engagements
        .add_engagement(&image_id, &actor, EngagementKind::Like)
        .await
        .expect("add like");

    let on_global = next_event(&mut global).await;
    let on_album = next_event(&mut scoped).await;
    assert_eq!(on_global, on_album);
}
