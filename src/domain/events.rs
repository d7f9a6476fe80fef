//! Event records published to the broker and delivered to connected clients.
//!
//! One `EventRecord` is addressed to exactly one recipient; notifying several
//! users (e.g. every accepted guest of an album) means publishing one record
//! per user, never a list payload.

use serde::{Deserialize, Serialize};

use crate::domain::EngagementKind;

/// Topic carrying private, per-recipient notifications.
pub const GLOBAL_TOPIC: &str = "notifications";

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Add,
    Remove,
    Request,
    Accepted,
    Denied,
}

/// What domain object the operation concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Upvote,
    Like,
    Comment,
    AlbumInvite,
    FriendRequest,
}

impl From<EngagementKind> for EventKind {
    fn from(kind: EngagementKind) -> Self {
        match kind {
            EngagementKind::Like => Self::Like,
            EngagementKind::Upvote => Self::Upvote,
        }
    }
}

/// The wire payload published to the broker.
///
/// Serializes to exactly the JSON object written to the socket:
/// `{operation, type, user_id, album_id, payload}`. The `payload` body is
/// built once at publish time and treated as opaque afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub operation: Operation,

    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Internal identity the event is addressed to. Drives delivery on the
    /// global topic.
    #[serde(rename = "user_id")]
    pub recipient_id: String,

    /// Secondary routing key for album-scoped topics.
    #[serde(rename = "album_id", default, skip_serializing_if = "Option::is_none")]
    pub scope_key: Option<String>,

    pub payload: serde_json::Value,
}

impl EventRecord {
    pub fn new(
        operation: Operation,
        kind: EventKind,
        recipient_id: impl Into<String>,
        scope_key: Option<String>,
        payload: &impl Serialize,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            operation,
            kind,
            recipient_id: recipient_id.into(),
            scope_key,
            payload: serde_json::to_value(payload)?,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Body of a like/upvote event. `notification_id` and `received_at` are
/// absent when the actor is the content owner and no row was persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementNotification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<String>,
    pub image_id: String,
    pub album_id: String,
    pub album_name: String,
    pub receiver_id: String,
    pub notifier_id: String,
    pub notifier_first: String,
    pub notifier_last: String,
    pub notification_seen: bool,
    pub notification_type: String,
    /// Aggregate count recomputed at the time of the action. Advisory: a
    /// snapshot, not a monotonic stream.
    pub new_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_at: Option<String>,
}

/// Body of a comment event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentNotification {
    pub comment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<String>,
    pub image_id: String,
    pub album_id: String,
    pub album_name: String,
    pub receiver_id: String,
    pub notifier_id: String,
    pub notifier_first: String,
    pub notifier_last: String,
    pub body: String,
    pub notification_seen: bool,
    pub received_at: String,
}

/// Body of an album invite lifecycle event (REQUEST/ACCEPTED/DENIED).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumRequestNotification {
    pub request_id: String,
    pub album_id: String,
    pub album_name: String,
    pub inviter_id: String,
    pub invited_id: String,
    /// Name of whoever acted: the inviter on REQUEST, the invitee on
    /// ACCEPTED/DENIED.
    pub actor_first: String,
    pub actor_last: String,
    pub status: String,
    pub created_at: String,
}

/// Body of a friend request lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequestNotification {
    pub request_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub actor_first: String,
    pub actor_last: String,
    pub status: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_field_names() {
        let payload = FriendRequestNotification {
            request_id: "r1".into(),
            sender_id: "u2".into(),
            receiver_id: "u1".into(),
            actor_first: "Ada".into(),
            actor_last: "Lovelace".into(),
            status: "pending".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
        };
        let record = EventRecord::new(
            Operation::Request,
            EventKind::FriendRequest,
            "u1",
            None,
            &payload,
        )
        .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(value["operation"], "REQUEST");
        assert_eq!(value["type"], "friend-request");
        assert_eq!(value["user_id"], "u1");
        assert!(value.get("album_id").is_none());
        assert_eq!(value["payload"]["sender_id"], "u2");
    }

    #[test]
    fn scope_key_serializes_as_album_id() {
        let record = EventRecord::new(
            Operation::Add,
            EventKind::Upvote,
            "u1",
            Some("alb1".to_string()),
            &serde_json::json!({}),
        )
        .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(value["album_id"], "alb1");
    }

    #[test]
    fn record_round_trips_with_opaque_payload() {
        let json = r#"{"operation":"ADD","type":"comment","user_id":"u9","album_id":"a3","payload":{"anything":[1,2,3]}}"#;
        let record: EventRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.operation, Operation::Add);
        assert_eq!(record.kind, EventKind::Comment);
        assert_eq!(record.recipient_id, "u9");
        assert_eq!(record.scope_key.as_deref(), Some("a3"));
        assert_eq!(record.payload["anything"][1], 2);
    }

    #[test]
    fn suppressed_notification_id_is_omitted() {
        let payload = EngagementNotification {
            notification_id: None,
            image_id: "img1".into(),
            album_id: "alb1".into(),
            album_name: "Trip".into(),
            receiver_id: "u1".into(),
            notifier_id: "u1".into(),
            notifier_first: "Ada".into(),
            notifier_last: "Lovelace".into(),
            notification_seen: false,
            notification_type: "like".into(),
            new_count: 3,
            received_at: None,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("notification_id").is_none());
        assert!(value.get("received_at").is_none());
        assert_eq!(value["new_count"], 3);
    }
}
