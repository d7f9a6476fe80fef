//! Album and friend invitation lifecycles.
//!
//! Every status transition goes through a `WHERE status = 'pending'` guarded
//! update so concurrent accept/deny calls on the same request cannot both
//! win; the loser sees zero rows affected and gets `RequestNotFound`.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::broker::Broker;
use crate::clients::PushClient;
use crate::db::{Store, User};
use crate::domain::RequestStatus;
use crate::domain::events::{
    AlbumRequestNotification, EventKind, EventRecord, FriendRequestNotification, GLOBAL_TOPIC,
    Operation,
};
use crate::entities::{album_requests, friend_requests};

#[derive(Debug, Error)]
pub enum InviteError {
    #[error("Album not found: {0}")]
    AlbumNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Request not found or already resolved")]
    RequestNotFound,

    #[error("Request does not belong to this user")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for InviteError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for InviteError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

pub struct InviteService {
    store: Store,
    broker: Arc<dyn Broker>,
    push: PushClient,
}

impl InviteService {
    #[must_use]
    pub fn new(store: Store, broker: Arc<dyn Broker>, push: PushClient) -> Self {
        Self {
            store,
            broker,
            push,
        }
    }

    /// Invites each listed user to the album. One request row and one
    /// REQUEST event per invitee; mobile push is sent best-effort.
    pub async fn send_album_invites(
        &self,
        album_id: &str,
        inviter: &User,
        invited_ids: &[String],
    ) -> Result<Vec<album_requests::Model>, InviteError> {
        let album = self
            .store
            .get_album(album_id)
            .await?
            .ok_or_else(|| InviteError::AlbumNotFound(album_id.to_string()))?;

        let mut requests = Vec::with_capacity(invited_ids.len());

        for invited_id in invited_ids {
            if invited_id == &inviter.user_id {
                continue;
            }
            if self.store.get_user(invited_id).await?.is_none() {
                return Err(InviteError::UserNotFound(invited_id.clone()));
            }

            let request = self
                .store
                .insert_album_request(album_id, &inviter.user_id, invited_id)
                .await?;

            let payload = AlbumRequestNotification {
                request_id: request.request_id.clone(),
                album_id: album_id.to_string(),
                album_name: album.name.clone(),
                inviter_id: inviter.user_id.clone(),
                invited_id: invited_id.clone(),
                actor_first: inviter.first_name.clone(),
                actor_last: inviter.last_name.clone(),
                status: RequestStatus::Pending.as_str().to_string(),
                created_at: request.created_at.clone(),
            };
            let record = EventRecord::new(
                Operation::Request,
                EventKind::AlbumInvite,
                invited_id,
                None,
                &payload,
            )?;
            self.publish(&record);

            let title = format!("Accept invite to {}", album.name);
            let body = format!(
                "{} {} sent you an album invite.",
                inviter.first_name, inviter.last_name
            );
            self.push
                .notify_user(&self.store, invited_id, &title, &body)
                .await;

            requests.push(request);
        }

        Ok(requests)
    }

    /// Accepts a pending album invite. The inviter and every guest already
    /// in the album each get one ACCEPTED event; the actor gets none.
    pub async fn accept_album_invite(
        &self,
        request_id: &str,
        actor: &User,
    ) -> Result<(), InviteError> {
        let request = self
            .store
            .get_album_request(request_id)
            .await?
            .ok_or(InviteError::RequestNotFound)?;

        if request.invited_id != actor.user_id {
            return Err(InviteError::Forbidden);
        }

        let transitioned = self
            .store
            .transition_album_request(request_id, RequestStatus::Accepted)
            .await?;
        if transitioned == 0 {
            return Err(InviteError::RequestNotFound);
        }

        self.store
            .add_album_guest(&request.album_id, &actor.user_id)
            .await?;

        let album_name = self
            .store
            .get_album(&request.album_id)
            .await?
            .map(|a| a.name)
            .unwrap_or_default();

        let mut recipients = vec![request.inviter_id.clone()];
        for guest in self
            .store
            .album_guests_excluding(&request.album_id, &actor.user_id)
            .await?
        {
            if !recipients.contains(&guest) {
                recipients.push(guest);
            }
        }

        for recipient in recipients {
            let payload = AlbumRequestNotification {
                request_id: request.request_id.clone(),
                album_id: request.album_id.clone(),
                album_name: album_name.clone(),
                inviter_id: request.inviter_id.clone(),
                invited_id: request.invited_id.clone(),
                actor_first: actor.first_name.clone(),
                actor_last: actor.last_name.clone(),
                status: RequestStatus::Accepted.as_str().to_string(),
                created_at: request.created_at.clone(),
            };
            let record = EventRecord::new(
                Operation::Accepted,
                EventKind::AlbumInvite,
                &recipient,
                None,
                &payload,
            )?;
            self.publish(&record);
        }

        Ok(())
    }

    /// Declines a pending album invite. Only the inviter is notified.
    pub async fn deny_album_invite(
        &self,
        request_id: &str,
        actor: &User,
    ) -> Result<(), InviteError> {
        let request = self
            .store
            .get_album_request(request_id)
            .await?
            .ok_or(InviteError::RequestNotFound)?;

        if request.invited_id != actor.user_id {
            return Err(InviteError::Forbidden);
        }

        let transitioned = self
            .store
            .transition_album_request(request_id, RequestStatus::Denied)
            .await?;
        if transitioned == 0 {
            return Err(InviteError::RequestNotFound);
        }

        let album_name = self
            .store
            .get_album(&request.album_id)
            .await?
            .map(|a| a.name)
            .unwrap_or_default();

        let payload = AlbumRequestNotification {
            request_id: request.request_id.clone(),
            album_id: request.album_id.clone(),
            album_name,
            inviter_id: request.inviter_id.clone(),
            invited_id: request.invited_id.clone(),
            actor_first: actor.first_name.clone(),
            actor_last: actor.last_name.clone(),
            status: RequestStatus::Denied.as_str().to_string(),
            created_at: request.created_at.clone(),
        };
        let record = EventRecord::new(
            Operation::Denied,
            EventKind::AlbumInvite,
            &request.inviter_id,
            None,
            &payload,
        )?;
        self.publish(&record);

        Ok(())
    }

    pub async fn mark_album_invite_seen(
        &self,
        request_id: &str,
        invited: &User,
    ) -> Result<(), InviteError> {
        let updated = self
            .store
            .mark_album_invite_seen(request_id, &invited.user_id)
            .await?;
        if updated == 0 {
            return Err(InviteError::RequestNotFound);
        }
        Ok(())
    }

    pub async fn mark_album_response_seen(
        &self,
        request_id: &str,
        inviter: &User,
    ) -> Result<(), InviteError> {
        let updated = self
            .store
            .mark_album_response_seen(request_id, &inviter.user_id)
            .await?;
        if updated == 0 {
            return Err(InviteError::RequestNotFound);
        }
        Ok(())
    }

    pub async fn send_friend_request(
        &self,
        sender: &User,
        receiver_id: &str,
    ) -> Result<friend_requests::Model, InviteError> {
        if receiver_id == sender.user_id {
            return Err(InviteError::UserNotFound(receiver_id.to_string()));
        }
        if self.store.get_user(receiver_id).await?.is_none() {
            return Err(InviteError::UserNotFound(receiver_id.to_string()));
        }

        let request = self
            .store
            .insert_friend_request(&sender.user_id, receiver_id)
            .await?;

        let payload = FriendRequestNotification {
            request_id: request.request_id.clone(),
            sender_id: sender.user_id.clone(),
            receiver_id: receiver_id.to_string(),
            actor_first: sender.first_name.clone(),
            actor_last: sender.last_name.clone(),
            status: RequestStatus::Pending.as_str().to_string(),
            created_at: request.created_at.clone(),
        };
        let record = EventRecord::new(
            Operation::Request,
            EventKind::FriendRequest,
            receiver_id,
            None,
            &payload,
        )?;
        self.publish(&record);

        Ok(request)
    }

    /// Accepts a pending friend request and records the friendship both
    /// ways. The original sender is notified.
    pub async fn accept_friend_request(
        &self,
        request_id: &str,
        actor: &User,
    ) -> Result<(), InviteError> {
        let request = self
            .store
            .get_friend_request(request_id)
            .await?
            .ok_or(InviteError::RequestNotFound)?;

        if request.receiver_id != actor.user_id {
            return Err(InviteError::Forbidden);
        }

        let transitioned = self
            .store
            .transition_friend_request(request_id, RequestStatus::Accepted)
            .await?;
        if transitioned == 0 {
            return Err(InviteError::RequestNotFound);
        }

        self.store
            .add_friendship(&request.sender_id, &request.receiver_id)
            .await?;
        self.store
            .add_friendship(&request.receiver_id, &request.sender_id)
            .await?;

        self.publish_friend_response(&request, actor, RequestStatus::Accepted)?;

        Ok(())
    }

    pub async fn deny_friend_request(
        &self,
        request_id: &str,
        actor: &User,
    ) -> Result<(), InviteError> {
        let request = self
            .store
            .get_friend_request(request_id)
            .await?
            .ok_or(InviteError::RequestNotFound)?;

        if request.receiver_id != actor.user_id {
            return Err(InviteError::Forbidden);
        }

        let transitioned = self
            .store
            .transition_friend_request(request_id, RequestStatus::Denied)
            .await?;
        if transitioned == 0 {
            return Err(InviteError::RequestNotFound);
        }

        self.publish_friend_response(&request, actor, RequestStatus::Denied)?;

        Ok(())
    }

    pub async fn mark_friend_request_seen(
        &self,
        request_id: &str,
        receiver: &User,
    ) -> Result<(), InviteError> {
        let updated = self
            .store
            .mark_friend_request_seen(request_id, &receiver.user_id)
            .await?;
        if updated == 0 {
            return Err(InviteError::RequestNotFound);
        }
        Ok(())
    }

    fn publish_friend_response(
        &self,
        request: &friend_requests::Model,
        actor: &User,
        status: RequestStatus,
    ) -> Result<(), InviteError> {
        let payload = FriendRequestNotification {
            request_id: request.request_id.clone(),
            sender_id: request.sender_id.clone(),
            receiver_id: request.receiver_id.clone(),
            actor_first: actor.first_name.clone(),
            actor_last: actor.last_name.clone(),
            status: status.as_str().to_string(),
            created_at: request.created_at.clone(),
        };
        let operation = match status {
            RequestStatus::Denied => Operation::Denied,
            _ => Operation::Accepted,
        };
        let record = EventRecord::new(
            operation,
            EventKind::FriendRequest,
            &request.sender_id,
            None,
            &payload,
        )?;
        self.publish(&record);
        Ok(())
    }

    /// Post-commit fan-out; broker failures never fail the mutation.
    fn publish(&self, record: &EventRecord) {
        match record.to_json() {
            Ok(json) => {
                if let Err(e) = self.broker.publish(GLOBAL_TOPIC, json) {
                    warn!("Publish to global topic failed: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize event record: {}", e),
        }
    }
}
