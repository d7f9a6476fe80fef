use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::PushConfig;
use crate::db::Store;

#[derive(Debug, Serialize)]
struct PushMessage<'a> {
    to: &'a str,
    notification: PushNotification<'a>,
}

#[derive(Debug, Serialize)]
struct PushNotification<'a> {
    title: &'a str,
    body: &'a str,
}

/// Best-effort mobile push delivery. Failures are logged and swallowed so a
/// dead push gateway never fails the mutation that triggered it.
#[derive(Clone)]
pub struct PushClient {
    client: Client,
    config: PushConfig,
}

impl PushClient {
    pub fn new(config: PushConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self { client, config })
    }

    /// Sends `title`/`body` to every registered device of `user_id`.
    pub async fn notify_user(&self, store: &Store, user_id: &str, title: &str, body: &str) {
        if !self.config.enabled {
            return;
        }

        let tokens = match store.push_tokens_for(user_id).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("Failed to load push tokens for {}: {}", user_id, e);
                return;
            }
        };

        if tokens.is_empty() {
            debug!("No push tokens registered for {}", user_id);
            return;
        }

        for token in tokens {
            if let Err(e) = self.send_to_token(&token, title, body).await {
                warn!("Push delivery failed for {}: {}", user_id, e);
            }
        }
    }

    async fn send_to_token(&self, token: &str, title: &str, body: &str) -> Result<()> {
        let message = PushMessage {
            to: token,
            notification: PushNotification { title, body },
        };

        let response = self
            .client
            .post(&self.config.fcm_url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("key={}", self.config.server_key),
            )
            .json(&message)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Push gateway error: {} - {}", status, body));
        }

        Ok(())
    }
}
