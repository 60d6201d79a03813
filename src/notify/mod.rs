use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::config::NotifyConfig;

/// Delivers human-readable status messages. Best effort: never fails the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a message; returns whether it was delivered
    async fn notify(&self, message: &str) -> bool;
}

/// Notifier posting to a Telegram bot chat
pub struct TelegramNotifier {
    client: Option<reqwest::Client>,
    api_base: String,
    token: Option<String>,
    chat_id: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

impl TelegramNotifier {
    pub fn new(config: &NotifyConfig, token: Option<String>, chat_id: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| tracing::warn!("Failed to create HTTP client for notifications: {}", e))
            .ok();

        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token,
            chat_id,
        }
    }

    fn endpoint(&self, token: &str) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> bool {
        let Some(token) = &self.token else {
            tracing::warn!("TELEGRAM_BOT_TOKEN not set, skipping notification");
            return false;
        };
        let Some(client) = &self.client else {
            return false;
        };

        let body = SendMessage {
            chat_id: &self.chat_id,
            text: message,
        };

        match client.post(self.endpoint(token)).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!("Notification sent to chat {}", self.chat_id);
                true
            }
            Ok(response) => {
                tracing::warn!("Telegram rejected notification: HTTP {}", response.status());
                false
            }
            Err(e) => {
                tracing::warn!("Failed to send notification: {}", e);
                false
            }
        }
    }
}

/// Notifier used when notifications are switched off for a run
pub struct SilentNotifier;

#[async_trait]
impl Notifier for SilentNotifier {
    async fn notify(&self, message: &str) -> bool {
        tracing::debug!("Notification suppressed: {}", message);
        false
    }
}
