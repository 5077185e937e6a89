//! Minimal Telegram Bot API client

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppError;

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends bot messages through `{api_base}/bot{token}/sendMessage`
#[derive(Clone)]
pub struct TelegramClient {
    http_client: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    pub fn new(api_base: &str, bot_token: &str) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http_client,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    /// Send a plain text message to a chat
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), AppError> {
        let response = self
            .http_client
            .post(self.method_url("sendMessage"))
            .json(&SendMessage { chat_id, text })
            .send()
            .await?;

        let status = response.status();
        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| AppError::Http(format!("HTTP {}: {}", status, e)))?;

        if !status.is_success() || !body.ok {
            return Err(AppError::Http(format!(
                "sendMessage to {} failed: HTTP {} {}",
                chat_id,
                status,
                body.description.unwrap_or_default()
            )));
        }

        debug!(chat_id, "Message sent");
        Ok(())
    }
}
