//! Telegram Bot API transport.
//!
//! Delivers one message per call via `sendMessage`.
//! Docs: <https://core.telegram.org/bots/api#sendmessage>

pub(crate) mod types;


use async_trait::async_trait;
use leetbot_core::{
    config::TelegramConfig, context::Context, error::LeetbotError, message::OutgoingMessage,
    traits::Transport,
};
use std::time::Duration;
use tracing::debug;
use types::TgResponse;

/// Sends messages through the Telegram Bot API.
pub struct TelegramTransport {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramTransport {
    /// Create a new Telegram transport from config.
    pub fn new(config: &TelegramConfig) -> Result<Self, LeetbotError> {
        if config.bot_token.is_empty() {
            return Err(LeetbotError::Config("telegram bot token is empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LeetbotError::Transport(format!("telegram: failed to build client: {e}")))?;
        Ok(Self {
            client,
            base_url: format!(
                "{}/bot{}",
                config.api_url.trim_end_matches('/'),
                config.bot_token
            ),
        })
    }

    async fn post(&self, message: &OutgoingMessage) -> Result<u16, LeetbotError> {
        let url = format!("{}/sendMessage", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(message)
            .send()
            .await
            // The URL carries the token; keep it out of the error.
            .map_err(|e| LeetbotError::Transport(format!("telegram send failed: {}", e.without_url())))?;

        let status = resp.status().as_u16();
        // Drain the body so the connection can be reused.
        let body = resp.bytes().await.unwrap_or_default();
        if status >= 400 {
            let description = serde_json::from_slice::<TgResponse>(&body)
                .ok()
                .filter(|r| !r.ok)
                .and_then(|r| r.description)
                .unwrap_or_default();
            debug!(
                "telegram sendMessage to {} got {status}: {description}",
                message.chat_id
            );
        }
        Ok(status)
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, ctx: &Context, message: &OutgoingMessage) -> Result<u16, LeetbotError> {
        ctx.run(self.post(message)).await
    }
}
