use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::TelegramConfig;
use crate::error::{AppError, Result};
use crate::platform::MessageSender;

/// Sends plain-text messages to one chat through the Telegram Bot API.
pub struct TelegramSender {
    client: Client,
    api_base: String,
    token: String,
    chat_id: i64,
}

impl TelegramSender {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            client: Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            chat_id: config.chat_id,
        }
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

#[async_trait]
impl MessageSender for TelegramSender {
    async fn send(&self, text: &str) -> Result<()> {
        let request = SendMessageRequest {
            chat_id: self.chat_id,
            text,
        };

        // The URL embeds the bot token, so transport errors are stripped of it
        let response = self
            .client
            .post(self.send_message_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Delivery(e.without_url().to_string()))?;

        let status = response.status();
        let reply = response
            .json::<TelegramReply>()
            .await
            .map_err(|e| AppError::Delivery(format!("{status}: {}", e.without_url())))?;

        reply.into_result(status)?;

        tracing::info!(chat_id = self.chat_id, "Message delivered");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TelegramReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramReply {
    fn into_result(self, status: reqwest::StatusCode) -> Result<()> {
        if self.ok && status.is_success() {
            return Ok(());
        }
        let description = self
            .description
            .unwrap_or_else(|| "no description".to_string());
        Err(AppError::Delivery(format!("{status}: {description}")))
    }
}
