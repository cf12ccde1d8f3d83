use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::PracticumConfig;
use crate::error::{AppError, Result};
use crate::platform::StatusSource;
use crate::status::HomeworkFeed;

pub struct PracticumClient {
    client: Client,
    endpoint: String,
    token: String,
}

impl PracticumClient {
    pub fn new(config: &PracticumConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn authorization(&self) -> String {
        format!("OAuth {}", self.token)
    }
}

#[async_trait]
impl StatusSource for PracticumClient {
    async fn fetch_statuses(&self, from_date: i64) -> Result<HomeworkFeed> {
        tracing::debug!(endpoint = %self.endpoint, from_date, "Requesting homework statuses");

        let response = self
            .client
            .get(&self.endpoint)
            .header("Authorization", self.authorization())
            .query(&[("from_date", from_date)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // The body stays out of the error: it may carry per-request ids
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = %status,
                body = %truncate(&body, MAX_LOGGED_BODY),
                "Practicum API rejected the request"
            );
            return Err(AppError::Api(format!("{} returned {status}", self.endpoint)));
        }

        let body = response.text().await?;
        HomeworkFeed::from_body(&body)
    }
}

const MAX_LOGGED_BODY: usize = 512;

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
