pub mod practicum;
pub mod telegram;

use async_trait::async_trait;

use crate::error::Result;
use crate::status::HomeworkFeed;

/// Source of homework review statuses.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch homeworks updated since `from_date` (unix seconds).
    async fn fetch_statuses(&self, from_date: i64) -> Result<HomeworkFeed>;
}

/// Outbound channel for notifications.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}
