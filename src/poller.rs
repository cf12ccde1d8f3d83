use std::future::Future;
use std::time::Duration;

use crate::config::PollerConfig;
use crate::error::{AppError, Result};
use crate::notifier::NotificationState;
use crate::platform::{MessageSender, StatusSource};
use crate::status::StatusSnapshot;

/// What a single polling cycle ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The feed had no homeworks updated since the cursor.
    NoUpdates,
    /// The latest status matches the one already reported.
    Unchanged,
    /// A change was detected and delivered.
    Notified,
    /// A change was detected but the message could not be delivered.
    DeliveryFailed,
    /// The feed could not be fetched or understood.
    FetchFailed,
}

impl CycleOutcome {
    /// Whether the cycle ended without doing what it set out to do.
    pub fn is_failure(&self) -> bool {
        matches!(self, CycleOutcome::FetchFailed | CycleOutcome::DeliveryFailed)
    }
}

/// Polling loop. Owns the notification state for its whole lifetime.
pub struct Poller<S, M> {
    source: S,
    sender: M,
    state: NotificationState,
    /// `from_date` for the next request.
    cursor: i64,
    interval: Duration,
    report_errors: bool,
    /// Last error text sent to the chat, to avoid repeating it every cycle.
    last_error: Option<String>,
}

impl<S: StatusSource, M: MessageSender> Poller<S, M> {
    pub fn new(source: S, sender: M, config: &PollerConfig) -> Self {
        let cursor = chrono::Utc::now()
            .timestamp()
            .saturating_sub(config.lookback_secs.max(0));
        Self {
            source,
            sender,
            state: NotificationState::new(),
            cursor,
            interval: config.interval(),
            report_errors: config.report_errors,
            last_error: None,
        }
    }

    pub fn with_cursor(mut self, cursor: i64) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn state(&self) -> &NotificationState {
        &self.state
    }

    /// Poll until `shutdown` resolves. A cycle in progress is abandoned.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tracing::info!(interval_secs = self.interval.as_secs(), "Poller started");
        tokio::pin!(shutdown);

        let interval = self.interval;
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = async {
                    self.poll_once().await;
                    tokio::time::sleep(interval).await;
                } => {}
            }
        }

        tracing::info!("Poller stopped");
    }

    /// Run one fetch → check → send cycle.
    pub async fn poll_once(&mut self) -> CycleOutcome {
        let snapshot = match self.fetch_latest().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                self.last_error = None;
                tracing::debug!(cursor = self.cursor, "No new statuses");
                return CycleOutcome::NoUpdates;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch homework status");
                self.report_error(&e).await;
                return CycleOutcome::FetchFailed;
            }
        };
        self.last_error = None;

        if !self.state.observe(snapshot.clone()) {
            tracing::debug!(
                homework = %snapshot.homework_name,
                status = %snapshot.status,
                "Status unchanged"
            );
            return CycleOutcome::Unchanged;
        }

        tracing::info!(
            homework = %snapshot.homework_name,
            status = %snapshot.status,
            "Status changed, notifying"
        );

        // State has already advanced; a failed send is not retried
        match self.sender.send(&snapshot.message()).await {
            Ok(()) => CycleOutcome::Notified,
            Err(e) => {
                tracing::error!(
                    homework = %snapshot.homework_name,
                    error = %e,
                    "Failed to send status notification"
                );
                CycleOutcome::DeliveryFailed
            }
        }
    }

    async fn fetch_latest(&mut self) -> Result<Option<StatusSnapshot>> {
        let feed = self.source.fetch_statuses(self.cursor).await?;

        let snapshot = feed.latest()?;

        if let Some(current_date) = feed.current_date {
            self.cursor = current_date;
        }

        Ok(snapshot)
    }

    async fn report_error(&mut self, error: &AppError) {
        if !self.report_errors {
            return;
        }

        let text = format!("Bot failure: {error}");
        if self.last_error.as_deref() == Some(text.as_str()) {
            tracing::debug!("Error already reported, not repeating");
            return;
        }

        match self.sender.send(&text).await {
            Ok(()) => self.last_error = Some(text),
            Err(e) => tracing::error!(error = %e, "Failed to report error to chat"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{HomeworkFeed, ReviewStatus};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct FakeSource {
        responses: Arc<Mutex<VecDeque<Result<HomeworkFeed>>>>,
        requested: Arc<Mutex<Vec<i64>>>,
    }

    impl FakeSource {
        fn push(&self, response: Result<HomeworkFeed>) {
            self.responses.lock().unwrap().push_back(response);
        }

        fn requested(&self) -> Vec<i64> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StatusSource for FakeSource {
        async fn fetch_statuses(&self, from_date: i64) -> Result<HomeworkFeed> {
            self.requested.lock().unwrap().push(from_date);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(HomeworkFeed::default()))
        }
    }

    #[derive(Clone, Default)]
    struct FakeSender {
        sent: Arc<Mutex<Vec<String>>>,
        failing: Arc<Mutex<bool>>,
    }

    impl FakeSender {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }

        fn set_failing(&self, failing: bool) {
            *self.failing.lock().unwrap() = failing;
        }
    }

    #[async_trait]
    impl MessageSender for FakeSender {
        async fn send(&self, text: &str) -> Result<()> {
            if *self.failing.lock().unwrap() {
                return Err(AppError::Delivery("chat not found".to_string()));
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn feed(name: &str, status: &str, current_date: i64) -> Result<HomeworkFeed> {
        Ok(HomeworkFeed {
            homeworks: vec![serde_json::json!({"homework_name": name, "status": status})],
            current_date: Some(current_date),
        })
    }

    fn poller(source: &FakeSource, sender: &FakeSender) -> Poller<FakeSource, FakeSender> {
        Poller::new(source.clone(), sender.clone(), &PollerConfig::default()).with_cursor(100)
    }

    #[tokio::test]
    async fn test_change_is_notified_once() {
        let source = FakeSource::default();
        let sender = FakeSender::default();
        source.push(feed("hw1", "reviewing", 200));
        source.push(feed("hw1", "reviewing", 300));
        source.push(feed("hw1", "approved", 400));

        let mut poller = poller(&source, &sender);
        assert_eq!(poller.poll_once().await, CycleOutcome::Notified);
        assert_eq!(poller.poll_once().await, CycleOutcome::Unchanged);
        assert_eq!(poller.poll_once().await, CycleOutcome::Notified);

        let sent = sender.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].contains("taken for review"));
        assert!(sent[1].contains("liked it"));
    }

    #[tokio::test]
    async fn test_cursor_follows_current_date() {
        let source = FakeSource::default();
        let sender = FakeSender::default();
        source.push(feed("hw1", "reviewing", 200));
        source.push(Ok(HomeworkFeed {
            homeworks: vec![],
            current_date: Some(300),
        }));

        let mut poller = poller(&source, &sender);
        poller.poll_once().await;
        assert_eq!(poller.poll_once().await, CycleOutcome::NoUpdates);
        poller.poll_once().await;

        assert_eq!(source.requested(), vec![100, 200, 300]);
        assert_eq!(poller.cursor(), 300);
    }

    #[tokio::test]
    async fn test_delivery_failure_still_advances_state() {
        let source = FakeSource::default();
        let sender = FakeSender::default();
        source.push(feed("hw1", "rejected", 200));
        source.push(feed("hw1", "rejected", 300));

        let mut poller = poller(&source, &sender);
        sender.set_failing(true);
        assert_eq!(poller.poll_once().await, CycleOutcome::DeliveryFailed);
        assert_eq!(
            poller.state().last().map(|s| s.status),
            Some(ReviewStatus::Rejected)
        );

        sender.set_failing(false);
        assert_eq!(poller.poll_once().await, CycleOutcome::Unchanged);
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_state_untouched() {
        let source = FakeSource::default();
        let sender = FakeSender::default();
        source.push(feed("hw1", "reviewing", 200));
        source.push(Err(AppError::Api("503 Service Unavailable".to_string())));
        source.push(feed("hw1", "reviewing", 300));

        let mut poller = poller(&source, &sender);
        assert_eq!(poller.poll_once().await, CycleOutcome::Notified);
        assert_eq!(poller.poll_once().await, CycleOutcome::FetchFailed);
        assert_eq!(poller.cursor(), 200);
        assert_eq!(poller.poll_once().await, CycleOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_repeated_error_reported_once() {
        let source = FakeSource::default();
        let sender = FakeSender::default();
        source.push(Err(AppError::Api("503".to_string())));
        source.push(Err(AppError::Api("503".to_string())));
        source.push(feed("hw1", "on_hold", 200));
        source.push(Ok(HomeworkFeed::default()));
        source.push(Err(AppError::Api("503".to_string())));

        let mut poller = poller(&source, &sender);
        for _ in 0..5 {
            poller.poll_once().await;
        }

        let sent = sender.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0], "Bot failure: Practicum API error: 503");
        assert_eq!(sent[1], "Bot failure: Undocumented homework status: on_hold");
        assert_eq!(sent[2], "Bot failure: Practicum API error: 503");
    }

    #[tokio::test]
    async fn test_errors_not_reported_when_disabled() {
        let source = FakeSource::default();
        let sender = FakeSender::default();
        source.push(Err(AppError::Api("503".to_string())));

        let config = PollerConfig {
            report_errors: false,
            ..PollerConfig::default()
        };
        let mut poller = Poller::new(source.clone(), sender.clone(), &config);
        assert_eq!(poller.poll_once().await, CycleOutcome::FetchFailed);
        assert!(sender.sent().is_empty());
    }

    #[test]
    fn test_failure_outcomes() {
        assert!(CycleOutcome::FetchFailed.is_failure());
        assert!(CycleOutcome::DeliveryFailed.is_failure());
        assert!(!CycleOutcome::Notified.is_failure());
        assert!(!CycleOutcome::Unchanged.is_failure());
        assert!(!CycleOutcome::NoUpdates.is_failure());
    }

    #[test]
    fn test_initial_cursor_looks_back() {
        let config = PollerConfig {
            lookback_secs: 3600,
            ..PollerConfig::default()
        };
        let poller = Poller::new(FakeSource::default(), FakeSender::default(), &config);
        let expected = chrono::Utc::now().timestamp() - 3600;
        assert!((poller.cursor() - expected).abs() <= 5);

        let config = PollerConfig {
            lookback_secs: i64::MAX,
            ..PollerConfig::default()
        };
        let poller = Poller::new(FakeSource::default(), FakeSender::default(), &config);
        assert!(poller.cursor() <= 0);
    }

    #[tokio::test]
    async fn test_malformed_older_entry_does_not_block_latest() {
        let source = FakeSource::default();
        let sender = FakeSender::default();
        source.push(Ok(HomeworkFeed {
            homeworks: vec![
                serde_json::json!({"homework_name": "hw2", "status": "approved"}),
                serde_json::json!(42),
            ],
            current_date: Some(200),
        }));

        let mut poller = poller(&source, &sender);
        assert_eq!(poller.poll_once().await, CycleOutcome::Notified);
        assert_eq!(poller.cursor(), 200);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let source = FakeSource::default();
        let sender = FakeSender::default();
        source.push(feed("hw1", "approved", 200));

        let mut poller = poller(&source, &sender).with_interval(Duration::from_millis(5));
        poller
            .run(tokio::time::sleep(Duration::from_millis(50)))
            .await;

        assert!(source.requested().len() >= 2);
        assert_eq!(sender.sent().len(), 1);
    }
}
