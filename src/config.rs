use serde::Deserialize;
use std::time::Duration;

use crate::error::{AppError, Result};

const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";
const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub practicum: PracticumConfig,
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Clone)]
pub struct PracticumConfig {
    pub token: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

// Manual Debug impl to avoid leaking the OAuth token
impl std::fmt::Debug for PracticumConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PracticumConfig")
            .field("token", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Deserialize, Clone)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: i64,
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
}

// Manual Debug impl to avoid leaking the bot token
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollerConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// How far back the first request looks, in seconds.
    #[serde(default)]
    pub lookback_secs: i64,
    /// Send fetch errors to the chat (deduplicated).
    #[serde(default = "default_report_errors")]
    pub report_errors: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            lookback_secs: 0,
            report_errors: default_report_errors(),
        }
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_telegram_api_base() -> String {
    DEFAULT_TELEGRAM_API_BASE.to_string()
}

fn default_interval_secs() -> u64 {
    600
}

fn default_report_errors() -> bool {
    true
}

/// Credential keys that may also be set through bare variables.
const CREDENTIAL_VARS: [(&str, &str); 3] = [
    ("practicum.token", "PRACTICUM_TOKEN"),
    ("telegram.token", "TELEGRAM_TOKEN"),
    ("telegram.chat_id", "TELEGRAM_CHAT_ID"),
];

fn with_credential_overrides<F>(
    mut builder: config::ConfigBuilder<config::builder::DefaultState>,
    lookup: F,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>>
where
    F: Fn(&str) -> Option<String>,
{
    for (key, var) in CREDENTIAL_VARS {
        builder = builder
            .set_override_option(key, lookup(var))
            .map_err(|e| AppError::Config(e.to_string()))?;
    }
    Ok(builder)
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Load from file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder = builder.add_source(config::File::with_name("homework-bot").required(false));
        }

        // Environment variable overrides with HOMEWORK_BOT__ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("HOMEWORK_BOT")
                .separator("__")
                .try_parsing(true),
        );

        // Bare credential variables take precedence over everything else
        builder = with_credential_overrides(builder, |var| std::env::var(var).ok())?;

        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let config = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the bot cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.practicum.token.trim().is_empty() {
            return Err(AppError::Config("practicum.token is empty".to_string()));
        }
        if self.telegram.token.trim().is_empty() {
            return Err(AppError::Config("telegram.token is empty".to_string()));
        }
        if self.telegram.chat_id == 0 {
            return Err(AppError::Config("telegram.chat_id is not set".to_string()));
        }
        if self.poller.lookback_secs < 0 {
            return Err(AppError::Config(
                "poller.lookback_secs must not be negative".to_string(),
            ));
        }
        if self.poller.interval_secs == 0 {
            return Err(AppError::Config(
                "poller.interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
