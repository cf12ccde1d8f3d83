use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Practicum API error: {0}")]
    Api(String),

    #[error("Unexpected API response: {0}")]
    UnexpectedResponse(String),

    #[error("Undocumented homework status: {0}")]
    UndocumentedStatus(String),

    #[error("Telegram delivery failed: {0}")]
    Delivery(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
