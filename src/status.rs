use std::fmt;

use serde::Deserialize;

use crate::error::{AppError, Result};

/// Review state of a homework submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewStatus {
    Reviewing,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub const ALL: [ReviewStatus; 3] = [
        ReviewStatus::Reviewing,
        ReviewStatus::Approved,
        ReviewStatus::Rejected,
    ];

    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "reviewing" => Ok(ReviewStatus::Reviewing),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            other => Err(AppError::UndocumentedStatus(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Reviewing => "reviewing",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }

    pub fn verdict(&self) -> &'static str {
        match self {
            ReviewStatus::Approved => "The work has been reviewed: the reviewer liked it. Hooray!",
            ReviewStatus::Reviewing => "The work has been taken for review.",
            ReviewStatus::Rejected => "The work has been reviewed: the reviewer has comments.",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The status of one homework as last seen in the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub homework_name: String,
    pub status: ReviewStatus,
}

impl StatusSnapshot {
    pub fn new(homework_name: impl Into<String>, status: ReviewStatus) -> Self {
        Self {
            homework_name: homework_name.into(),
            status,
        }
    }

    /// Text sent to the chat when this snapshot is new.
    pub fn message(&self) -> String {
        format!(
            "Review status of \"{}\" changed. {}",
            self.homework_name,
            self.status.verdict()
        )
    }
}

/// A homework entry as returned by the API. Fields are optional so that a
/// missing key is reported as an unexpected response rather than a decode
/// failure.
#[derive(Debug, Clone, Deserialize)]
pub struct HomeworkEntry {
    pub homework_name: Option<String>,
    pub status: Option<String>,
}

impl HomeworkEntry {
    /// Decode one raw element of the `homeworks` list.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        Self::deserialize(value)
            .map_err(|e| AppError::UnexpectedResponse(format!("malformed homework entry: {e}")))
    }

    pub fn to_snapshot(&self) -> Result<StatusSnapshot> {
        let (Some(name), Some(status)) = (&self.homework_name, &self.status) else {
            return Err(AppError::UnexpectedResponse(
                "homework entry is missing `homework_name` or `status`".to_string(),
            ));
        };
        Ok(StatusSnapshot::new(name.as_str(), ReviewStatus::parse(status)?))
    }
}

/// One page of the homework-status feed.
#[derive(Debug, Clone, Default)]
pub struct HomeworkFeed {
    /// Raw entries, newest first. Only the newest one is ever decoded.
    pub homeworks: Vec<serde_json::Value>,
    /// Server time of the response; next request uses it as `from_date`.
    pub current_date: Option<i64>,
}

impl HomeworkFeed {
    /// Validate the raw response body and extract the feed.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(mut body) = value else {
            return Err(AppError::UnexpectedResponse(
                "response body is not a JSON object".to_string(),
            ));
        };

        let homeworks = match body.remove("homeworks") {
            Some(serde_json::Value::Array(list)) => list,
            Some(_) => {
                return Err(AppError::UnexpectedResponse(
                    "`homeworks` is not a list".to_string(),
                ))
            }
            None => {
                return Err(AppError::UnexpectedResponse(
                    "response has no `homeworks` key".to_string(),
                ))
            }
        };

        let current_date = body.get("current_date").and_then(|v| v.as_i64());

        Ok(Self {
            homeworks,
            current_date,
        })
    }

    /// Parse the raw response text and extract the feed.
    pub fn from_body(body: &str) -> Result<Self> {
        let value = serde_json::from_str(body).map_err(|e| {
            AppError::UnexpectedResponse(format!("response body is not valid JSON: {e}"))
        })?;
        Self::from_value(value)
    }

    /// Status of the newest homework, if the feed has any.
    pub fn latest(&self) -> Result<Option<StatusSnapshot>> {
        self.homeworks
            .first()
            .map(|raw| HomeworkEntry::from_value(raw)?.to_snapshot())
            .transpose()
    }
}
