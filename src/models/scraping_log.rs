use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::LogStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ScrapingLog {
    pub id: i64,
    pub provider: String,
    pub status: LogStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewScrapingLog {
    pub provider: String,
    pub status: LogStatus,
    pub message: Option<String>,
}

impl NewScrapingLog {
    pub fn success(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            status: LogStatus::Success,
            message: Some(message.into()),
        }
    }

    pub fn error(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            status: LogStatus::Error,
            message: Some(message.into()),
        }
    }
}
