use std::sync::Arc;

use crate::models::{LogStatus, NewScrapingLog};
use crate::store::PriceStore;

/// Appends one `ScrapingLog` row per provider outcome. Best effort: a failed
/// write is reported to diagnostics and never reaches the caller.
#[derive(Clone)]
pub struct RunLogger {
    store: Arc<dyn PriceStore>,
}

impl RunLogger {
    pub fn new(store: Arc<dyn PriceStore>) -> Self {
        Self { store }
    }

    /// Returns whether the row was written.
    pub async fn log(&self, provider: &str, status: LogStatus, message: Option<String>) -> bool {
        let entry = NewScrapingLog {
            provider: provider.to_string(),
            status,
            message,
        };

        match self.store.insert_scraping_log(&entry).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Failed to log scraping for {}: {}", provider, e);
                false
            }
        }
    }

    pub async fn success(&self, provider: &str, message: impl Into<String>) -> bool {
        self.log(provider, LogStatus::Success, Some(message.into())).await
    }

    pub async fn error(&self, provider: &str, message: impl Into<String>) -> bool {
        self.log(provider, LogStatus::Error, Some(message.into())).await
    }
}
