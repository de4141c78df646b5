use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::time::Instant;
use tokio_retry::RetryIf;
use tokio_retry::strategy::FixedInterval;

use crate::browser::{PageFetcher, RenderedPage};
use crate::config::ScraperConfig;
use crate::models::FuelPriceRecord;
use crate::normalizer::normalize_all;
use crate::providers::ProviderSpec;
use crate::reconciler::{ReconcileSummary, Reconciler};
use crate::run_logger::RunLogger;
use crate::store::PriceStore;
use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProviderState {
    Pending,
    Fetching,
    Extracting,
    Reconciling,
    Done,
    Failed,
}

impl fmt::Display for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderState::Pending => "pending",
            ProviderState::Fetching => "fetching",
            ProviderState::Extracting => "extracting",
            ProviderState::Reconciling => "reconciling",
            ProviderState::Done => "done",
            ProviderState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderOutcome {
    pub provider: String,
    pub state: ProviderState,
    pub pairs_extracted: usize,
    pub records: usize,
    pub attempts: u32,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl ProviderOutcome {
    pub fn succeeded(&self) -> bool {
        self.state == ProviderState::Done
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub outcomes: Vec<ProviderOutcome>,
    pub records_collected: usize,
    /// `None` when no provider produced a record and reconciliation was skipped.
    pub reconcile: Option<ReconcileSummary>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Bounded retry of navigation failures. Zero attempts keeps the
/// single-shot behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay_ms: u64,
}

impl RetryPolicy {
    pub const NONE: RetryPolicy = RetryPolicy { attempts: 0, delay_ms: 0 };

    pub fn from_config(config: &ScraperConfig) -> Self {
        Self {
            attempts: config.retry_attempts,
            delay_ms: config.retry_delay_ms,
        }
    }
}

/// Visits providers one after another, then reconciles everything that was
/// scraped in a single pass.
pub struct Pipeline {
    fetcher: Arc<dyn PageFetcher>,
    providers: Vec<ProviderSpec>,
    reconciler: Reconciler,
    run_logger: RunLogger,
    retry: RetryPolicy,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn PriceStore>,
        providers: Vec<ProviderSpec>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            fetcher,
            providers,
            reconciler: Reconciler::new(Arc::clone(&store)),
            run_logger: RunLogger::new(store),
            retry,
        }
    }

    pub fn providers(&self) -> &[ProviderSpec] {
        &self.providers
    }

    /// Never fails: provider errors end up in the report and in the
    /// scraping log.
    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::default();
        let mut aggregate: Vec<FuelPriceRecord> = Vec::new();

        for provider in &self.providers {
            let (outcome, records) = self.scrape_provider(provider).await;
            aggregate.extend(records);
            report.outcomes.push(outcome);
        }

        report.records_collected = aggregate.len();

        if aggregate.is_empty() {
            tracing::warn!("No prices scraped from any provider, skipping database update");
        } else {
            let summary = self.reconciler.reconcile(&aggregate).await;
            tracing::info!(
                upserted = summary.upserted,
                failed = summary.failed,
                providers_created = summary.providers_created,
                "Database update finished"
            );
            report.reconcile = Some(summary);
        }

        report
    }

    async fn scrape_provider(&self, provider: &ProviderSpec) -> (ProviderOutcome, Vec<FuelPriceRecord>) {
        let start_time = Instant::now();
        let mut outcome = ProviderOutcome {
            provider: provider.name.clone(),
            state: ProviderState::Pending,
            pairs_extracted: 0,
            records: 0,
            attempts: 0,
            error: None,
            elapsed_ms: 0,
        };

        tracing::info!(host = provider.host().as_deref().unwrap_or("-"), "Scraping {}...", provider.name);

        transition(&mut outcome, ProviderState::Fetching);
        let page = match self.fetch_with_retry(provider, &mut outcome.attempts).await {
            Ok(page) => page,
            Err(e) => {
                transition(&mut outcome, ProviderState::Failed);
                outcome.error = Some(e.to_string());
                outcome.elapsed_ms = start_time.elapsed().as_millis() as u64;
                tracing::error!("Error scraping {}: {}", provider.name, e);
                self.run_logger.error(&provider.name, e.to_string()).await;
                return (outcome, Vec::new());
            }
        };

        transition(&mut outcome, ProviderState::Extracting);
        let pairs = provider.extractor.extract(&page);
        let records = normalize_all(&provider.name, &pairs);
        outcome.pairs_extracted = pairs.len();
        outcome.records = records.len();

        transition(&mut outcome, ProviderState::Reconciling);
        tracing::info!("Found {} prices from {}", records.len(), provider.name);
        self.run_logger
            .success(&provider.name, format!("Scraped {} prices", records.len()))
            .await;

        transition(&mut outcome, ProviderState::Done);
        outcome.elapsed_ms = start_time.elapsed().as_millis() as u64;
        (outcome, records)
    }

    async fn fetch_with_retry(&self, provider: &ProviderSpec, attempts: &mut u32) -> Result<RenderedPage> {
        let strategy = FixedInterval::from_millis(self.retry.delay_ms).take(self.retry.attempts as usize);
        let fetcher = &self.fetcher;
        let counter = AtomicU32::new(0);

        let result = RetryIf::start(
            strategy,
            || {
                let attempt = counter.fetch_add(1, Ordering::Relaxed) + 1;
                if attempt > 1 {
                    tracing::warn!("Retrying {} (attempt {})", provider.name, attempt);
                }
                fetcher.fetch(&provider.url, &provider.profile)
            },
            AppError::is_navigation,
        )
        .await;

        *attempts = counter.into_inner();
        result
    }
}

fn transition(outcome: &mut ProviderOutcome, next: ProviderState) {
    tracing::debug!(provider = %outcome.provider, from = %outcome.state, to = %next, "Provider state changed");
    outcome.state = next;
}
