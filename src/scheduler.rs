use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::browser::ChromeLauncher;
use crate::config::AppConfig;
use crate::pipeline::RunReport;
use crate::runner::run_once;
use crate::store::PriceStore;
use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub run_count: u64,
    pub skipped_count: u64,
    pub fatal_count: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Runs the scrape on a cron schedule. A tick that fires while the previous
/// run is still going is skipped.
pub struct ScrapeScheduler {
    scheduler: JobScheduler,
    cron: String,
    stats: Arc<RwLock<SchedulerStats>>,
    // Held for the whole of a scrape.
    running: Arc<Mutex<()>>,
}

impl ScrapeScheduler {
    pub async fn new(config: AppConfig, store: Arc<dyn PriceStore>) -> Result<Self> {
        let cron = config
            .scheduler
            .cron
            .clone()
            .ok_or_else(|| AppError::Scheduler("No cron expression configured".to_string()))?;

        let scheduler = JobScheduler::new().await?;
        let stats = Arc::new(RwLock::new(SchedulerStats::default()));
        let running = Arc::new(Mutex::new(()));
        let config = Arc::new(config);

        let job_stats = Arc::clone(&stats);
        let job_running = Arc::clone(&running);
        let job = Job::new_async(cron.as_str(), move |_uuid, _l| {
            let config = Arc::clone(&config);
            let store = Arc::clone(&store);
            let stats = Arc::clone(&job_stats);
            let running = Arc::clone(&job_running);

            Box::pin(async move {
                let Ok(_guard) = running.try_lock() else {
                    tracing::warn!("Previous scrape still running, skipping this tick");
                    stats.write().await.skipped_count += 1;
                    return;
                };

                let result = run_once(&config, store, &ChromeLauncher).await;
                record_run(&stats, &result).await;
            })
        })?;

        scheduler.add(job).await?;

        Ok(Self {
            scheduler,
            cron,
            stats,
            running,
        })
    }

    pub fn cron(&self) -> &str {
        &self.cron
    }

    pub async fn start(&self) -> Result<()> {
        self.scheduler.start().await?;
        tracing::info!("Scrape scheduler started with schedule: {}", self.cron);
        Ok(())
    }

    /// Stops new ticks, then waits for a scrape in progress to finish so the
    /// store can be closed safely afterwards.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler.shutdown().await?;

        if self.running.try_lock().is_err() {
            tracing::info!("Waiting for the running scrape to finish...");
        }
        let _guard = self.running.lock().await;

        tracing::info!("Scrape scheduler shutdown");
        Ok(())
    }

    pub async fn stats(&self) -> SchedulerStats {
        self.stats.read().await.clone()
    }
}

async fn record_run(stats: &RwLock<SchedulerStats>, result: &Result<RunReport>) {
    let mut stats = stats.write().await;
    stats.run_count += 1;
    stats.last_run = Some(Utc::now());

    match result {
        Ok(report) => {
            stats.last_error = None;
            tracing::info!(
                "Scheduled scrape finished: {} succeeded, {} failed",
                report.succeeded(),
                report.failed()
            );
        }
        Err(e) => {
            stats.fatal_count += 1;
            stats.last_error = Some(e.to_string());
            tracing::error!("Scheduled scrape aborted: {}", e);
        }
    }
}
