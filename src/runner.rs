use std::sync::Arc;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::browser::BrowserLauncher;
use crate::config::AppConfig;
use crate::models::ProviderFreshness;
use crate::pipeline::{Pipeline, RetryPolicy, RunReport};
use crate::providers::default_providers;
use crate::store::PriceStore;
use crate::utils::error::Result;

/// One full scrape of every configured provider.
///
/// Fails only when the browser cannot be launched. Everything after that is
/// recovered per provider and reported in the returned `RunReport`. The
/// browser is released on every path once it has been launched.
pub async fn run_once<L: BrowserLauncher>(
    config: &AppConfig,
    store: Arc<dyn PriceStore>,
    launcher: &L,
) -> Result<RunReport> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("scrape_run", %run_id);

    async move {
        let start_time = Instant::now();
        tracing::info!("Starting fuel price scraping...");

        let fetcher = match launcher.launch(&config.scraper).await {
            Ok(fetcher) => Arc::new(fetcher),
            Err(e) => {
                tracing::error!("Fatal error: {}", e);
                return Err(e);
            }
        };

        let pipeline = Pipeline::new(
            fetcher.clone(),
            Arc::clone(&store),
            default_providers(&config.scraper),
            RetryPolicy::from_config(&config.scraper),
        );
        let report = pipeline.run().await;
        drop(pipeline);

        match Arc::try_unwrap(fetcher) {
            Ok(fetcher) => launcher.release(fetcher).await,
            Err(_) => tracing::warn!("Browser still referenced after run, dropping it"),
        }

        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            records = report.records_collected,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Scraping completed"
        );

        match serde_json::to_string(&report) {
            Ok(json) => tracing::debug!(report = %json, "Run report"),
            Err(e) => tracing::warn!("Failed to serialize run report: {}", e),
        }

        report_freshness(store.as_ref()).await;
        Ok(report)
    }
    .instrument(span)
    .await
}

/// Logs when each provider's prices were last refreshed. Best effort.
pub async fn report_freshness(store: &dyn PriceStore) -> Vec<ProviderFreshness> {
    match store.provider_freshness().await {
        Ok(rows) => {
            for row in &rows {
                match row.last_updated {
                    Some(at) => tracing::info!(
                        provider = %row.provider,
                        prices = row.price_count,
                        last_updated = %at.to_rfc3339(),
                        "Provider freshness"
                    ),
                    None => tracing::warn!(provider = %row.provider, "Provider has no prices yet"),
                }
            }
            rows
        }
        Err(e) => {
            tracing::warn!("Failed to load provider freshness: {}", e);
            Vec::new()
        }
    }
}
