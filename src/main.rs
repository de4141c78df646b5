use anyhow::{Context, Result};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use fuelin_scraper::browser::ChromeLauncher;
use fuelin_scraper::config::{AppConfig, LoggingConfig};
use fuelin_scraper::runner::run_once;
use fuelin_scraper::scheduler::ScrapeScheduler;
use fuelin_scraper::store::{PriceStore, SqliteStore};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match init_tracing(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialise logging: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Starting fuelin-scraper...");

    let store = match SqliteStore::connect(&config.database).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Fatal error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let shared: Arc<dyn PriceStore> = Arc::new(store.clone());
    let result = if config.scheduler.cron.is_some() {
        run_scheduled(config, shared).await
    } else {
        run_once(&config, shared, &ChromeLauncher).await.map(|_| ()).map_err(anyhow::Error::from)
    };

    store.close().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Fatal error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_scheduled(config: AppConfig, store: Arc<dyn PriceStore>) -> Result<()> {
    let mut scheduler = ScrapeScheduler::new(config, store)
        .await
        .context("Failed to create scheduler")?;
    scheduler.start().await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    scheduler.shutdown().await?;
    Ok(())
}

/// Console output always; a daily rolling file as well when a log directory
/// is configured. `RUST_LOG` wins over the configured filter.
fn init_tracing(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .context("Invalid log filter")?;

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)
                .with_context(|| format!("Failed to create log directory {}", directory))?;
            let appender = tracing_appender::rolling::daily(directory, "fuelin-scraper.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false).with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
