use super::*;
use fuelin_scraper::{
    models::{FuelPriceRecord, FuelType},
    reconciler::Reconciler,
    run_logger::RunLogger,
    store::PriceStore,
};

#[tokio::test]
async fn test_connect_creates_database_directory_and_schema() -> anyhow::Result<()> {
    let (dir, store) = create_test_store().await?;

    assert!(dir.path().join("data").join("fuelin.db").exists());
    assert!(store.list_providers().await?.is_empty());
    assert!(store.list_fuel_prices().await?.is_empty());
    assert!(store.recent_logs(10).await?.is_empty());

    store.close().await;
    Ok(())
}

#[tokio::test]
async fn test_migrations_are_idempotent() -> anyhow::Result<()> {
    let (_dir, store) = create_test_store().await?;

    store.migrate().await?;
    store.migrate().await?;

    Ok(())
}

#[tokio::test]
async fn test_reconcile_and_log_share_one_store() -> anyhow::Result<()> {
    let (_dir, store) = create_test_store().await?;
    let reconciler = Reconciler::new(store.clone());
    let logger = RunLogger::new(store.clone());

    reconciler
        .reconcile(&[FuelPriceRecord::new("Shell", "Shell V-Power", FuelType::Ron95, 14090)])
        .await;
    logger.success("Shell", "Scraped 1 prices").await;

    let freshness = store.provider_freshness().await?;
    assert_eq!(freshness.len(), 1);
    assert_eq!(freshness[0].price_count, 1);

    let logs = store.recent_logs(1).await?;
    assert_eq!(logs[0].message.as_deref(), Some("Scraped 1 prices"));

    Ok(())
}
