use super::*;
use fuelin_scraper::{
    models::{FuelType, LogStatus},
    pipeline::{Pipeline, ProviderState, RetryPolicy},
    providers::{BP_URL, PERTAMINA_URL, SHELL_URL},
    store::PriceStore,
};

#[tokio::test]
async fn test_full_run_reconciles_every_provider() -> anyhow::Result<()> {
    let (_dir, store) = create_test_store().await?;
    let fetcher = Arc::new(FakeFetcher::all_providers());

    let pipeline = Pipeline::new(fetcher.clone(), store.clone(), test_providers(), RetryPolicy::NONE);
    let report = pipeline.run().await;

    assert_eq!(fetcher.visited(), vec![PERTAMINA_URL, SHELL_URL, BP_URL]);
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.records_collected, 4 + 4 + 3);

    let summary = report.reconcile.expect("reconcile should run");
    assert_eq!(summary.upserted, 11);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.providers_created, 3);

    let prices = store.list_fuel_prices().await?;
    assert_eq!(prices.len(), 11);

    let grade_of = |name: &str| prices.iter().find(|p| p.fuel_name == name).map(|p| p.fuel_type);
    assert_eq!(grade_of("Pertalite"), Some(FuelType::Ron90));
    assert_eq!(grade_of("Pertamax"), Some(FuelType::Ron92));
    assert_eq!(grade_of("Pertamax Turbo"), Some(FuelType::Ron98));
    assert_eq!(grade_of("Dexlite"), Some(FuelType::Diesel));
    assert_eq!(grade_of("Shell V-Power"), Some(FuelType::Ron95));
    assert_eq!(grade_of("Shell V-Power Nitro+"), Some(FuelType::Ron98));
    assert_eq!(grade_of("Shell V-Power Diesel"), Some(FuelType::Diesel));
    assert_eq!(grade_of("BP Ultimate"), Some(FuelType::Ron95));

    Ok(())
}

#[tokio::test]
async fn test_failed_provider_does_not_block_the_others() -> anyhow::Result<()> {
    let (_dir, store) = create_test_store().await?;
    let fetcher = FakeFetcher::new()
        .with_page(PERTAMINA_URL, PERTAMINA_PAGE)
        .with_page(BP_URL, BP_PAGE);

    let pipeline = Pipeline::new(Arc::new(fetcher), store.clone(), test_providers(), RetryPolicy::NONE);
    let report = pipeline.run().await;

    let states: Vec<ProviderState> = report.outcomes.iter().map(|o| o.state).collect();
    assert_eq!(states, vec![ProviderState::Done, ProviderState::Failed, ProviderState::Done]);
    assert_eq!(report.records_collected, 4 + 3);

    let providers = store.list_providers().await?;
    let mut names: Vec<&str> = providers.iter().map(|p| p.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["BP", "Pertamina"]);

    let prices = store.list_fuel_prices().await?;
    assert!(prices.iter().all(|p| !p.fuel_name.starts_with("Shell")));

    let logs = store.recent_logs(10).await?;
    assert_eq!(logs.len(), 3);
    assert_eq!(logs.iter().filter(|l| l.status == LogStatus::Success).count(), 2);

    let shell = logs.iter().find(|l| l.provider == "Shell").expect("shell log row");
    assert_eq!(shell.status, LogStatus::Error);
    assert!(shell.message.as_deref().unwrap_or_default().contains("Timeout 30000ms exceeded"));

    Ok(())
}

#[tokio::test]
async fn test_all_providers_failing_skips_reconcile() -> anyhow::Result<()> {
    let (_dir, store) = create_test_store().await?;

    let pipeline = Pipeline::new(Arc::new(FakeFetcher::new()), store.clone(), test_providers(), RetryPolicy::NONE);
    let report = pipeline.run().await;

    assert_eq!(report.failed(), 3);
    assert!(report.reconcile.is_none());
    assert!(store.list_providers().await?.is_empty());

    let logs = store.recent_logs(10).await?;
    assert_eq!(logs.len(), 3);
    assert!(logs.iter().all(|l| l.status == LogStatus::Error));

    Ok(())
}

#[tokio::test]
async fn test_second_run_updates_in_place() -> anyhow::Result<()> {
    let (_dir, store) = create_test_store().await?;

    let first = Pipeline::new(
        Arc::new(FakeFetcher::all_providers()),
        store.clone(),
        test_providers(),
        RetryPolicy::NONE,
    );
    first.run().await;

    let raised_shell = SHELL_PAGE.replace("Rp 14.090", "Rp 14.500");
    let fetcher = FakeFetcher::new()
        .with_page(PERTAMINA_URL, PERTAMINA_PAGE)
        .with_page(SHELL_URL, &raised_shell)
        .with_page(BP_URL, BP_PAGE);
    let second = Pipeline::new(Arc::new(fetcher), store.clone(), test_providers(), RetryPolicy::NONE);
    let report = second.run().await;

    assert_eq!(report.reconcile.map(|s| s.providers_created), Some(0));
    assert_eq!(store.list_providers().await?.len(), 3);

    let prices = store.list_fuel_prices().await?;
    assert_eq!(prices.len(), 11);
    let v_power = prices
        .iter()
        .find(|p| p.fuel_name == "Shell V-Power")
        .expect("V-Power row");
    assert_eq!(v_power.price, 14500);

    assert_eq!(store.recent_logs(100).await?.len(), 6);

    Ok(())
}
