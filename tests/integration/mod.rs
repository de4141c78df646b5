// Integration tests for fuelin-scraper
// These run the whole pipeline against recorded provider pages and a real
// SQLite database; no browser is started.

pub mod pipeline_tests;
pub mod store_tests;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use fuelin_scraper::{
    AppError,
    browser::{FetchProfile, PageFetcher, RenderedPage, WaitUntil},
    config::DatabaseConfig,
    extractors::{BpExtractor, PertaminaExtractor, ShellExtractor},
    providers::{BP_URL, PERTAMINA_URL, ProviderSpec, SHELL_URL},
    store::SqliteStore,
};

pub const PERTAMINA_PAGE: &str = r#"
<html><body>
  <section class="product-price">
    <div class="price-item"><h4 class="fuel-name">Pertalite</h4><p class="fuel-price">Rp 10.000</p></div>
    <div class="price-item"><h4 class="fuel-name">Pertamax</h4><p class="fuel-price">Rp 12.500</p></div>
    <div class="price-item"><h4 class="fuel-name">Pertamax Turbo</h4><p class="fuel-price">Rp14.400</p></div>
    <div class="price-item"><h4 class="fuel-name">Dexlite</h4><p class="fuel-price">Rp 13.250</p></div>
    <div class="price-item"><h4 class="fuel-name"></h4><p class="fuel-price">Rp 9.000</p></div>
  </section>
</body></html>
"#;

pub const SHELL_PAGE: &str = r#"
<html><body>
  <table>
    <tr><th>Produk</th><th>Harga per liter</th></tr>
    <tr><td>Shell Super</td><td>Rp 12.290</td></tr>
    <tr><td>Shell V-Power</td><td>Rp 14.090</td></tr>
    <tr><td>Shell V-Power Nitro+</td><td>Rp 14.340</td></tr>
    <tr><td>Shell V-Power Diesel</td><td>Rp 14.320</td></tr>
  </table>
</body></html>
"#;

pub const BP_PAGE: &str = r#"
<html><body>
  <table class="price-table">
    <tr><th>Produk</th><th>Harga</th></tr>
    <tr><td>BP 92</td><td>Rp 12.260</td></tr>
    <tr><td>BP Ultimate</td><td>Rp 14.090</td></tr>
    <tr><td>BP Ultimate Diesel</td><td>Rp 14.320</td></tr>
  </table>
</body></html>
"#;

/// Recorded pages keyed by URL. Unknown URLs fail like a navigation timeout.
pub struct FakeFetcher {
    pages: HashMap<String, String>,
    visited: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            visited: Mutex::new(Vec::new()),
        }
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn all_providers() -> Self {
        Self::new()
            .with_page(PERTAMINA_URL, PERTAMINA_PAGE)
            .with_page(SHELL_URL, SHELL_PAGE)
            .with_page(BP_URL, BP_PAGE)
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str, _profile: &FetchProfile) -> fuelin_scraper::Result<RenderedPage> {
        self.visited.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some(html) => Ok(RenderedPage::new(url, html.clone())),
            None => Err(AppError::navigation(url, "Timeout 30000ms exceeded")),
        }
    }
}

pub fn test_profile() -> FetchProfile {
    FetchProfile {
        wait_until: WaitUntil::NetworkIdle,
        timeout: Duration::from_secs(30),
        idle_window: Duration::from_millis(500),
        settle_delay: Duration::ZERO,
    }
}

/// Same table as production, without the settle delay.
pub fn test_providers() -> Vec<ProviderSpec> {
    vec![
        ProviderSpec::new("Pertamina", PERTAMINA_URL, test_profile(), Box::new(PertaminaExtractor::new())),
        ProviderSpec::new("Shell", SHELL_URL, test_profile(), Box::new(ShellExtractor::new())),
        ProviderSpec::new("BP", BP_URL, test_profile(), Box::new(BpExtractor::new())),
    ]
}

pub async fn create_test_store() -> anyhow::Result<(TempDir, Arc<SqliteStore>)> {
    let dir = tempfile::tempdir()?;
    let config = DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("data").join("fuelin.db").display()),
        max_connections: 2,
        min_connections: 1,
        acquire_timeout: 10,
        run_migrations: true,
    };

    let store = SqliteStore::connect(&config).await?;
    Ok((dir, Arc::new(store)))
}
