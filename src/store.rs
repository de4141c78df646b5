use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::models::{
    FuelPrice, FuelPriceKey, NewScrapingLog, Provider, ProviderFreshness, ScrapingLog,
};
use crate::utils::error::Result;

/// Persistent price store. Every call is atomic on its own and fails
/// independently of the others.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceStore: Send + Sync {
    async fn find_provider_by_name(&self, name: &str) -> Result<Option<Provider>>;

    /// Idempotent: returns the existing row when the name is taken.
    async fn create_provider(&self, name: &str) -> Result<Provider>;

    /// Inserts the row for `key` or overwrites its price and `updated_at`.
    async fn upsert_fuel_price(&self, key: &FuelPriceKey, price: i64) -> Result<FuelPrice>;

    async fn insert_scraping_log(&self, log: &NewScrapingLog) -> Result<ScrapingLog>;

    async fn list_providers(&self) -> Result<Vec<Provider>>;

    async fn list_fuel_prices(&self) -> Result<Vec<FuelPrice>>;

    /// Newest first.
    async fn recent_logs(&self, limit: u32) -> Result<Vec<ScrapingLog>>;

    async fn provider_freshness(&self) -> Result<Vec<ProviderFreshness>>;
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        ensure_parent_dir(&config.url)?;

        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout))
            .connect_with(options)
            .await?;

        let store = Self::new(pool);
        if config.run_migrations {
            store.migrate().await?;
        }

        tracing::debug!(url = %config.url, "Connected to price store");
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("Price store closed");
    }
}

/// SQLite will not create missing directories for a file database.
fn ensure_parent_dir(url: &str) -> Result<()> {
    let Some(path) = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")) else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return Ok(());
    }

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[async_trait]
impl PriceStore for SqliteStore {
    async fn find_provider_by_name(&self, name: &str) -> Result<Option<Provider>> {
        let provider = sqlx::query_as::<_, Provider>("SELECT id, name FROM providers WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(provider)
    }

    async fn create_provider(&self, name: &str) -> Result<Provider> {
        let provider = sqlx::query_as::<_, Provider>(
            r"
            INSERT INTO providers (name, created_at)
            VALUES (?, ?)
            ON CONFLICT (name) DO UPDATE SET name = excluded.name
            RETURNING id, name
            ",
        )
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(provider)
    }

    async fn upsert_fuel_price(&self, key: &FuelPriceKey, price: i64) -> Result<FuelPrice> {
        let row = sqlx::query_as::<_, FuelPrice>(
            r"
            INSERT INTO fuel_prices (provider_id, fuel_name, fuel_type, price, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (provider_id, fuel_name, fuel_type)
            DO UPDATE SET price = excluded.price, updated_at = excluded.updated_at
            RETURNING id, provider_id, fuel_name, fuel_type, price, updated_at
            ",
        )
        .bind(key.provider_id)
        .bind(&key.fuel_name)
        .bind(key.fuel_type)
        .bind(price)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn insert_scraping_log(&self, log: &NewScrapingLog) -> Result<ScrapingLog> {
        let row = sqlx::query_as::<_, ScrapingLog>(
            r"
            INSERT INTO scraping_logs (provider, status, message, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, provider, status, message, created_at
            ",
        )
        .bind(&log.provider)
        .bind(log.status)
        .bind(&log.message)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_providers(&self) -> Result<Vec<Provider>> {
        let rows = sqlx::query_as::<_, Provider>("SELECT id, name FROM providers ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn list_fuel_prices(&self) -> Result<Vec<FuelPrice>> {
        let rows = sqlx::query_as::<_, FuelPrice>(
            r"
            SELECT id, provider_id, fuel_name, fuel_type, price, updated_at
            FROM fuel_prices
            ORDER BY provider_id, fuel_name, fuel_type
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn recent_logs(&self, limit: u32) -> Result<Vec<ScrapingLog>> {
        let rows = sqlx::query_as::<_, ScrapingLog>(
            r"
            SELECT id, provider, status, message, created_at
            FROM scraping_logs
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn provider_freshness(&self) -> Result<Vec<ProviderFreshness>> {
        let rows = sqlx::query_as::<_, ProviderFreshness>(
            r"
            SELECT p.name AS provider,
                   COUNT(f.id) AS price_count,
                   MAX(f.updated_at) AS last_updated
            FROM providers p
            LEFT JOIN fuel_prices f ON f.provider_id = p.id
            GROUP BY p.id, p.name
            ORDER BY p.name
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
