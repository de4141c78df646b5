use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::FuelType;

/// One normalized price scraped during a run. Never persisted as-is; the
/// reconciler turns it into a `FuelPrice` row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FuelPriceRecord {
    pub provider: String,
    pub fuel_name: String,
    pub fuel_type: FuelType,
    pub price: i64,
}

impl FuelPriceRecord {
    pub fn new(
        provider: impl Into<String>,
        fuel_name: impl Into<String>,
        fuel_type: FuelType,
        price: i64,
    ) -> Self {
        Self {
            provider: provider.into(),
            fuel_name: fuel_name.into(),
            fuel_type,
            price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Provider {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct FuelPrice {
    pub id: i64,
    pub provider_id: i64,
    pub fuel_name: String,
    pub fuel_type: FuelType,
    pub price: i64,
    pub updated_at: DateTime<Utc>,
}

/// Uniqueness key of a `FuelPrice` row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuelPriceKey {
    pub provider_id: i64,
    pub fuel_name: String,
    pub fuel_type: FuelType,
}

impl FuelPriceKey {
    pub fn for_record(provider_id: i64, record: &FuelPriceRecord) -> Self {
        Self {
            provider_id,
            fuel_name: record.fuel_name.clone(),
            fuel_type: record.fuel_type,
        }
    }
}

/// Latest price activity of one provider, as the admin status page shows it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ProviderFreshness {
    pub provider: String,
    pub price_count: i64,
    pub last_updated: Option<DateTime<Utc>>,
}
