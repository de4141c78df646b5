use serde::{Deserialize, Serialize};
use std::fmt;

pub mod fuel_price;
pub mod scraping_log;

// Re-exports for convenience
pub use fuel_price::*;
pub use scraping_log::*;

/// Fuel grade taxonomy. Persisted as the display strings the rest of the
/// application already stores ("RON 90", "Diesel", ...).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
pub enum FuelType {
    #[serde(rename = "RON 90")]
    #[sqlx(rename = "RON 90")]
    Ron90,
    #[serde(rename = "RON 92")]
    #[sqlx(rename = "RON 92")]
    Ron92,
    #[serde(rename = "RON 95")]
    #[sqlx(rename = "RON 95")]
    Ron95,
    #[serde(rename = "RON 98")]
    #[sqlx(rename = "RON 98")]
    Ron98,
    #[serde(rename = "Diesel")]
    #[sqlx(rename = "Diesel")]
    Diesel,
}

impl FuelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Ron90 => "RON 90",
            FuelType::Ron92 => "RON 92",
            FuelType::Ron95 => "RON 95",
            FuelType::Ron98 => "RON 98",
            FuelType::Diesel => "Diesel",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT")]
pub enum LogStatus {
    #[sqlx(rename = "success")]
    Success,
    #[sqlx(rename = "error")]
    Error,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Success => "success",
            LogStatus::Error => "error",
        }
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
