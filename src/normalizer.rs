use regex::Regex;
use std::sync::LazyLock;

use crate::classifier::classify_label;
use crate::extractors::RawPrice;
use crate::models::FuelPriceRecord;

static NON_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9]").expect("static regex"));

/// Reads "Rp 10.000" style price text as whole currency units. Thousands
/// separators and currency marks are simply dropped.
pub fn parse_price(raw: &str) -> Option<i64> {
    let digits = NON_DIGITS.replace_all(raw, "");
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok()
}

/// Returns `None` for pairs that cannot become a record: an empty label or
/// price text without a usable number.
pub fn normalize(provider: &str, label: &str, raw_price: &str) -> Option<FuelPriceRecord> {
    let label = label.trim();
    if label.is_empty() {
        return None;
    }

    let price = match parse_price(raw_price) {
        Some(price) => price,
        None => {
            tracing::debug!(provider, label, raw_price, "Dropping unparseable price");
            return None;
        }
    };

    let classification = classify_label(label);
    if classification.is_fallback() {
        tracing::debug!(
            provider,
            label,
            fuel_type = %classification.fuel_type(),
            "No grade keyword matched, using fallback grade"
        );
    }

    Some(FuelPriceRecord::new(provider, label, classification.fuel_type(), price))
}

pub fn normalize_all(provider: &str, pairs: &[RawPrice]) -> Vec<FuelPriceRecord> {
    pairs
        .iter()
        .filter_map(|pair| normalize(provider, &pair.label, &pair.price_text))
        .collect()
}
