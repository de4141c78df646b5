//! Keyword classification of free-text fuel labels into grades.

use crate::models::FuelType;

/// Rules are checked top to bottom and the first hit wins, so more specific
/// grades must stay above generic ones ("Pertamax Turbo" is RON 98, not 92).
const RULES: &[(FuelType, &[&str])] = &[
    (FuelType::Diesel, &["diesel", "dex", "solar"]),
    (FuelType::Ron98, &["98", "turbo", "nitro"]),
    (FuelType::Ron95, &["95", "v-power", "ultimate"]),
    (FuelType::Ron92, &["92", "pertamax", "super"]),
    (FuelType::Ron90, &["90", "pertalite"]),
];

/// Grade assumed for labels no rule recognises.
pub const FALLBACK_FUEL_TYPE: FuelType = FuelType::Ron92;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// A rule matched on `keyword`.
    Matched {
        fuel_type: FuelType,
        keyword: &'static str,
    },
    /// Nothing matched; the label is reported as `FALLBACK_FUEL_TYPE`.
    Fallback,
}

impl Classification {
    pub fn fuel_type(&self) -> FuelType {
        match self {
            Classification::Matched { fuel_type, .. } => *fuel_type,
            Classification::Fallback => FALLBACK_FUEL_TYPE,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Classification::Fallback)
    }
}

pub fn classify_label(label: &str) -> Classification {
    let label = label.to_lowercase();

    for (fuel_type, keywords) in RULES {
        if let Some(keyword) = keywords.iter().find(|k| label.contains(*k)) {
            return Classification::Matched {
                fuel_type: *fuel_type,
                keyword: *keyword,
            };
        }
    }

    Classification::Fallback
}

pub fn classify(label: &str) -> FuelType {
    classify_label(label).fuel_type()
}
