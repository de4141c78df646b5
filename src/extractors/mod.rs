//! Provider-specific price extraction from rendered pages.
//!
//! Every extractor is a pure function of the page. Missing elements produce
//! no pairs and rows with neither a label nor a price are skipped; deciding
//! whether a pair is usable is left to the normalizer.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::browser::RenderedPage;

pub mod bp;
pub mod pertamina;
pub mod shell;

pub use bp::BpExtractor;
pub use pertamina::PertaminaExtractor;
pub use shell::ShellExtractor;

/// A `(label, price text)` pair exactly as it appears on the page, trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPrice {
    pub label: String,
    pub price_text: String,
}

impl RawPrice {
    pub fn new(label: impl Into<String>, price_text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            price_text: price_text.into(),
        }
    }

    fn is_blank(&self) -> bool {
        self.label.is_empty() && self.price_text.is_empty()
    }
}

pub trait PriceExtractor: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    /// Pairs in page order. Never fails.
    fn extract(&self, page: &RenderedPage) -> Vec<RawPrice>;
}

pub(crate) fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::warn!("Invalid CSS selector '{}': {:?}", selector, e);
            None
        }
    }
}

/// Concatenated text content, trimmed, like the DOM's `textContent.trim()`.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first_text(element: ElementRef<'_>, selector: &Selector) -> String {
    element
        .select(selector)
        .next()
        .map(element_text)
        .unwrap_or_default()
}

/// Card layouts: one container per fuel holding a name node and a price node.
pub(crate) fn card_pairs(document: &Html, container: &str, name: &str, price: &str) -> Vec<RawPrice> {
    let (Some(container), Some(name), Some(price)) =
        (parse_selector(container), parse_selector(name), parse_selector(price))
    else {
        return Vec::new();
    };

    document
        .select(&container)
        .map(|card| RawPrice::new(first_text(card, &name), first_text(card, &price)))
        .filter(|pair| !pair.is_blank())
        .collect()
}

/// Tabular layouts: the first `header_rows` rows are skipped, then the label
/// and price are read from fixed cell positions.
pub(crate) fn table_pairs(
    document: &Html,
    rows: &str,
    header_rows: usize,
    label_cell: usize,
    price_cell: usize,
) -> Vec<RawPrice> {
    let (Some(rows), Some(cell)) = (parse_selector(rows), parse_selector("td")) else {
        return Vec::new();
    };

    document
        .select(&rows)
        .skip(header_rows)
        .map(|row| {
            let cells: Vec<ElementRef<'_>> = row.select(&cell).collect();
            let text_at = |index: usize| cells.get(index).map(|c| element_text(*c)).unwrap_or_default();
            RawPrice::new(text_at(label_cell), text_at(price_cell))
        })
        .filter(|pair| !pair.is_blank())
        .collect()
}
