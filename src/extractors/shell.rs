use crate::browser::RenderedPage;
use crate::extractors::{PriceExtractor, RawPrice, table_pairs};

const ROWS: &str = "table tr";

/// Shell Indonesia publishes a plain table: product name, then price.
#[derive(Debug, Default, Clone)]
pub struct ShellExtractor;

impl ShellExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl PriceExtractor for ShellExtractor {
    fn name(&self) -> &str {
        "shell-table"
    }

    fn extract(&self, page: &RenderedPage) -> Vec<RawPrice> {
        table_pairs(&page.document(), ROWS, 1, 0, 1)
    }
}
