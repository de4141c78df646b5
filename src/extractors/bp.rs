use crate::browser::RenderedPage;
use crate::extractors::{PriceExtractor, RawPrice, table_pairs};

const ROWS: &str = ".price-table tr";

/// BP Indonesia wraps its price table in `.price-table`; other tables on the
/// page (station lists, promos) are ignored.
#[derive(Debug, Default, Clone)]
pub struct BpExtractor;

impl BpExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl PriceExtractor for BpExtractor {
    fn name(&self) -> &str {
        "bp-price-table"
    }

    fn extract(&self, page: &RenderedPage) -> Vec<RawPrice> {
        table_pairs(&page.document(), ROWS, 1, 0, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
            <table class="stations">
                <tr><th>SPBU</th><th>Kota</th></tr>
                <tr><td>BP Kemang</td><td>Jakarta</td></tr>
            </table>
            <div class="price-table">
                <table>
                    <tr><th>Produk</th><th>Harga</th></tr>
                    <tr><td>BP 92</td><td>Rp 12.260</td></tr>
                    <tr><td>BP Ultimate</td><td>Rp 12.920</td></tr>
                    <tr><td>BP Ultimate Diesel</td><td>Rp 13.420</td></tr>
                </table>
            </div>
        </body></html>
    "#;

    #[test]
    fn test_reads_only_price_table() {
        let page = RenderedPage::new("https://www.bp.com/id_id/", PAGE);
        let pairs = BpExtractor::new().extract(&page);

        assert_eq!(
            pairs,
            vec![
                RawPrice::new("BP 92", "Rp 12.260"),
                RawPrice::new("BP Ultimate", "Rp 12.920"),
                RawPrice::new("BP Ultimate Diesel", "Rp 13.420"),
            ]
        );
    }

    #[test]
    fn test_missing_table() {
        let page = RenderedPage::new("https://www.bp.com/id_id/", "<html><body></body></html>");
        assert!(BpExtractor::new().extract(&page).is_empty());
    }
}
