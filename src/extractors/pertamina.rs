use crate::browser::RenderedPage;
use crate::extractors::{PriceExtractor, RawPrice, card_pairs};

const CARD: &str = ".price-item";
const NAME: &str = ".fuel-name";
const PRICE: &str = ".fuel-price";

/// MyPertamina lists each product as a card.
#[derive(Debug, Default, Clone)]
pub struct PertaminaExtractor;

impl PertaminaExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl PriceExtractor for PertaminaExtractor {
    fn name(&self) -> &str {
        "pertamina-cards"
    }

    fn extract(&self, page: &RenderedPage) -> Vec<RawPrice> {
        card_pairs(&page.document(), CARD, NAME, PRICE)
    }
}
