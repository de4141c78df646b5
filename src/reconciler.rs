use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{FuelPriceKey, FuelPriceRecord, Provider};
use crate::store::PriceStore;
use crate::utils::error::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub upserted: usize,
    pub failed: usize,
    pub providers_created: usize,
}

/// Writes scraped prices into the store, one independent upsert per record.
pub struct Reconciler {
    store: Arc<dyn PriceStore>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn PriceStore>) -> Self {
        Self { store }
    }

    /// A failing record is reported and skipped; the remaining records are
    /// still written.
    pub async fn reconcile(&self, records: &[FuelPriceRecord]) -> ReconcileSummary {
        tracing::info!("Updating database with {} prices", records.len());

        let mut summary = ReconcileSummary::default();
        let mut provider_ids: HashMap<String, i64> = HashMap::new();

        for record in records {
            match self.reconcile_one(record, &mut provider_ids, &mut summary).await {
                Ok(()) => {
                    summary.upserted += 1;
                    tracing::debug!(
                        "Updated: {} - {} ({}) @ Rp {}",
                        record.provider,
                        record.fuel_name,
                        record.fuel_type,
                        record.price
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(
                        "Failed to update {} - {}: {}",
                        record.provider,
                        record.fuel_name,
                        e
                    );
                }
            }
        }

        summary
    }

    async fn reconcile_one(
        &self,
        record: &FuelPriceRecord,
        provider_ids: &mut HashMap<String, i64>,
        summary: &mut ReconcileSummary,
    ) -> Result<()> {
        let provider_id = match provider_ids.get(&record.provider) {
            Some(id) => *id,
            None => {
                let provider = self.ensure_provider(&record.provider, summary).await?;
                provider_ids.insert(provider.name.clone(), provider.id);
                provider.id
            }
        };

        let key = FuelPriceKey::for_record(provider_id, record);
        self.store.upsert_fuel_price(&key, record.price).await?;
        Ok(())
    }

    async fn ensure_provider(&self, name: &str, summary: &mut ReconcileSummary) -> Result<Provider> {
        if let Some(provider) = self.store.find_provider_by_name(name).await? {
            return Ok(provider);
        }

        let provider = self.store.create_provider(name).await?;
        summary.providers_created += 1;
        tracing::info!("Registered new provider {}", provider.name);
        Ok(provider)
    }
}
