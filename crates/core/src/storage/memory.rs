use crate::domain::asin::Asin;
use crate::domain::product::Product;
use crate::ingest::types::RawProduct;
use crate::storage::scrape_runs::ScrapeRun;
use crate::storage::ProductStore;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// In-process store with the same upsert semantics as the Postgres one.
#[derive(Debug, Default)]
pub struct MemoryProductStore {
    products: Mutex<HashMap<Asin, Product>>,
    runs: Mutex<Vec<ScrapeRun>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, asin: &Asin) -> Option<Product> {
        self.products.lock().await.get(asin).cloned()
    }

    pub async fn scrape_runs(&self) -> Vec<ScrapeRun> {
        self.runs.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl ProductStore for MemoryProductStore {
    async fn upsert(
        &self,
        record: &RawProduct,
        scraped_at: DateTime<Utc>,
    ) -> anyhow::Result<Product> {
        let mut guard = self.products.lock().await;
        let product = guard
            .entry(record.asin.clone())
            .and_modify(|p| p.record_observation(record, scraped_at))
            .or_insert_with(|| Product::from_first_observation(record, scraped_at));
        Ok(product.clone())
    }

    async fn list_products(&self) -> anyhow::Result<Vec<Product>> {
        let mut out: Vec<Product> = self.products.lock().await.values().cloned().collect();
        out.sort_by(|a, b| {
            b.scraped_at
                .cmp(&a.scraped_at)
                .then_with(|| a.asin.cmp(&b.asin))
        });
        Ok(out)
    }

    async fn record_scrape_run(&self, run: &ScrapeRun) -> anyhow::Result<()> {
        self.runs.lock().await.push(run.clone());
        Ok(())
    }
}
