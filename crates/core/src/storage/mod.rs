pub mod memory;
pub mod products;
pub mod scrape_runs;

use crate::domain::product::Product;
use crate::ingest::types::RawProduct;
use anyhow::Context;
use chrono::{DateTime, Utc};
use scrape_runs::ScrapeRun;

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}

/// Persistent per-ASIN product records with embedded price history.
#[async_trait::async_trait]
pub trait ProductStore: Send + Sync {
    /// Creates the product on first sight, otherwise appends one history entry and overwrites
    /// the current-state fields. Atomic per ASIN.
    async fn upsert(&self, record: &RawProduct, scraped_at: DateTime<Utc>)
        -> anyhow::Result<Product>;

    /// All products, most recently scraped first.
    async fn list_products(&self) -> anyhow::Result<Vec<Product>>;

    async fn record_scrape_run(&self, run: &ScrapeRun) -> anyhow::Result<()>;
}
