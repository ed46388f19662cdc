use crate::domain::asin::Asin;
use crate::domain::product::{PricePoint, Product};
use crate::ingest::types::RawProduct;
use crate::storage::scrape_runs::{self, ScrapeRun};
use crate::storage::ProductStore;
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::types::Json;

type ProductRow = (
    String,
    Option<String>,
    f64,
    Option<f64>,
    Option<String>,
    Option<String>,
    DateTime<Utc>,
    Json<Vec<PricePoint>>,
);

const PRODUCT_COLUMNS: &str =
    "asin, title, current_price, current_rating, image, url, scraped_at, history";

#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: sqlx::PgPool,
}

impl PgProductStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}

fn product_from_row(row: ProductRow) -> anyhow::Result<Product> {
    let (asin, title, current_price, current_rating, image, url, scraped_at, history) = row;
    let asin = Asin::parse(&asin).with_context(|| format!("invalid asin in DB: {asin}"))?;
    Ok(Product {
        asin,
        title,
        current_price,
        current_rating,
        image,
        url,
        scraped_at,
        history: history.0,
    })
}

#[async_trait::async_trait]
impl ProductStore for PgProductStore {
    async fn upsert(
        &self,
        record: &RawProduct,
        scraped_at: DateTime<Utc>,
    ) -> anyhow::Result<Product> {
        let entry = vec![PricePoint::from_record(record, scraped_at)];

        // A single statement, so the conflict check and the history append are atomic per asin.
        let sql = format!(
            "INSERT INTO products (asin, title, current_price, current_rating, image, url, scraped_at, history) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (asin) DO UPDATE \
               SET title = EXCLUDED.title, \
                   current_price = EXCLUDED.current_price, \
                   current_rating = EXCLUDED.current_rating, \
                   image = EXCLUDED.image, \
                   url = EXCLUDED.url, \
                   scraped_at = EXCLUDED.scraped_at, \
                   history = products.history || EXCLUDED.history \
             RETURNING {PRODUCT_COLUMNS}"
        );

        let row: ProductRow = sqlx::query_as(&sql)
            .persistent(false)
            .bind(record.asin.as_str())
            .bind(&record.title)
            .bind(record.price)
            .bind(record.rating)
            .bind(&record.image)
            .bind(&record.url)
            .bind(scraped_at)
            .bind(Json(entry))
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("upsert products failed (asin={})", record.asin))?;

        product_from_row(row)
    }

    async fn list_products(&self) -> anyhow::Result<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY scraped_at DESC, asin ASC"
        );
        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .persistent(false)
            .fetch_all(&self.pool)
            .await
            .context("select products failed")?;

        rows.into_iter().map(product_from_row).collect()
    }

    async fn record_scrape_run(&self, run: &ScrapeRun) -> anyhow::Result<()> {
        scrape_runs::insert(&self.pool, run).await
    }
}
