use crate::domain::asin::Asin;
use crate::domain::product::Product;
use crate::error::TrackerError;
use crate::ingest::Fetcher;
use crate::storage::scrape_runs::{ScrapeKind, ScrapeRun};
use crate::storage::ProductStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

pub const EMPTY_LISTING_MESSAGE: &str = "No data have been uploaded yet";

/// Result of the listing query. `Empty` is a data state, not a failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProductListing {
    Empty { message: String },
    #[serde(rename = "ok")]
    Products { products: Vec<Product> },
}

impl ProductListing {
    pub fn empty() -> Self {
        Self::Empty {
            message: EMPTY_LISTING_MESSAGE.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }

    pub fn into_products(self) -> Vec<Product> {
        match self {
            Self::Empty { .. } => Vec::new(),
            Self::Products { products } => products,
        }
    }
}

/// Validate, fetch, then upsert. One request at a time; no retries.
#[derive(Clone)]
pub struct PriceTracker {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn ProductStore>,
    scrape_limit: usize,
}

impl PriceTracker {
    pub fn new(fetcher: Arc<dyn Fetcher>, store: Arc<dyn ProductStore>, scrape_limit: usize) -> Self {
        Self {
            fetcher,
            store,
            scrape_limit: scrape_limit.max(1),
        }
    }

    pub async fn list_products(&self) -> Result<ProductListing, TrackerError> {
        let products = self
            .store
            .list_products()
            .await
            .map_err(TrackerError::Persistence)?;

        if products.is_empty() {
            Ok(ProductListing::empty())
        } else {
            Ok(ProductListing::Products { products })
        }
    }

    /// Fetches up to `scrape_limit` candidates and persists each one before the next.
    pub async fn scrape_search(&self, term: &str) -> Result<Vec<Product>, TrackerError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(TrackerError::Validation("Enter a search keyword".to_string()));
        }

        let started_at = Utc::now();
        let mut upserted = 0;
        let res = self.scrape_search_inner(term, &mut upserted).await;
        self.finish_run(ScrapeKind::Search, term, started_at, upserted, res.as_ref().err())
            .await;
        res
    }

    /// `upserted` counts writes as they land, so a failure partway still reports them.
    async fn scrape_search_inner(
        &self,
        term: &str,
        upserted: &mut usize,
    ) -> Result<Vec<Product>, TrackerError> {
        let candidates = self.fetcher.search(term, self.scrape_limit).await?;

        let mut out = Vec::with_capacity(candidates.len().min(self.scrape_limit));
        for record in candidates.iter().take(self.scrape_limit) {
            let product = self
                .store
                .upsert(record, Utc::now())
                .await
                .map_err(TrackerError::Persistence)?;
            *upserted += 1;
            tracing::debug!(asin = %product.asin, history_len = product.history.len(), "upserted product");
            out.push(product);
        }

        tracing::info!(term, backend = self.fetcher.backend_name(), upserted = out.len(), "search scrape finished");
        Ok(out)
    }

    /// Accepts a bare ASIN or an Amazon product URL. The format is checked before any fetch.
    pub async fn scrape_asin(&self, input: &str) -> Result<Product, TrackerError> {
        let asin = Asin::from_input(input)?;

        let started_at = Utc::now();
        let res = self.scrape_asin_inner(&asin).await;
        let upserted = usize::from(res.is_ok());
        self.finish_run(ScrapeKind::Asin, asin.as_str(), started_at, upserted, res.as_ref().err())
            .await;
        res
    }

    async fn scrape_asin_inner(&self, asin: &Asin) -> Result<Product, TrackerError> {
        let record = self
            .fetcher
            .fetch_by_asin(asin)
            .await?
            .ok_or_else(|| TrackerError::NotFound(format!("Product {asin} was not found")))?;

        let product = self
            .store
            .upsert(&record, Utc::now())
            .await
            .map_err(TrackerError::Persistence)?;

        tracing::info!(%asin, price = product.current_price, history_len = product.history.len(), "asin scrape finished");
        Ok(product)
    }

    async fn finish_run(
        &self,
        kind: ScrapeKind,
        query: &str,
        started_at: DateTime<Utc>,
        upserted: usize,
        error: Option<&TrackerError>,
    ) {
        if let Some(err) = error {
            tracing::warn!(kind = kind.as_str(), query, error_kind = err.kind(), error = %err, "scrape failed");
        }

        let run = ScrapeRun {
            id: uuid::Uuid::new_v4(),
            kind,
            query: query.to_string(),
            backend: self.fetcher.backend_name().to_string(),
            error: error.map(|e| e.to_string()),
            upserted: i32::try_from(upserted).unwrap_or(i32::MAX),
            started_at,
            finished_at: Utc::now(),
        };

        // Audit failures never change the outcome of the scrape itself.
        if let Err(err) = self.store.record_scrape_run(&run).await {
            tracing::warn!(run_id = %run.id, error = %err, "failed to record scrape run");
        }
    }
}
