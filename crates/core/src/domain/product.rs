use crate::domain::asin::Asin;
use crate::ingest::types::RawProduct;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped price/rating observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub price: f64,
    pub rating: Option<f64>,
    pub scraped_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub asin: Asin,
    pub title: Option<String>,
    pub current_price: f64,
    pub current_rating: Option<f64>,
    pub image: Option<String>,
    pub url: Option<String>,
    pub scraped_at: DateTime<Utc>,
    /// Append-only, oldest first.
    pub history: Vec<PricePoint>,
}

impl PricePoint {
    pub fn from_record(record: &RawProduct, scraped_at: DateTime<Utc>) -> Self {
        Self {
            price: record.price,
            rating: record.rating,
            scraped_at,
        }
    }
}

impl Product {
    pub fn from_first_observation(record: &RawProduct, scraped_at: DateTime<Utc>) -> Self {
        Self {
            asin: record.asin.clone(),
            title: record.title.clone(),
            current_price: record.price,
            current_rating: record.rating,
            image: record.image.clone(),
            url: record.url.clone(),
            scraped_at,
            history: vec![PricePoint::from_record(record, scraped_at)],
        }
    }

    /// Appends one history entry and overwrites the current-state fields with the record's
    /// values. Prior history entries are left untouched.
    pub fn record_observation(&mut self, record: &RawProduct, scraped_at: DateTime<Utc>) {
        debug_assert_eq!(self.asin, record.asin);

        self.history.push(PricePoint::from_record(record, scraped_at));
        self.title = record.title.clone();
        self.current_price = record.price;
        self.current_rating = record.rating;
        self.image = record.image.clone();
        self.url = record.url.clone();
        self.scraped_at = scraped_at;
    }

    /// The observation immediately before the latest one, if any.
    pub fn previous_price_point(&self) -> Option<&PricePoint> {
        let n = self.history.len();
        if n < 2 {
            return None;
        }
        self.history.get(n - 2)
    }
}
