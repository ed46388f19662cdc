//! Pure view derivations for the product dashboard: drop badges, chart series, search filtering
//! and card view models. Nothing here performs I/O.

pub mod state;

use crate::domain::asin::Asin;
use crate::domain::product::{PricePoint, Product};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceDrop {
    pub previous_price: f64,
    /// Absolute difference, rounded to cents.
    pub amount: f64,
}

impl PriceDrop {
    pub fn badge(&self) -> String {
        format!("↓ ${:.2} cheaper", self.amount)
    }
}

/// Compares the current price with the observation immediately before the latest one.
/// Single-entry histories never produce a drop.
pub fn price_drop(product: &Product) -> Option<PriceDrop> {
    let previous = product.previous_price_point()?;
    if product.current_price < previous.price {
        Some(PriceDrop {
            previous_price: previous.price,
            amount: round_cents(previous.price - product.current_price),
        })
    } else {
        None
    }
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub scraped_at: DateTime<Utc>,
    pub price: f64,
}

/// History is stored oldest first, so the series keeps storage order.
pub fn chart_series(history: &[PricePoint]) -> Vec<ChartPoint> {
    history
        .iter()
        .map(|h| ChartPoint {
            date: h.scraped_at.date_naive(),
            scraped_at: h.scraped_at,
            price: h.price,
        })
        .collect()
}

/// Case-insensitive substring match on title, ASIN or the current price as text.
pub fn matches_search(product: &Product, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }

    product
        .title
        .as_deref()
        .is_some_and(|t| t.to_lowercase().contains(&term))
        || product.asin.as_str().to_lowercase().contains(&term)
        || product.current_price.to_string().contains(&term)
}

pub fn filter_products<'a>(products: &'a [Product], term: &str) -> Vec<&'a Product> {
    products.iter().filter(|p| matches_search(p, term)).collect()
}

pub fn format_price(price: f64) -> String {
    format!("${price:.2}")
}

pub fn rating_label(rating: Option<f64>) -> String {
    match rating {
        Some(r) => format!("Rating: {r} / 5"),
        None => "Rating: N/A".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCard {
    pub asin: Asin,
    pub title: Option<String>,
    pub price_label: String,
    pub rating_label: String,
    pub image: Option<String>,
    pub url: Option<String>,
    pub drop: Option<PriceDrop>,
    pub drop_badge: Option<String>,
    /// Charts are offered once there are at least two observations.
    pub chart_available: bool,
    pub chart_open: bool,
    pub chart: Vec<ChartPoint>,
}

impl ProductCard {
    pub fn from_product(product: &Product, chart_open: bool) -> Self {
        let drop = price_drop(product);
        let chart_available = product.history.len() > 1;
        let chart_open = chart_open && chart_available;

        Self {
            asin: product.asin.clone(),
            title: product.title.clone(),
            price_label: format_price(product.current_price),
            rating_label: rating_label(product.current_rating),
            image: product.image.clone(),
            url: product.url.clone(),
            drop_badge: drop.as_ref().map(PriceDrop::badge),
            drop,
            chart_available,
            chart_open,
            chart: if chart_open {
                chart_series(&product.history)
            } else {
                Vec::new()
            },
        }
    }
}

/// Everything a renderer needs for one frame of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub search_term: String,
    pub total: usize,
    pub last_updated: Option<DateTime<Utc>>,
    pub cards: Vec<ProductCard>,
    pub empty_message: Option<String>,
    pub error: Option<String>,
    pub loading: bool,
}
