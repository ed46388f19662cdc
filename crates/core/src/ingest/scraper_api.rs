use crate::config::Settings;
use crate::domain::asin::Asin;
use crate::ingest::error::FetchError;
use crate::ingest::types::{is_usable_price, non_empty, parse_price, RawProduct};
use crate::ingest::{build_http_client, Fetcher};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const SEARCH_PATH: &str = "/structured/amazon/search";
const PRODUCT_PATH: &str = "/structured/amazon/product";

/// Third-party structured scraping API (ScraperAPI-compatible JSON endpoints).
#[derive(Debug, Clone)]
pub struct ScraperApiFetcher {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    product_base_url: String,
}

impl ScraperApiFetcher {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_scraper_api_key()?;
        let mut out = Self::new(
            &settings.scraper_api_base_url,
            api_key,
            Duration::from_secs(settings.fetch_timeout_secs),
        )?;
        out.product_base_url = settings.amazon_base_url.trim_end_matches('/').to_string();
        Ok(out)
    }

    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: build_http_client(timeout, None)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            product_base_url: crate::config::DEFAULT_AMAZON_BASE_URL.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let res = self
            .http
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let text = res.text().await?;
        serde_json::from_str::<T>(&text)
            .map(Some)
            .map_err(|e| FetchError::Parse(format!("scraper api {path}: {e}")))
    }

    fn product_url(&self, asin: &Asin) -> String {
        format!("{}/dp/{asin}", self.product_base_url)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceValue {
    Number(f64),
    Text(String),
}

impl PriceValue {
    fn amount(&self) -> Option<f64> {
        match self {
            Self::Number(n) => is_usable_price(*n).then_some(*n),
            Self::Text(s) => parse_price(s),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    asin: Option<String>,
    name: Option<String>,
    image: Option<String>,
    url: Option<String>,
    stars: Option<f64>,
    price: Option<PriceValue>,
    price_string: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    name: Option<String>,
    pricing: Option<PriceValue>,
    average_rating: Option<f64>,
    #[serde(default)]
    images: Vec<String>,
}

fn search_result_into_raw(r: SearchResult, product_base_url: &str) -> Option<RawProduct> {
    let asin = Asin::parse(r.asin.as_deref()?).ok()?;
    let price = r
        .price
        .as_ref()
        .and_then(PriceValue::amount)
        .or_else(|| r.price_string.as_deref().and_then(parse_price))?;
    let url = non_empty(r.url).or_else(|| Some(format!("{product_base_url}/dp/{asin}")));

    Some(RawProduct {
        title: non_empty(r.name),
        price,
        rating: r.stars.filter(|s| (0.0..=5.0).contains(s)),
        image: non_empty(r.image),
        url,
        asin,
    })
}

#[async_trait::async_trait]
impl Fetcher for ScraperApiFetcher {
    fn backend_name(&self) -> &'static str {
        "scraper_api"
    }

    async fn search(&self, term: &str, limit: usize) -> Result<Vec<RawProduct>, FetchError> {
        let resp = self
            .get_json::<SearchResponse>(SEARCH_PATH, &[("query", term)])
            .await?
            .ok_or(FetchError::NoResults)?;

        let mut items: Vec<RawProduct> = Vec::new();
        for r in resp.results {
            if items.len() >= limit {
                break;
            }
            let Some(item) = search_result_into_raw(r, &self.product_base_url) else {
                continue;
            };
            if items.iter().any(|i| i.asin == item.asin) {
                continue;
            }
            items.push(item);
        }

        if items.is_empty() {
            return Err(FetchError::NoResults);
        }
        Ok(items)
    }

    async fn fetch_by_asin(&self, asin: &Asin) -> Result<Option<RawProduct>, FetchError> {
        let Some(resp) = self
            .get_json::<ProductResponse>(PRODUCT_PATH, &[("asin", asin.as_str())])
            .await?
        else {
            return Ok(None);
        };

        let Some(price) = resp.pricing.as_ref().and_then(PriceValue::amount) else {
            tracing::debug!(%asin, "scraper api product has no price");
            return Ok(None);
        };

        Ok(Some(RawProduct {
            asin: asin.clone(),
            title: non_empty(resp.name),
            price,
            rating: resp.average_rating.filter(|s| (0.0..=5.0).contains(s)),
            image: non_empty(resp.images.into_iter().next()),
            url: Some(self.product_url(asin)),
        }))
    }
}
