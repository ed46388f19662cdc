pub mod error;
pub mod html;
pub mod scraper_api;
pub mod types;

use crate::config::{FetchBackend, Settings};
use crate::domain::asin::Asin;
use error::FetchError;
use std::sync::Arc;
use std::time::Duration;
use types::RawProduct;

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Up to `limit` candidates for a search term. Candidates without an ASIN or price are
    /// dropped; an empty result is [`FetchError::NoResults`].
    async fn search(&self, term: &str, limit: usize) -> Result<Vec<RawProduct>, FetchError>;

    /// `Ok(None)` means the marketplace has no such product.
    async fn fetch_by_asin(&self, asin: &Asin) -> Result<Option<RawProduct>, FetchError>;
}

pub fn fetcher_from_settings(settings: &Settings) -> anyhow::Result<Arc<dyn Fetcher>> {
    let fetcher: Arc<dyn Fetcher> = match settings.fetch_backend {
        FetchBackend::Html => Arc::new(html::HtmlFetcher::from_settings(settings)?),
        FetchBackend::ScraperApi => {
            Arc::new(scraper_api::ScraperApiFetcher::from_settings(settings)?)
        }
    };
    tracing::info!(backend = fetcher.backend_name(), "fetch backend selected");
    Ok(fetcher)
}

pub(crate) fn build_http_client(
    timeout: Duration,
    user_agent: Option<&str>,
) -> anyhow::Result<reqwest::Client> {
    use anyhow::Context;

    let mut builder = reqwest::Client::builder().timeout(timeout);
    if let Some(ua) = user_agent {
        builder = builder.user_agent(ua);
    }
    builder.build().context("failed to build fetcher http client")
}
