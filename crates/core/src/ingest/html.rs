use crate::config::Settings;
use crate::domain::asin::Asin;
use crate::ingest::error::FetchError;
use crate::ingest::types::{is_usable_price, non_empty, parse_price, parse_rating, RawProduct};
use crate::ingest::{build_http_client, Fetcher};
use reqwest::header::ACCEPT_LANGUAGE;
use reqwest::StatusCode;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::time::Duration;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Scrapes the marketplace's own search and product pages.
#[derive(Debug, Clone)]
pub struct HtmlFetcher {
    http: reqwest::Client,
    base_url: String,
}

impl HtmlFetcher {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(
            &settings.amazon_base_url,
            Duration::from_secs(settings.fetch_timeout_secs),
        )
    }

    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: build_http_client(timeout, Some(USER_AGENT))?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_page(&self, url: &str, query: &[(&str, &str)]) -> Result<Option<String>, FetchError> {
        let res = self
            .http
            .get(url)
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
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
        Ok(Some(res.text().await?))
    }
}

#[async_trait::async_trait]
impl Fetcher for HtmlFetcher {
    fn backend_name(&self) -> &'static str {
        "html"
    }

    async fn search(&self, term: &str, limit: usize) -> Result<Vec<RawProduct>, FetchError> {
        let url = format!("{}/s", self.base_url);
        let body = self
            .get_page(&url, &[("k", term)])
            .await?
            .ok_or(FetchError::NoResults)?;

        let items = parse_search_results(&body, &self.base_url, limit)?;
        tracing::debug!(term, items = items.len(), "parsed search results page");
        if items.is_empty() {
            return Err(FetchError::NoResults);
        }
        Ok(items)
    }

    async fn fetch_by_asin(&self, asin: &Asin) -> Result<Option<RawProduct>, FetchError> {
        let url = product_url(&self.base_url, asin);
        let Some(body) = self.get_page(&url, &[]).await? else {
            return Ok(None);
        };
        parse_product_page(&body, asin, &self.base_url)
    }
}

fn product_url(base_url: &str, asin: &Asin) -> String {
    format!("{base_url}/dp/{asin}")
}

fn selector(s: &str) -> Result<Selector, FetchError> {
    Selector::parse(s).map_err(|_| FetchError::Parse(format!("invalid selector {s}")))
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ").trim().to_string()
}

fn first_text(scope: ElementRef<'_>, sel: &Selector) -> Option<String> {
    scope
        .select(sel)
        .map(text_of)
        .find(|s| !s.is_empty())
}

fn split_price(scope: ElementRef<'_>, whole: &Selector, fraction: &Selector) -> Option<f64> {
    let whole: String = first_text(scope, whole)?
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    let fraction: String = first_text(scope, fraction)?
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    if whole.is_empty() || fraction.is_empty() {
        return None;
    }
    let v: f64 = format!("{whole}.{fraction}").parse().ok()?;
    is_usable_price(v).then_some(v)
}

pub(crate) fn parse_search_results(
    html: &str,
    base_url: &str,
    limit: usize,
) -> Result<Vec<RawProduct>, FetchError> {
    let doc = Html::parse_document(html);

    let item_sel = selector(".s-result-item[data-asin]")?;
    let title_sel = selector("h2")?;
    let whole_sel = selector(".a-price-whole")?;
    let fraction_sel = selector(".a-price-fraction")?;
    let offscreen_sel = selector(".a-price .a-offscreen")?;
    let rating_sel = selector(".a-icon-alt")?;
    let image_sel = selector("img.s-image")?;

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for el in doc.select(&item_sel) {
        if out.len() >= limit {
            break;
        }

        let Some(asin) = el
            .value()
            .attr("data-asin")
            .and_then(|a| Asin::parse(a).ok())
        else {
            continue;
        };
        let price = split_price(el, &whole_sel, &fraction_sel)
            .or_else(|| first_text(el, &offscreen_sel).and_then(|s| parse_price(&s)));
        let Some(price) = price else {
            continue;
        };
        if !seen.insert(asin.clone()) {
            continue;
        }

        out.push(RawProduct {
            url: Some(product_url(base_url, &asin)),
            title: non_empty(first_text(el, &title_sel)),
            price,
            rating: first_text(el, &rating_sel).and_then(|s| parse_rating(&s)),
            image: non_empty(
                el.select(&image_sel)
                    .next()
                    .and_then(|img| img.value().attr("src"))
                    .map(str::to_string),
            ),
            asin,
        });
    }

    Ok(out)
}

pub(crate) fn parse_product_page(
    html: &str,
    asin: &Asin,
    base_url: &str,
) -> Result<Option<RawProduct>, FetchError> {
    let doc = Html::parse_document(html);
    let root = doc.root_element();

    let title_sel = selector("#productTitle")?;
    let core_price_sel = selector("#corePrice_feature_div .a-offscreen")?;
    let offscreen_sel = selector(".a-price .a-offscreen")?;
    let whole_sel = selector(".a-price-whole")?;
    let fraction_sel = selector(".a-price-fraction")?;
    let popover_sel = selector("#acrPopover")?;
    let rating_sel = selector(".a-icon-alt")?;
    let image_sel = selector("#landingImage")?;

    let price = first_text(root, &core_price_sel)
        .and_then(|s| parse_price(&s))
        .or_else(|| first_text(root, &offscreen_sel).and_then(|s| parse_price(&s)))
        .or_else(|| split_price(root, &whole_sel, &fraction_sel));
    let Some(price) = price else {
        tracing::debug!(%asin, "product page has no parsable price");
        return Ok(None);
    };

    let rating = root
        .select(&popover_sel)
        .next()
        .and_then(|el| el.value().attr("title"))
        .and_then(parse_rating)
        .or_else(|| first_text(root, &rating_sel).and_then(|s| parse_rating(&s)));

    let image = root.select(&image_sel).next().and_then(|img| {
        img.value()
            .attr("data-old-hires")
            .filter(|s| !s.is_empty())
            .or_else(|| img.value().attr("src"))
            .map(str::to_string)
    });

    Ok(Some(RawProduct {
        asin: asin.clone(),
        title: non_empty(first_text(root, &title_sel)),
        price,
        rating,
        image: non_empty(image),
        url: Some(product_url(base_url, asin)),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SEARCH_PAGE: &str = r#"
        <html><body>
          <div class="s-result-item" data-asin="">sponsored header</div>
          <div class="s-result-item" data-asin="B000000001">
            <h2><span>Steel Water Bottle</span></h2>
            <span class="a-price"><span class="a-offscreen">$24.99</span>
              <span class="a-price-whole">24.</span><span class="a-price-fraction">99</span></span>
            <i class="a-icon-star"><span class="a-icon-alt">4.6 out of 5 stars</span></i>
            <img class="s-image" src="https://m.media-amazon.com/images/I/bottle.jpg"/>
          </div>
          <div class="s-result-item" data-asin="B000000002">
            <h2><span>Out of stock bottle</span></h2>
          </div>
          <div class="s-result-item" data-asin="B000000003">
            <h2><span>Glass Bottle</span></h2>
            <span class="a-price"><span class="a-offscreen">$1,019.50</span></span>
          </div>
          <div class="s-result-item" data-asin="B000000001">
            <h2><span>Steel Water Bottle (dup)</span></h2>
            <span class="a-price-whole">24.</span><span class="a-price-fraction">99</span>
          </div>
        </body></html>
    "#;

    const PRODUCT_PAGE: &str = r#"
        <html><body>
          <span id="productTitle">   Noise Cancelling Headphones   </span>
          <div id="corePrice_feature_div">
            <span class="a-price"><span class="a-offscreen">$199.00</span></span>
          </div>
          <span id="acrPopover" title="4.7 out of 5 stars"></span>
          <img id="landingImage" data-old-hires="https://img.example/hires.jpg" src="https://img.example/small.jpg"/>
        </body></html>
    "#;

    #[test]
    fn parses_search_results_and_skips_unusable_items() {
        let items = parse_search_results(SEARCH_PAGE, "https://www.amazon.com", 10).unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].asin.as_str(), "B000000001");
        assert_eq!(items[0].title.as_deref(), Some("Steel Water Bottle"));
        assert_eq!(items[0].price, 24.99);
        assert_eq!(items[0].rating, Some(4.6));
        assert_eq!(
            items[0].url.as_deref(),
            Some("https://www.amazon.com/dp/B000000001")
        );
        assert!(items[0].image.is_some());

        assert_eq!(items[1].asin.as_str(), "B000000003");
        assert_eq!(items[1].price, 1019.5);
        assert_eq!(items[1].rating, None);
    }

    #[test]
    fn search_results_respect_limit() {
        let items = parse_search_results(SEARCH_PAGE, "https://www.amazon.com", 1).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn parses_product_page() {
        let asin = Asin::parse("B07VGRJDFY").unwrap();
        let p = parse_product_page(PRODUCT_PAGE, &asin, "https://www.amazon.com")
            .unwrap()
            .unwrap();
        assert_eq!(p.title.as_deref(), Some("Noise Cancelling Headphones"));
        assert_eq!(p.price, 199.0);
        assert_eq!(p.rating, Some(4.7));
        assert_eq!(p.image.as_deref(), Some("https://img.example/hires.jpg"));
    }

    #[test]
    fn product_page_without_price_is_not_found() {
        let asin = Asin::parse("B07VGRJDFY").unwrap();
        let html = r#"<html><body><span id="productTitle">Captcha</span></body></html>"#;
        assert!(parse_product_page(html, &asin, "https://www.amazon.com")
            .unwrap()
            .is_none());
    }

    #[test]
    fn zero_prices_are_not_observations() {
        let asin = Asin::parse("B07VGRJDFY").unwrap();
        let html = r#"<html><body>
            <span id="productTitle">Unavailable</span>
            <span class="a-price"><span class="a-offscreen">$0.00</span></span>
        </body></html>"#;
        assert!(parse_product_page(html, &asin, "https://www.amazon.com")
            .unwrap()
            .is_none());

        let search = r#"<div class="s-result-item" data-asin="B000000001">
            <h2>Free sample</h2>
            <span class="a-price-whole">0.</span><span class="a-price-fraction">00</span>
        </div>"#;
        assert!(parse_search_results(search, "https://www.amazon.com", 10)
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn search_hits_search_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/s"))
            .and(query_param("k", "water bottle"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_PAGE))
            .mount(&server)
            .await;

        let fetcher = HtmlFetcher::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let items = fetcher.search("water bottle", 10).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0]
            .url
            .as_deref()
            .unwrap()
            .starts_with(&server.uri()));
    }

    #[tokio::test]
    async fn empty_search_page_is_no_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/s"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let fetcher = HtmlFetcher::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let err = fetcher.search("nothing", 10).await.unwrap_err();
        assert!(matches!(err, FetchError::NoResults));
    }

    #[tokio::test]
    async fn product_404_is_not_found_and_503_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dp/B000000404"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/dp/B000000503"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HtmlFetcher::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let missing = Asin::parse("B000000404").unwrap();
        assert!(fetcher.fetch_by_asin(&missing).await.unwrap().is_none());

        let broken = Asin::parse("B000000503").unwrap();
        let err = fetcher.fetch_by_asin(&broken).await.unwrap_err();
        assert!(matches!(err, FetchError::Http { status: 503 }));
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dp/B07VGRJDFY"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(PRODUCT_PAGE)
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let fetcher = HtmlFetcher::new(&server.uri(), Duration::from_millis(50)).unwrap();
        let asin = Asin::parse("B07VGRJDFY").unwrap();
        let err = fetcher.fetch_by_asin(&asin).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout));
    }
}
