pub mod dashboard;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod storage;
pub mod tracker;

pub mod config {
    use anyhow::Context;

    pub const DEFAULT_PORT: u16 = 3001;
    pub const DEFAULT_SCRAPE_LIMIT: usize = 10;
    pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;
    pub const DEFAULT_AMAZON_BASE_URL: &str = "https://www.amazon.com";
    pub const DEFAULT_SCRAPER_API_BASE_URL: &str = "https://api.scraperapi.com";

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum FetchBackend {
        Html,
        ScraperApi,
    }

    impl FetchBackend {
        pub fn parse(s: &str) -> anyhow::Result<Self> {
            match s.trim().to_ascii_lowercase().as_str() {
                "" | "html" => Ok(Self::Html),
                "scraper_api" | "scraperapi" => Ok(Self::ScraperApi),
                other => anyhow::bail!("unknown FETCH_BACKEND {other:?} (expected html or scraper_api)"),
            }
        }
    }

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub port: u16,
        pub sentry_dsn: Option<String>,
        pub fetch_backend: FetchBackend,
        pub amazon_base_url: String,
        pub scraper_api_base_url: String,
        pub scraper_api_key: Option<String>,
        pub fetch_timeout_secs: u64,
        pub scrape_limit: usize,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let fetch_backend = match std::env::var("FETCH_BACKEND") {
                Ok(v) => FetchBackend::parse(&v)?,
                Err(_) => FetchBackend::Html,
            };

            Ok(Self {
                database_url: non_empty_var("DATABASE_URL"),
                port: parsed_var("PORT").unwrap_or(DEFAULT_PORT),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                fetch_backend,
                amazon_base_url: non_empty_var("AMAZON_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_AMAZON_BASE_URL.to_string()),
                scraper_api_base_url: non_empty_var("SCRAPER_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_SCRAPER_API_BASE_URL.to_string()),
                scraper_api_key: non_empty_var("SCRAPER_API_KEY"),
                fetch_timeout_secs: parsed_var("FETCH_TIMEOUT_SECS")
                    .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
                scrape_limit: parsed_var("SCRAPE_LIMIT")
                    .filter(|n: &usize| *n >= 1)
                    .unwrap_or(DEFAULT_SCRAPE_LIMIT),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_scraper_api_key(&self) -> anyhow::Result<&str> {
            self.scraper_api_key
                .as_deref()
                .context("SCRAPER_API_KEY is required when FETCH_BACKEND=scraper_api")
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }

    fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
        std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
    }

}
