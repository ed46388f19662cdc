use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream request timed out")]
    Timeout,
    #[error("upstream returned HTTP {status}")]
    Http { status: u16 },
    #[error("upstream request failed: {0}")]
    Request(String),
    #[error("upstream response could not be parsed: {0}")]
    Parse(String),
    #[error("upstream returned no usable products")]
    NoResults,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Http {
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}
