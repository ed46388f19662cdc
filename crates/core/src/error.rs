use crate::domain::asin::InvalidAsin;
use crate::ingest::error::FetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// Bad or missing input, rejected before any external call.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("scraping failed: {0}")]
    Upstream(#[from] FetchError),
    #[error("storage error: {0:#}")]
    Persistence(anyhow::Error),
}

impl TrackerError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Upstream(_) => "upstream",
            Self::Persistence(_) => "persistence",
        }
    }
}

impl From<InvalidAsin> for TrackerError {
    fn from(err: InvalidAsin) -> Self {
        Self::Validation(format!("Please enter a valid ASIN or Amazon URL ({err})"))
    }
}
