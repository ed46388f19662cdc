use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeKind {
    Search,
    Asin,
}

impl ScrapeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Asin => "asin",
        }
    }
}

/// Audit record of one scrape request.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeRun {
    pub id: Uuid,
    pub kind: ScrapeKind,
    pub query: String,
    pub backend: String,
    pub error: Option<String>,
    pub upserted: i32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ScrapeRun {
    pub fn status(&self) -> &'static str {
        if self.error.is_some() {
            "error"
        } else {
            "success"
        }
    }
}

pub(crate) async fn insert(pool: &sqlx::PgPool, run: &ScrapeRun) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO scrape_runs (id, kind, query, backend, status, error, upserted, started_at, finished_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .persistent(false)
    .bind(run.id)
    .bind(run.kind.as_str())
    .bind(&run.query)
    .bind(&run.backend)
    .bind(run.status())
    .bind(&run.error)
    .bind(run.upserted)
    .bind(run.started_at)
    .bind(run.finished_at)
    .execute(pool)
    .await
    .context("insert scrape_runs failed")?;

    Ok(())
}
