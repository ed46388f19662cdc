use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use pricewatch_core::dashboard::state::DashboardState;
use pricewatch_core::dashboard::DashboardView;
use pricewatch_core::domain::asin::Asin;
use pricewatch_core::domain::product::Product;
use pricewatch_core::error::TrackerError;
use pricewatch_core::tracker::{PriceTracker, ProductListing};

#[derive(Clone)]
pub struct AppState {
    /// `None` when the database was unreachable at start-up.
    pub tracker: Option<PriceTracker>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/products", get(list_products))
        .route("/api/products/scrape", post(scrape_search))
        .route("/api/products/scrape-asin", post(scrape_asin))
        .route("/api/dashboard", get(dashboard))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug)]
enum ApiError {
    Unavailable,
    Tracker(TrackerError),
}

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        Self::Tracker(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "database unavailable".to_string(),
            ),
            Self::Tracker(err) => {
                let status = match &err {
                    TrackerError::Validation(_) => StatusCode::BAD_REQUEST,
                    TrackerError::NotFound(_) => StatusCode::NOT_FOUND,
                    TrackerError::Upstream(_) => StatusCode::BAD_GATEWAY,
                    TrackerError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                match &err {
                    TrackerError::Persistence(e) => {
                        sentry_anyhow::capture_anyhow(e);
                    }
                    TrackerError::Upstream(e) => {
                        sentry_anyhow::capture_anyhow(&anyhow::anyhow!("{e}"));
                    }
                    _ => {}
                }
                (status, err.to_string())
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

fn tracker(state: &AppState) -> Result<&PriceTracker, ApiError> {
    state.tracker.as_ref().ok_or(ApiError::Unavailable)
}

async fn list_products(State(state): State<AppState>) -> Result<Json<ProductListing>, ApiError> {
    let listing = tracker(&state)?.list_products().await?;
    Ok(Json(listing))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeRequest {
    #[serde(default)]
    search_term: Option<String>,
}

async fn scrape_search(
    State(state): State<AppState>,
    Json(req): Json<ScrapeRequest>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let term = req.search_term.unwrap_or_default();
    let products = tracker(&state)?.scrape_search(&term).await?;
    Ok(Json(products))
}

#[derive(Debug, Deserialize)]
struct ScrapeAsinRequest {
    #[serde(default)]
    asin: Option<String>,
}

async fn scrape_asin(
    State(state): State<AppState>,
    Json(req): Json<ScrapeAsinRequest>,
) -> Result<Json<Product>, ApiError> {
    let input = req.asin.unwrap_or_default();
    let product = tracker(&state)?.scrape_asin(&input).await?;
    Ok(Json(product))
}

#[derive(Debug, Default, Deserialize)]
struct DashboardQuery {
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    selected: Option<String>,
}

async fn dashboard(
    State(state): State<AppState>,
    Query(q): Query<DashboardQuery>,
) -> Result<Json<DashboardView>, ApiError> {
    let selected = q
        .selected
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(Asin::parse)
        .transpose()
        .map_err(TrackerError::from)?;

    let mut view = DashboardState::new();
    view.apply_listing(tracker(&state)?.list_products().await?);
    if let Some(term) = q.search {
        view.set_search(term);
    }
    if let Some(asin) = &selected {
        view.toggle_chart(asin);
    }
    Ok(Json(view.view()))
}
