//! Prometheus scrape endpoint

use axum::Router;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;

use crate::api::types::ApiError;
use crate::data::metric_store::MetricsRegistry;

pub fn routes(registry: MetricsRegistry) -> Router<()> {
    Router::new()
        .route("/metrics", get(scrape))
        .with_state(registry)
}

/// Render the registry in the text exposition format. Computed per request.
async fn scrape(State(registry): State<MetricsRegistry>) -> Result<impl IntoResponse, ApiError> {
    let body = registry.encode().map_err(ApiError::from_metrics)?;
    Ok(([(header::CONTENT_TYPE, registry.content_type())], body))
}
