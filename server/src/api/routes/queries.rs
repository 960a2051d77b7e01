//! Recent queries endpoint (read side of the recent-queries ring)

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::api::types::ApiError;
use crate::data::state::SharedIngestState;
use crate::data::types::QueryFact;

// ============================================================================
// State
// ============================================================================

#[derive(Clone)]
pub struct QueriesApiState {
    pub ingest: SharedIngestState,
}

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListQueriesParams {
    /// Maximum number of facts, newest first (default: whole ring)
    pub limit: Option<usize>,
}

pub fn routes(ingest: SharedIngestState) -> Router<()> {
    let state = QueriesApiState { ingest };
    Router::new()
        .route("/api/v1/queries", get(list_queries))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_queries(
    State(state): State<QueriesApiState>,
    Query(params): Query<ListQueriesParams>,
) -> Result<Json<Vec<QueryFact>>, ApiError> {
    let limit = match params.limit {
        Some(0) => {
            return Err(ApiError::bad_request(
                "INVALID_LIMIT",
                "limit must be >= 1",
            ));
        }
        Some(limit) => limit,
        None => usize::MAX,
    };

    let facts = state.ingest.lock().recent().latest(limit);
    Ok(Json(facts))
}
