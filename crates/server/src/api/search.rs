//! Search box handlers.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;
use popcorn_core::SearchSnapshot;

use super::handlers::{session_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetQueryRequest {
    pub query: String,
}

/// GET /api/v1/search
pub async fn get_search(State(state): State<Arc<AppState>>) -> Json<SearchSnapshot> {
    Json(state.session().snapshot().search)
}

/// PUT /api/v1/search
///
/// Replace the query. Answers immediately with the resulting state, which is
/// `loading` when a catalog request was issued; poll GET to see it settle.
pub async fn set_query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetQueryRequest>,
) -> Result<Json<SearchSnapshot>, ApiError> {
    let snapshot = state
        .session()
        .set_query(request.query)
        .await
        .map_err(session_error)?;
    Ok(Json(snapshot.search))
}
