//! Detail pane handlers.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;
use popcorn_core::SelectionSnapshot;

use super::handlers::{session_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rating: u8,
}

/// GET /api/v1/selection
pub async fn get_selection(State(state): State<Arc<AppState>>) -> Json<SelectionSnapshot> {
    Json(state.session().snapshot().selection)
}

/// POST /api/v1/selection
///
/// Toggle: posting the selected id again deselects it.
pub async fn select(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<SelectionSnapshot>, ApiError> {
    let snapshot = state
        .session()
        .select(request.id)
        .await
        .map_err(session_error)?;
    Ok(Json(snapshot.selection))
}

/// DELETE /api/v1/selection
pub async fn close(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SelectionSnapshot>, ApiError> {
    let snapshot = state.session().close().await.map_err(session_error)?;
    Ok(Json(snapshot.selection))
}

/// POST /api/v1/selection/rating
///
/// Commit the loaded detail with the given rating to the watched list.
/// Answers with the full state, since both the selection and the list change.
pub async fn rate_selected(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RateRequest>,
) -> Result<Json<popcorn_core::SessionSnapshot>, ApiError> {
    let snapshot = state
        .session()
        .rate_selected(request.rating)
        .await
        .map_err(session_error)?;
    Ok(Json(snapshot))
}
