//! Watched list handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use popcorn_core::{WatchedItem, WatchedSummary};

use super::handlers::{session_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddWatchedRequest {
    pub item: WatchedItem,
}

#[derive(Debug, Serialize)]
pub struct WatchlistResponse {
    pub items: Vec<WatchedItem>,
    pub summary: WatchedSummary,
}

/// GET /api/v1/watchlist
pub async fn list_watched(State(state): State<Arc<AppState>>) -> Json<WatchlistResponse> {
    let snapshot = state.session().snapshot();
    Json(WatchlistResponse {
        items: snapshot.watchlist,
        summary: snapshot.summary,
    })
}

/// POST /api/v1/watchlist
///
/// Append an already-rated item. Ids are not deduplicated.
pub async fn add_watched(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddWatchedRequest>,
) -> Result<(StatusCode, Json<WatchlistResponse>), ApiError> {
    let snapshot = state
        .session()
        .add(request.item)
        .await
        .map_err(session_error)?;
    Ok((
        StatusCode::CREATED,
        Json(WatchlistResponse {
            items: snapshot.watchlist,
            summary: snapshot.summary,
        }),
    ))
}

/// DELETE /api/v1/watchlist/{id}
///
/// Removing an id that is not in the list leaves it unchanged.
pub async fn remove_watched(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<WatchlistResponse>, ApiError> {
    let snapshot = state.session().remove(id).await.map_err(session_error)?;
    Ok(Json(WatchlistResponse {
        items: snapshot.watchlist,
        summary: snapshot.summary,
    }))
}

/// GET /api/v1/watchlist/summary
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Json<WatchedSummary> {
    Json(state.session().snapshot().summary)
}
