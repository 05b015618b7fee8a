use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, middleware, search, selection, watchlist};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        // Full view state
        .route("/state", get(handlers::get_state))
        // Search
        .route("/search", get(search::get_search))
        .route("/search", put(search::set_query))
        // Selection
        .route("/selection", get(selection::get_selection))
        .route("/selection", post(selection::select))
        .route("/selection", delete(selection::close))
        .route("/selection/rating", post(selection::rate_selected))
        // Watched list
        .route("/watchlist", get(watchlist::list_watched))
        .route("/watchlist", post(watchlist::add_watched))
        .route("/watchlist/summary", get(watchlist::get_summary))
        .route("/watchlist/{id}", delete(watchlist::remove_watched))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(axum_middleware::from_fn(middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
