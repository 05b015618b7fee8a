use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use popcorn_core::{SanitizedConfig, SessionError, SessionSnapshot};

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error reply shared by the session-backed handlers.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map a rejected session command onto an HTTP status.
pub fn session_error(err: SessionError) -> ApiError {
    let status = match err {
        SessionError::RatingOutOfRange { .. } => StatusCode::BAD_REQUEST,
        SessionError::NothingSelected
        | SessionError::DetailNotLoaded(_)
        | SessionError::AlreadyWatched(_) => StatusCode::CONFLICT,
        SessionError::Closed => StatusCode::SERVICE_UNAVAILABLE,
    };
    error_response(status, err.to_string())
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// GET /api/v1/metrics
///
/// Prometheus text exposition.
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

/// GET /api/v1/state
///
/// Everything a view renders: search, selection and the watched list.
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    Json(state.session().snapshot())
}
