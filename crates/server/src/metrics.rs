//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the popcorn server:
//! - HTTP request metrics (latency, counts)
//! - Session state gauges (collected dynamically)
//! - Core catalog and watched-list counters (registered from `popcorn_core`)

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

use crate::state::AppState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "popcorn_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("popcorn_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "popcorn_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Session Metrics
// =============================================================================

/// Items in the watched list (collected dynamically).
pub static WATCHED_ITEMS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("popcorn_watched_items", "Items in the watched list").unwrap()
});

/// Rows in the current search result list (collected dynamically).
pub static SEARCH_RESULTS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "popcorn_search_results",
        "Rows in the current search result list",
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Session
    registry.register(Box::new(WATCHED_ITEMS.clone())).unwrap();
    registry.register(Box::new(SEARCH_RESULTS.clone())).unwrap();

    // Core metrics (catalog requests, watched-list saves)
    for metric in popcorn_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Update gauges from the latest published session state.
pub fn collect_dynamic_metrics(state: &AppState) {
    let snapshot = state.session().snapshot();
    WATCHED_ITEMS.set(snapshot.watchlist.len() as i64);
    SEARCH_RESULTS.set(snapshot.search.results.len() as i64);
}

static CATALOG_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"tt\d+").unwrap());
static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Collapse ids in a request path so labels stay bounded.
pub fn normalize_path(path: &str) -> String {
    let result = CATALOG_ID.replace_all(path, "{id}");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}
