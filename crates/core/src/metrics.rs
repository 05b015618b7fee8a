//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Catalog requests (started, cancelled, outcomes, stale completions)
//! - Watched-list persistence

use once_cell::sync::Lazy;
use prometheus::{IntCounterVec, Opts};

// =============================================================================
// Catalog Request Metrics
// =============================================================================

/// Catalog requests started by operation.
pub static CATALOG_REQUESTS_STARTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "popcorn_catalog_requests_started_total",
            "Total catalog requests started",
        ),
        &["operation"], // "search", "detail"
    )
    .unwrap()
});

/// Catalog requests cancelled before their outcome was applied.
pub static CATALOG_REQUESTS_CANCELLED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "popcorn_catalog_requests_cancelled_total",
            "Total catalog requests cancelled or superseded",
        ),
        &["operation"],
    )
    .unwrap()
});

/// Applied catalog request outcomes.
pub static CATALOG_REQUEST_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "popcorn_catalog_request_outcomes_total",
            "Catalog request outcomes applied to controller state",
        ),
        &["operation", "outcome"], // outcome: "success", "not_found", "failed"
    )
    .unwrap()
});

/// Completions dropped because a newer request replaced them.
pub static STALE_COMPLETIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "popcorn_stale_completions_total",
            "Catalog completions discarded as stale",
        ),
        &["operation"],
    )
    .unwrap()
});

// =============================================================================
// Watchlist Metrics
// =============================================================================

/// Watched-list saves by result.
pub static WATCHLIST_SAVES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("popcorn_watchlist_saves_total", "Watched-list saves"),
        &["result"], // "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CATALOG_REQUESTS_STARTED.clone()),
        Box::new(CATALOG_REQUESTS_CANCELLED.clone()),
        Box::new(CATALOG_REQUEST_OUTCOMES.clone()),
        Box::new(STALE_COMPLETIONS.clone()),
        Box::new(WATCHLIST_SAVES.clone()),
    ]
}
