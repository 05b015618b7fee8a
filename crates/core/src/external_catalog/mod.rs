//! Remote catalog integration.
//!
//! The catalog owns ranking and relevance; this module only issues lookups
//! and classifies their outcomes.

mod omdb;
mod types;

pub use omdb::OmdbClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// User-facing message for a catalog "no match" answer.
pub const NOT_FOUND_MESSAGE: &str = "Movie not found";

/// User-facing message for every other failed lookup.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Ooops. Something went wrong.";

/// Errors that can occur when interacting with the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed before a response was read.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The catalog answered `Response: "False"`.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Non-2xx status without a catalog-level answer.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

impl CatalogError {
    /// Whether the catalog itself reported no match.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound(_))
    }

    /// The single message a view shows for this failure.
    pub fn user_message(&self) -> &'static str {
        if self.is_not_found() {
            NOT_FOUND_MESSAGE
        } else {
            TRANSPORT_FAILURE_MESSAGE
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        if self.is_not_found() {
            "not_found"
        } else {
            "failed"
        }
    }
}

/// Trait for remote catalog clients.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Free-text search.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, CatalogError>;

    /// Full record for one id.
    async fn detail(&self, id: &str) -> Result<ItemDetail, CatalogError>;
}
