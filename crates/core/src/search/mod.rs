//! Query-driven catalog search.
//!
//! [`SearchController`] turns each query revision into at most one live
//! catalog request and exposes the small state machine views render:
//!
//! ```text
//! idle --(query long enough)--> loading --(results)------> success
//!                                   |  \--(not found)----> error
//!                                   |   \-(failure)------> error
//!                                   \--(newer query)-----> loading
//! any --(query too short)--> idle
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::external_catalog::{Catalog, SearchResult};
use crate::fetch::{CancellableFetcher, Completion, CompletionSink};

/// Search state as seen by views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Everything a view needs to render the result list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchSnapshot {
    pub query: String,
    pub status: SearchStatus,
    pub results: Vec<SearchResult>,
    pub error_message: Option<String>,
}

impl Default for SearchSnapshot {
    fn default() -> Self {
        Self {
            query: String::new(),
            status: SearchStatus::Idle,
            results: Vec::new(),
            error_message: None,
        }
    }
}

/// Owns the query and drives one cancellable search fetcher.
pub struct SearchController {
    catalog: Arc<dyn Catalog>,
    min_query_len: usize,
    query: String,
    status: SearchStatus,
    results: Vec<SearchResult>,
    error_message: Option<String>,
    fetcher: CancellableFetcher<Vec<SearchResult>>,
}

impl SearchController {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        min_query_len: usize,
        sink: CompletionSink<Vec<SearchResult>>,
    ) -> Self {
        Self {
            catalog,
            min_query_len,
            query: String::new(),
            status: SearchStatus::Idle,
            results: Vec::new(),
            error_message: None,
            fetcher: CancellableFetcher::new("search", sink),
        }
    }

    /// Replace the query. Returns whether a catalog request was started.
    ///
    /// Any request issued for an earlier query is cancelled either way.
    pub fn set_query(&mut self, query: impl Into<String>) -> bool {
        self.query = query.into();
        self.fetcher.cancel();
        self.results.clear();
        self.error_message = None;

        let trimmed = self.query.trim();
        if trimmed.chars().count() < self.min_query_len {
            debug!(query = %self.query, "Query too short, not searching");
            self.status = SearchStatus::Idle;
            return false;
        }

        let catalog = Arc::clone(&self.catalog);
        let text = trimmed.to_string();
        debug!(query = %text, "Searching catalog");
        self.fetcher
            .start(async move { catalog.search(&text).await });
        self.status = SearchStatus::Loading;
        true
    }

    /// Apply a finished search. Returns whether state changed.
    pub fn apply(&mut self, completion: Completion<Vec<SearchResult>>) -> bool {
        let Some(result) = self.fetcher.accept(completion) else {
            return false;
        };

        match result {
            Ok(results) => {
                debug!(query = %self.query, count = results.len(), "Search succeeded");
                self.results = results;
                self.error_message = None;
                self.status = SearchStatus::Success;
            }
            Err(e) => {
                warn!(query = %self.query, "Search failed: {}", e);
                self.results.clear();
                self.error_message = Some(e.user_message().to_string());
                self.status = SearchStatus::Error;
            }
        }
        true
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.status == SearchStatus::Loading
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        SearchSnapshot {
            query: self.query.clone(),
            status: self.status,
            results: self.results.clone(),
            error_message: self.error_message.clone(),
        }
    }
}
