//! Mock catalog for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};

use crate::external_catalog::{Catalog, CatalogError, ItemDetail, SearchResult};

/// A recorded catalog query for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCatalogQuery {
    Search { query: String },
    Detail { id: String },
}

/// Holds a mocked response back until released (or dropped).
#[derive(Debug)]
pub struct Gate {
    tx: oneshot::Sender<()>,
}

impl Gate {
    /// Let the held response through.
    pub fn release(self) {
        let _ = self.tx.send(());
    }
}

/// Mock implementation of the [`Catalog`] trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable search results and details
/// - Hold individual responses behind a [`Gate`] to reorder completions
/// - Track queries for assertions
/// - Simulate failures
///
/// Searches that match nothing answer `NotFound`, as the real catalog does.
///
/// # Example
///
/// ```rust,ignore
/// use popcorn_core::testing::{MockCatalog, fixtures};
///
/// let catalog = MockCatalog::new();
/// catalog.add_result(fixtures::search_result("tt1", "Batman", "1989")).await;
///
/// let gate = catalog.hold_search("batman").await;
/// // ... start a search, then
/// gate.release();
/// ```
#[derive(Debug)]
pub struct MockCatalog {
    /// Search rows, matched by case-insensitive title substring.
    results: Arc<RwLock<Vec<SearchResult>>>,
    /// Details by id.
    details: Arc<RwLock<HashMap<String, ItemDetail>>>,
    /// Pending gates for searches, by query.
    search_gates: Arc<RwLock<HashMap<String, oneshot::Receiver<()>>>>,
    /// Pending gates for detail lookups, by id.
    detail_gates: Arc<RwLock<HashMap<String, oneshot::Receiver<()>>>>,
    /// Recorded queries.
    queries: Arc<RwLock<Vec<RecordedCatalogQuery>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<CatalogError>>>,
    /// Queries answered with an empty list instead of `NotFound`.
    empty_ok: Arc<RwLock<HashSet<String>>>,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalog {
    /// Create a new empty mock catalog.
    pub fn new() -> Self {
        Self {
            results: Arc::new(RwLock::new(Vec::new())),
            details: Arc::new(RwLock::new(HashMap::new())),
            search_gates: Arc::new(RwLock::new(HashMap::new())),
            detail_gates: Arc::new(RwLock::new(HashMap::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            empty_ok: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    // =========================================================================
    // Data Configuration
    // =========================================================================

    /// Add a search row.
    pub async fn add_result(&self, result: SearchResult) {
        self.results.write().await.push(result);
    }

    /// Add a detail record.
    pub async fn add_detail(&self, detail: ItemDetail) {
        self.details.write().await.insert(detail.id.clone(), detail);
    }

    /// Add a detail record and its matching search row.
    pub async fn add_item(&self, detail: ItemDetail) {
        self.add_result(SearchResult {
            id: detail.id.clone(),
            title: detail.title.clone(),
            year: detail.year.clone(),
            poster_url: detail.poster_url.clone(),
        })
        .await;
        self.add_detail(detail).await;
    }

    /// Answer `query` with an empty result list when nothing matches.
    pub async fn set_empty_ok(&self, query: &str) {
        self.empty_ok.write().await.insert(query.to_string());
    }

    /// Clear all data.
    pub async fn clear(&self) {
        self.results.write().await.clear();
        self.details.write().await.clear();
        self.empty_ok.write().await.clear();
    }

    // =========================================================================
    // Gating
    // =========================================================================

    /// Hold the next search for `query` until the returned gate is released.
    pub async fn hold_search(&self, query: &str) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.search_gates.write().await.insert(query.to_string(), rx);
        Gate { tx }
    }

    /// Hold the next detail lookup for `id` until the returned gate is released.
    pub async fn hold_detail(&self, id: &str) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.detail_gates.write().await.insert(id.to_string(), rx);
        Gate { tx }
    }

    // =========================================================================
    // Query Recording
    // =========================================================================

    /// Get all recorded queries.
    pub async fn recorded_queries(&self) -> Vec<RecordedCatalogQuery> {
        self.queries.read().await.clone()
    }

    /// Number of searches performed.
    pub async fn search_count(&self) -> usize {
        self.queries
            .read()
            .await
            .iter()
            .filter(|q| matches!(q, RecordedCatalogQuery::Search { .. }))
            .count()
    }

    /// Number of detail lookups performed.
    pub async fn detail_count(&self) -> usize {
        self.queries
            .read()
            .await
            .iter()
            .filter(|q| matches!(q, RecordedCatalogQuery::Detail { .. }))
            .count()
    }

    /// Clear recorded queries.
    pub async fn clear_recorded(&self) {
        self.queries.write().await.clear();
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    /// Clear any pending error.
    pub async fn clear_next_error(&self) {
        *self.next_error.write().await = None;
    }

    async fn take_error(&self) -> Option<CatalogError> {
        self.next_error.write().await.take()
    }

    async fn record(&self, query: RecordedCatalogQuery) {
        self.queries.write().await.push(query);
    }

    /// Wait on a gate if one was registered for `key`.
    async fn pass_gate(gates: &RwLock<HashMap<String, oneshot::Receiver<()>>>, key: &str) {
        let gate = gates.write().await.remove(key);
        if let Some(rx) = gate {
            // A dropped gate releases too.
            let _ = rx.await;
        }
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, CatalogError> {
        self.record(RecordedCatalogQuery::Search {
            query: query.to_string(),
        })
        .await;

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        Self::pass_gate(&self.search_gates, query).await;

        let query_lower = query.to_lowercase();
        let results: Vec<SearchResult> = self
            .results
            .read()
            .await
            .iter()
            .filter(|r| r.title.to_lowercase().contains(&query_lower))
            .cloned()
            .collect();

        if results.is_empty() && !self.empty_ok.read().await.contains(query) {
            return Err(CatalogError::NotFound("Movie not found!".to_string()));
        }

        Ok(results)
    }

    async fn detail(&self, id: &str) -> Result<ItemDetail, CatalogError> {
        self.record(RecordedCatalogQuery::Detail { id: id.to_string() })
            .await;

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        Self::pass_gate(&self.detail_gates, id).await;

        self.details
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound("Incorrect IMDb ID.".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_search_matches_titles() {
        let catalog = MockCatalog::new();
        catalog
            .add_result(fixtures::search_result("tt1", "Batman", "1989"))
            .await;
        catalog
            .add_result(fixtures::search_result("tt2", "Heat", "1995"))
            .await;

        let results = catalog.search("bat").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "tt1");
        assert_eq!(catalog.search_count().await, 1);
    }

    #[tokio::test]
    async fn test_search_without_match_is_not_found() {
        let catalog = MockCatalog::new();
        let err = catalog.search("nothing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_detail_lookup() {
        let catalog = MockCatalog::new();
        catalog
            .add_item(fixtures::item_detail("tt1", "Batman", 126, "7.5"))
            .await;

        let detail = catalog.detail("tt1").await.unwrap();
        assert_eq!(detail.title, "Batman");
        assert!(catalog.detail("tt9").await.unwrap_err().is_not_found());
        assert_eq!(
            catalog.recorded_queries().await,
            vec![
                RecordedCatalogQuery::Detail {
                    id: "tt1".to_string()
                },
                RecordedCatalogQuery::Detail {
                    id: "tt9".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_next_error_applies_once() {
        let catalog = MockCatalog::new();
        catalog
            .add_result(fixtures::search_result("tt1", "Batman", "1989"))
            .await;
        catalog
            .set_next_error(CatalogError::ApiError {
                status: 500,
                message: "boom".to_string(),
            })
            .await;

        assert!(catalog.search("batman").await.is_err());
        assert!(catalog.search("batman").await.is_ok());
    }

    #[tokio::test]
    async fn test_gate_holds_response() {
        let catalog = Arc::new(MockCatalog::new());
        catalog
            .add_result(fixtures::search_result("tt1", "Batman", "1989"))
            .await;
        let gate = catalog.hold_search("batman").await;

        let task = {
            let catalog = Arc::clone(&catalog);
            tokio::spawn(async move { catalog.search("batman").await })
        };

        tokio::task::yield_now().await;
        assert!(!task.is_finished());

        gate.release();
        let results = task.await.unwrap().unwrap();
        assert_eq!(results.len(), 1);
    }
}
