//! The currently inspected item and its detail.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::external_catalog::{Catalog, ItemDetail};
use crate::fetch::{CancellableFetcher, Completion, CompletionSink};

/// Detail pane state as seen by views.
///
/// `detail` must be treated as undefined until `detail_loaded` is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectionSnapshot {
    pub selected_id: Option<String>,
    pub detail: Option<ItemDetail>,
    pub detail_loaded: bool,
    pub detail_error: Option<String>,
    pub is_already_watched: bool,
    pub watched_user_rating: Option<u8>,
}

/// Owns the selected id and drives one cancellable detail fetcher.
pub struct SelectionController {
    catalog: Arc<dyn Catalog>,
    selected_id: Option<String>,
    detail: Option<ItemDetail>,
    detail_error: Option<String>,
    fetcher: CancellableFetcher<ItemDetail>,
}

impl SelectionController {
    pub fn new(catalog: Arc<dyn Catalog>, sink: CompletionSink<ItemDetail>) -> Self {
        Self {
            catalog,
            selected_id: None,
            detail: None,
            detail_error: None,
            fetcher: CancellableFetcher::new("detail", sink),
        }
    }

    /// Toggle the selection. Returns whether `id` is selected afterwards.
    ///
    /// Selecting the selected id deselects it without a request.
    pub fn select(&mut self, id: &str) -> bool {
        if self.selected_id.as_deref() == Some(id) {
            self.close();
            return false;
        }

        self.detail = None;
        self.detail_error = None;
        self.selected_id = Some(id.to_string());

        let catalog = Arc::clone(&self.catalog);
        let id = id.to_string();
        debug!(id = %id, "Fetching detail");
        self.fetcher.start(async move { catalog.detail(&id).await });
        true
    }

    /// Deselect unconditionally.
    pub fn close(&mut self) {
        self.fetcher.cancel();
        self.selected_id = None;
        self.detail = None;
        self.detail_error = None;
    }

    /// Apply a finished detail lookup. Returns whether state changed.
    pub fn apply(&mut self, completion: Completion<ItemDetail>) -> bool {
        let Some(result) = self.fetcher.accept(completion) else {
            return false;
        };

        match result {
            Ok(detail) => {
                self.detail = Some(detail);
                self.detail_error = None;
            }
            Err(e) => {
                warn!(id = ?self.selected_id, "Detail fetch failed: {}", e);
                self.detail = None;
                self.detail_error = Some(e.user_message().to_string());
            }
        }
        true
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    /// The loaded detail, `None` while loading or after a failure.
    pub fn detail(&self) -> Option<&ItemDetail> {
        self.detail.as_ref()
    }

    pub fn detail_error(&self) -> Option<&str> {
        self.detail_error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.fetcher.is_in_flight()
    }

    /// Snapshot without watched-list annotations.
    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            selected_id: self.selected_id.clone(),
            detail: self.detail.clone(),
            detail_loaded: self.selected_id.is_some() && !self.is_loading(),
            detail_error: self.detail_error.clone(),
            is_already_watched: false,
            watched_user_rating: None,
        }
    }
}
