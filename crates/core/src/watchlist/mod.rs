//! The persisted watched list.
//!
//! Every mutation is written back through the [`PersistentStore`] before the
//! call returns, so the stored slot always holds the latest list.

mod types;

pub use types::{WatchedItem, WatchedSummary};

use tracing::{debug, error, info};

use crate::metrics::WATCHLIST_SAVES;
use crate::store::PersistentStore;

/// Owns the watched list and its durability.
pub struct WatchlistController {
    store: PersistentStore,
    key: String,
    items: Vec<WatchedItem>,
}

impl WatchlistController {
    /// Load the list stored under `key` (empty when absent or unreadable).
    pub fn new(store: PersistentStore, key: impl Into<String>) -> Self {
        let key = key.into();
        let items: Vec<WatchedItem> = store.load(&key, Vec::new());
        info!(key = %key, count = items.len(), "Watched list loaded");
        Self { store, key, items }
    }

    /// Append an item. Ids are not deduplicated.
    pub fn add(&mut self, item: WatchedItem) {
        debug!(id = %item.id, rating = item.user_rating, "Adding watched item");
        self.items.push(item);
        self.persist();
    }

    /// Drop every item with `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        if self.items.len() == before {
            return false;
        }
        debug!(id, "Removed watched item");
        self.persist();
        true
    }

    pub fn items(&self) -> &[WatchedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    /// The rating given the first time `id` was added.
    pub fn user_rating_for(&self, id: &str) -> Option<u8> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.user_rating)
    }

    pub fn summary(&self) -> WatchedSummary {
        WatchedSummary::from_items(&self.items)
    }

    fn persist(&self) {
        match self.store.save(&self.key, &self.items) {
            Ok(()) => {
                WATCHLIST_SAVES.with_label_values(&["success"]).inc();
            }
            Err(e) => {
                error!(key = %self.key, "Failed to save watched list: {}", e);
                WATCHLIST_SAVES.with_label_values(&["error"]).inc();
            }
        }
    }
}
