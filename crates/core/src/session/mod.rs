//! Composition of the search, selection and watched-list controllers.
//!
//! A [`Session`] is the single owner of all controller state. Fetch
//! completions come back as [`SessionEvent`]s on one queue, so every state
//! transition happens in one place, in order. [`create_session_system`] puts
//! a session on its own task behind a cloneable [`SessionHandle`].

mod driver;

pub use driver::{create_session_system, SessionDriver, SessionHandle};

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

use crate::config::Config;
use crate::external_catalog::{Catalog, ItemDetail, SearchResult};
use crate::fetch::{Completion, CompletionSink};
use crate::search::{SearchController, SearchSnapshot};
use crate::selection::{SelectionController, SelectionSnapshot};
use crate::store::PersistentStore;
use crate::watchlist::{WatchedItem, WatchedSummary, WatchlistController};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Rating must be between 1 and {max}, got {rating}")]
    RatingOutOfRange { rating: u8, max: u8 },

    #[error("No item is selected")]
    NothingSelected,

    #[error("Detail for {0} is not loaded")]
    DetailNotLoaded(String),

    #[error("{0} is already in the watched list")]
    AlreadyWatched(String),

    #[error("Session is closed")]
    Closed,
}

/// Settings a session is built with.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub min_query_len: usize,
    pub max_rating: u8,
    pub watched_key: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            min_query_len: 3,
            max_rating: 10,
            watched_key: "watched".to_string(),
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_query_len: config.search.min_query_len,
            max_rating: config.rating.max_rating,
            watched_key: config.storage.watched_key.clone(),
        }
    }
}

/// A finished fetch, posted back onto the session queue.
#[derive(Debug)]
pub enum SessionEvent {
    Search(Completion<Vec<SearchResult>>),
    Detail(Completion<ItemDetail>),
}

/// A user intent forwarded by a view.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    SetQuery(String),
    Select(String),
    Close,
    Add(WatchedItem),
    Remove(String),
    RateSelected(u8),
}

impl SessionCommand {
    pub fn name(&self) -> &'static str {
        match self {
            SessionCommand::SetQuery(_) => "set_query",
            SessionCommand::Select(_) => "select",
            SessionCommand::Close => "close",
            SessionCommand::Add(_) => "add",
            SessionCommand::Remove(_) => "remove",
            SessionCommand::RateSelected(_) => "rate_selected",
        }
    }
}

/// Full view state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub search: SearchSnapshot,
    pub selection: SelectionSnapshot,
    pub watchlist: Vec<WatchedItem>,
    pub summary: WatchedSummary,
}

pub struct Session {
    search: SearchController,
    selection: SelectionController,
    watchlist: WatchlistController,
    max_rating: u8,
    events: mpsc::UnboundedReceiver<SessionEvent>,
}

impl Session {
    /// Build a session; the watched list is loaded from `store` right away.
    pub fn new(catalog: Arc<dyn Catalog>, store: PersistentStore, options: SessionOptions) -> Self {
        let (tx, events) = mpsc::unbounded_channel();

        let search_tx = tx.clone();
        let search_sink: CompletionSink<Vec<SearchResult>> = Arc::new(move |completion| {
            let _ = search_tx.send(SessionEvent::Search(completion));
        });
        let detail_sink: CompletionSink<ItemDetail> = Arc::new(move |completion| {
            let _ = tx.send(SessionEvent::Detail(completion));
        });

        let watchlist = WatchlistController::new(store, options.watched_key);
        info!(
            min_query_len = options.min_query_len,
            max_rating = options.max_rating,
            watched = watchlist.len(),
            "Session created"
        );

        Self {
            search: SearchController::new(Arc::clone(&catalog), options.min_query_len, search_sink),
            selection: SelectionController::new(catalog, detail_sink),
            watchlist,
            max_rating: options.max_rating,
            events,
        }
    }

    pub fn from_config(catalog: Arc<dyn Catalog>, store: PersistentStore, config: &Config) -> Self {
        Self::new(catalog, store, SessionOptions::from_config(config))
    }

    /// Replace the query. The open detail is closed first.
    ///
    /// Setting the text already in place changes nothing and issues no request.
    pub fn set_query(&mut self, query: impl Into<String>) -> bool {
        let query = query.into();
        if query == self.search.query() {
            return false;
        }
        self.selection.close();
        self.search.set_query(query)
    }

    /// Toggle the selection of `id`.
    pub fn select(&mut self, id: &str) -> bool {
        self.selection.select(id)
    }

    pub fn close(&mut self) {
        self.selection.close();
    }

    /// Append `item` to the watched list and close the detail.
    pub fn add(&mut self, item: WatchedItem) -> Result<(), SessionError> {
        self.check_rating(item.user_rating)?;
        self.watchlist.add(item);
        self.selection.close();
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.watchlist.remove(id)
    }

    /// Commit the loaded detail with `rating` to the watched list.
    pub fn rate_selected(&mut self, rating: u8) -> Result<WatchedItem, SessionError> {
        self.check_rating(rating)?;

        let id = self
            .selection
            .selected_id()
            .ok_or(SessionError::NothingSelected)?;
        if self.watchlist.contains(id) {
            return Err(SessionError::AlreadyWatched(id.to_string()));
        }
        let detail = self
            .selection
            .detail()
            .ok_or_else(|| SessionError::DetailNotLoaded(id.to_string()))?;

        let item = WatchedItem::from_detail(detail, rating);
        self.add(item.clone())?;
        Ok(item)
    }

    fn check_rating(&self, rating: u8) -> Result<(), SessionError> {
        if rating == 0 || rating > self.max_rating {
            return Err(SessionError::RatingOutOfRange {
                rating,
                max: self.max_rating,
            });
        }
        Ok(())
    }

    /// Apply a fetch completion. Returns whether state changed.
    pub fn apply(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Search(completion) => self.search.apply(completion),
            SessionEvent::Detail(completion) => self.selection.apply(completion),
        }
    }

    /// Run one command.
    pub fn execute(&mut self, command: SessionCommand) -> Result<(), SessionError> {
        match command {
            SessionCommand::SetQuery(query) => {
                self.set_query(query);
            }
            SessionCommand::Select(id) => {
                self.select(&id);
            }
            SessionCommand::Close => self.close(),
            SessionCommand::Add(item) => self.add(item)?,
            SessionCommand::Remove(id) => {
                self.remove(&id);
            }
            SessionCommand::RateSelected(rating) => {
                self.rate_selected(rating)?;
            }
        }
        Ok(())
    }

    /// Wait for the next fetch completion.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Apply completions until no request is in flight.
    pub async fn settle(&mut self) {
        while self.is_loading() {
            match self.events.recv().await {
                Some(event) => {
                    self.apply(event);
                }
                None => break,
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.search.is_loading() || self.selection.is_loading()
    }

    pub fn search(&self) -> &SearchController {
        &self.search
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn watchlist(&self) -> &WatchlistController {
        &self.watchlist
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mut selection = self.selection.snapshot();
        if let Some(id) = self.selection.selected_id() {
            selection.is_already_watched = self.watchlist.contains(id);
            selection.watched_user_rating = self.watchlist.user_rating_for(id);
        }

        SessionSnapshot {
            search: self.search.snapshot(),
            selection,
            watchlist: self.watchlist.items().to_vec(),
            summary: self.watchlist.summary(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::search::SearchStatus;
    use crate::store::{MemorySlotStore, SlotStore};
    use crate::testing::{fixtures, MockCatalog};

    async fn setup() -> (Session, Arc<MockCatalog>, Arc<MemorySlotStore>) {
        let catalog = Arc::new(MockCatalog::new());
        catalog
            .add_item(fixtures::item_detail("tt1", "Batman", 126, "7.5"))
            .await;
        catalog
            .add_item(fixtures::item_detail("tt2", "Batman Returns", 126, "7.0"))
            .await;

        let slots = Arc::new(MemorySlotStore::new());
        let session = Session::new(
            catalog.clone(),
            PersistentStore::new(slots.clone()),
            SessionOptions::default(),
        );
        (session, catalog, slots)
    }

    #[tokio::test]
    async fn test_query_then_select_then_rate() {
        let (mut session, _catalog, slots) = setup().await;

        session.set_query("batman");
        session.settle().await;
        assert_eq!(session.search().status(), SearchStatus::Success);
        assert_eq!(session.search().result_count(), 2);

        session.select("tt1");
        session.settle().await;
        assert!(session.snapshot().selection.detail_loaded);

        let item = session.rate_selected(8).unwrap();
        assert_eq!(item.id, "tt1");
        assert_eq!(item.runtime_minutes, Some(126));
        assert_eq!(item.user_rating, 8);

        let snapshot = session.snapshot();
        assert!(snapshot.selection.selected_id.is_none());
        assert_eq!(snapshot.watchlist.len(), 1);
        assert_eq!(snapshot.summary.count, 1);
        assert_eq!(slots.write_count(), 1);
    }

    #[tokio::test]
    async fn test_set_query_closes_selection() {
        let (mut session, _catalog, _slots) = setup().await;

        session.select("tt1");
        session.settle().await;
        assert!(session.selection().selected_id().is_some());

        session.set_query("bat");
        assert!(session.selection().selected_id().is_none());

        session.select("tt1");
        session.set_query("b");
        assert!(session.selection().selected_id().is_none());
    }

    #[tokio::test]
    async fn test_same_query_keeps_results_and_selection() {
        let (mut session, catalog, _slots) = setup().await;

        session.set_query("batman");
        session.settle().await;
        session.select("tt1");
        session.settle().await;

        assert!(!session.set_query("batman"));
        assert_eq!(session.search().status(), SearchStatus::Success);
        assert_eq!(session.search().result_count(), 2);
        assert_eq!(session.selection().selected_id(), Some("tt1"));
        assert_eq!(catalog.search_count().await, 1);
    }

    #[tokio::test]
    async fn test_add_rejects_out_of_range_rating() {
        let (mut session, _catalog, slots) = setup().await;

        let item = fixtures::watched_item("tt1", "Batman", 0);
        assert_eq!(
            session.add(item),
            Err(SessionError::RatingOutOfRange { rating: 0, max: 10 })
        );
        let item = fixtures::watched_item("tt1", "Batman", 11);
        assert_eq!(
            session.execute(SessionCommand::Add(item)),
            Err(SessionError::RatingOutOfRange { rating: 11, max: 10 })
        );
        assert!(session.watchlist().is_empty());
        assert!(slots.read("watched").unwrap().is_none());

        session.add(fixtures::watched_item("tt1", "Batman", 10)).unwrap();
        assert_eq!(session.watchlist().len(), 1);
    }

    #[tokio::test]
    async fn test_already_watched_annotations() {
        let (mut session, _catalog, _slots) = setup().await;

        session.select("tt1");
        session.settle().await;
        session.rate_selected(7).unwrap();

        session.select("tt1");
        session.settle().await;
        let snapshot = session.snapshot();
        assert!(snapshot.selection.is_already_watched);
        assert_eq!(snapshot.selection.watched_user_rating, Some(7));

        assert_eq!(
            session.rate_selected(9),
            Err(SessionError::AlreadyWatched("tt1".to_string()))
        );
    }

    #[tokio::test]
    async fn test_rate_selected_rejections() {
        let (mut session, catalog, _slots) = setup().await;

        assert_eq!(session.rate_selected(5), Err(SessionError::NothingSelected));
        assert_eq!(
            session.rate_selected(0),
            Err(SessionError::RatingOutOfRange { rating: 0, max: 10 })
        );
        assert_eq!(
            session.rate_selected(11),
            Err(SessionError::RatingOutOfRange { rating: 11, max: 10 })
        );

        let _gate = catalog.hold_detail("tt2").await;
        session.select("tt2");
        assert_eq!(
            session.rate_selected(5),
            Err(SessionError::DetailNotLoaded("tt2".to_string()))
        );
    }

    #[tokio::test]
    async fn test_execute_commands() {
        let (mut session, _catalog, _slots) = setup().await;

        session
            .execute(SessionCommand::Add(fixtures::watched_item("tt9", "Heat", 9)))
            .unwrap();
        assert_eq!(session.watchlist().len(), 1);

        session
            .execute(SessionCommand::Remove("tt9".to_string()))
            .unwrap();
        assert!(session.watchlist().is_empty());

        assert_eq!(
            session.execute(SessionCommand::RateSelected(3)),
            Err(SessionError::NothingSelected)
        );
    }

    #[tokio::test]
    async fn test_reload_restores_watchlist() {
        let (mut session, catalog, slots) = setup().await;
        session.add(fixtures::watched_item("tt1", "Batman", 8));
        drop(session);

        let reloaded = Session::new(
            catalog,
            PersistentStore::new(slots),
            SessionOptions::default(),
        );
        assert!(reloaded.watchlist().contains("tt1"));
    }
}
