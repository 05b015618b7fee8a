pub mod config;
pub mod external_catalog;
pub mod fetch;
pub mod metrics;
pub mod search;
pub mod selection;
pub mod session;
pub mod store;
pub mod testing;
pub mod watchlist;

pub use config::{
    load_config, load_config_from_str, validate_config, CatalogConfig, Config, ConfigError,
    RatingConfig, SanitizedConfig, SearchConfig, ServerConfig, StorageConfig,
};
pub use external_catalog::{Catalog, CatalogError, ItemDetail, OmdbClient, SearchResult};
pub use fetch::{CancelHandle, CancellableFetcher, Completion, RequestEpoch};
pub use search::{SearchController, SearchSnapshot, SearchStatus};
pub use selection::{SelectionController, SelectionSnapshot};
pub use session::{
    create_session_system, Session, SessionCommand, SessionDriver, SessionError, SessionEvent,
    SessionHandle, SessionOptions, SessionSnapshot,
};
pub use store::{MemorySlotStore, PersistentStore, SlotStore, SqliteSlotStore, StoreError};
pub use watchlist::{WatchedItem, WatchedSummary, WatchlistController};
