//! Testing utilities and mock implementations.
//!
//! Lets sessions and servers run end to end without the real catalog.
//!
//! # Example
//!
//! ```rust,ignore
//! use popcorn_core::testing::{MockCatalog, fixtures};
//!
//! let catalog = MockCatalog::new();
//! catalog.add_item(fixtures::item_detail("tt1", "Batman", 126, "7.5")).await;
//!
//! // Use in a Session...
//! ```

mod mock_catalog;

pub use mock_catalog::{Gate, MockCatalog, RecordedCatalogQuery};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::external_catalog::{ItemDetail, SearchResult};
    use crate::watchlist::WatchedItem;

    /// Create a search row without a poster.
    pub fn search_result(id: &str, title: &str, year: &str) -> SearchResult {
        SearchResult {
            id: id.to_string(),
            title: title.to_string(),
            year: year.to_string(),
            poster_url: None,
        }
    }

    /// Create a detail record with the fields a watched item is built from.
    pub fn item_detail(id: &str, title: &str, runtime_minutes: u32, rating: &str) -> ItemDetail {
        ItemDetail {
            id: id.to_string(),
            title: title.to_string(),
            year: "1989".to_string(),
            poster_url: Some(format!("https://img.example/{}.jpg", id)),
            runtime: Some(format!("{} min", runtime_minutes)),
            imdb_rating: Some(rating.to_string()),
            plot: Some(format!("{} plot.", title)),
            released: None,
            actors: None,
            director: None,
            genre: None,
        }
    }

    /// Create a watched item as if `detail` had been rated.
    pub fn watched_item(id: &str, title: &str, user_rating: u8) -> WatchedItem {
        WatchedItem::from_detail(&item_detail(id, title, 120, "7.0"), user_rating)
    }
}
