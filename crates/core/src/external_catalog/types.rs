//! Catalog records as exposed to the rest of the crate.

use serde::{Deserialize, Serialize};

/// One row of a catalog search. Display-only; never mutated locally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// Catalog identifier (e.g. `tt0096895`).
    pub id: String,
    pub title: String,
    /// Release year as the catalog reports it ("1989", "2008–2013").
    pub year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
}

/// Full catalog record for a single item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemDetail {
    pub id: String,
    pub title: String,
    pub year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    /// Runtime text, e.g. "126 min".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    /// Catalog rating text, e.g. "7.5".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

impl ItemDetail {
    /// Leading integer of the runtime text ("136 min" -> 136).
    pub fn runtime_minutes(&self) -> Option<u32> {
        self.runtime
            .as_deref()
            .and_then(|r| r.split_whitespace().next())
            .and_then(|n| n.parse().ok())
    }

    /// Catalog rating as a number.
    pub fn catalog_rating(&self) -> Option<f32> {
        self.imdb_rating
            .as_deref()
            .and_then(|r| r.trim().parse::<f32>().ok())
            .filter(|r| r.is_finite())
    }
}
