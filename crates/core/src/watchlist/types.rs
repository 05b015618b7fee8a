use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::external_catalog::ItemDetail;

/// An item the user has watched and rated.
///
/// Only created by committing a loaded detail together with a user rating.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchedItem {
    pub id: String,
    pub title: String,
    pub year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub runtime_minutes: Option<u32>,
    #[serde(default)]
    pub catalog_rating: Option<f32>,
    pub user_rating: u8,
    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,
}

impl WatchedItem {
    /// Commit `detail` with the user's rating.
    pub fn from_detail(detail: &ItemDetail, user_rating: u8) -> Self {
        Self {
            id: detail.id.clone(),
            title: detail.title.clone(),
            year: detail.year.clone(),
            poster_url: detail.poster_url.clone(),
            runtime_minutes: detail.runtime_minutes(),
            catalog_rating: detail.catalog_rating(),
            user_rating,
            added_at: Utc::now(),
        }
    }
}

/// Aggregates over the watched list.
///
/// Averages only count items that carry the value; `None` when none do.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct WatchedSummary {
    pub count: usize,
    pub avg_catalog_rating: Option<f64>,
    pub avg_user_rating: Option<f64>,
    pub avg_runtime_minutes: Option<f64>,
}

impl WatchedSummary {
    pub fn from_items(items: &[WatchedItem]) -> Self {
        Self {
            count: items.len(),
            avg_catalog_rating: average(items.iter().filter_map(|i| i.catalog_rating.map(f64::from))),
            avg_user_rating: average(items.iter().map(|i| f64::from(i.user_rating))),
            avg_runtime_minutes: average(
                items.iter().filter_map(|i| i.runtime_minutes.map(f64::from)),
            ),
        }
    }
}

fn average(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
