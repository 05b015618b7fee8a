//! Durable named slots for local state.
//!
//! A slot holds one serialized value and is replaced atomically on write.
//! [`PersistentStore`] layers typed, fail-soft loading on top.

mod memory;
mod sqlite;

pub use memory::MemorySlotStore;
pub use sqlite::SqliteSlotStore;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Trait for raw slot storage.
pub trait SlotStore: Send + Sync {
    /// Read the raw value of a slot, `None` if it was never written.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value of a slot.
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Typed JSON access to a [`SlotStore`].
#[derive(Clone)]
pub struct PersistentStore {
    slots: Arc<dyn SlotStore>,
}

impl PersistentStore {
    pub fn new(slots: Arc<dyn SlotStore>) -> Self {
        Self { slots }
    }

    /// Load a slot, falling back to `default` when it is absent or unreadable.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let raw = match self.slots.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "slot empty, using default");
                return default;
            }
            Err(e) => {
                warn!(key, "Failed to read slot, using default: {}", e);
                return default;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, "Stored value is not parsable, using default: {}", e);
                default
            }
        }
    }

    /// Serialize and write a slot.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let json =
            serde_json::to_string(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.slots.write(key, &json)?;
        debug!(key, bytes = json.len(), "slot saved");
        Ok(())
    }
}
