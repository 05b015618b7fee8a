use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{SlotStore, StoreError};

/// In-memory slot store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemorySlotStore {
    slots: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StoreError> {
        self.slots
            .lock()
            .map_err(|_| StoreError::Database("slot map lock poisoned".to_string()))
    }
}

impl SlotStore for MemorySlotStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database("write rejected".to_string()));
        }
        self.lock()?.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
