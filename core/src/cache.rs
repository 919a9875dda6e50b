//! Client-side read cache keyed by logical resource.
//!
//! # Design
//! The cache is an ordinary value that callers own and pass by reference to
//! the operations that read or invalidate it; there is no global instance.
//! Entries sit behind a `RefCell` so concurrently polled operations on the
//! one control thread can share it. No borrow is held across an await.
//! Entries are stored as `serde_json::Value` so one store can hold any
//! collection type, and decoded on the way out. Invalidation only marks an
//! entry stale: the data stays until the next successful read replaces it.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

/// One key per logical resource collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Items,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: serde_json::Value,
    stale: bool,
}

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: RefCell<HashMap<QueryKey, CacheEntry>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store fresh data under `key`, replacing any previous entry.
    pub fn store<T: Serialize>(&self, key: QueryKey, data: &T) -> Result<(), serde_json::Error> {
        let data = serde_json::to_value(data)?;
        self.entries
            .borrow_mut()
            .insert(key, CacheEntry { data, stale: false });
        trace!(?key, "cache entry stored");
        Ok(())
    }

    /// Data under `key` if present and not stale. An entry that no longer
    /// decodes as `T` counts as a miss.
    pub fn fresh<T: DeserializeOwned>(&self, key: QueryKey) -> Option<T> {
        let data = self
            .entries
            .borrow()
            .get(&key)
            .filter(|entry| !entry.stale)?
            .data
            .clone();
        serde_json::from_value(data).ok()
    }

    /// Mark `key` stale so the next read goes to the server. Returns whether
    /// an entry existed.
    pub fn invalidate(&self, key: QueryKey) -> bool {
        match self.entries.borrow_mut().get_mut(&key) {
            Some(entry) => {
                entry.stale = true;
                debug!(?key, "cache entry invalidated");
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, key: QueryKey) -> bool {
        self.entries.borrow().contains_key(&key)
    }

    /// `None` when nothing is cached under `key`.
    pub fn is_stale(&self, key: QueryKey) -> Option<bool> {
        self.entries.borrow().get(&key).map(|entry| entry.stale)
    }

    pub fn remove(&self, key: QueryKey) -> bool {
        self.entries.borrow_mut().remove(&key).is_some()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}
