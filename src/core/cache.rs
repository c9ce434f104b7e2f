//! In-process memory cache service
//!
//! Registered into the service registry next to the migrations runner. Values
//! are type-erased and looked up by string key.

use moka::sync::Cache;
use std::any::Any;
use std::sync::Arc;

/// Entries kept before the least recently used ones are evicted
const DEFAULT_CAPACITY: u64 = 1_000;

/// Thread-safe key/value cache
///
/// Cloning is cheap and clones share their entries.
#[derive(Clone)]
pub struct MemoryCache {
    entries: Cache<String, Arc<dyn Any + Send + Sync>>,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty cache holding at most `capacity` entries
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// Store a value, replacing any previous one under `key`
    pub fn set<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), Arc::new(value));
    }

    /// Get a clone of the value stored under `key`
    ///
    /// Returns `None` if the key is missing or holds another type.
    pub fn get<T: Any + Clone>(&self, key: &str) -> Option<T> {
        self.entries.get(key)?.downcast_ref::<T>().cloned()
    }

    /// Check whether an entry exists for `key`
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove an entry, returning whether one was present
    pub fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }

    /// Check if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}
