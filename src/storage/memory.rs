//! In-memory storage
//!
//! Entries live in a `HashMap` behind a lock. Each [`MemoryStorage::new`] gets
//! its own map; [`MemoryStorage::shared`] hands out handles to a single map that
//! lives for the whole process, so every cache built on it sees the same data.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use super::Storage;
use crate::cache::{CacheStats, Entry};

type EntryMap = Arc<RwLock<HashMap<String, Entry>>>;

static SHARED: Lazy<EntryMap> = Lazy::new(EntryMap::default);

/// Storage backed by a process-local map
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    entries: EntryMap,
    created_at: Instant,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Creates storage with its own empty map
    pub fn new() -> Self {
        Self {
            entries: EntryMap::default(),
            created_at: Instant::now(),
        }
    }

    /// Returns a handle to the process-wide map
    pub fn shared() -> Self {
        Self {
            entries: Arc::clone(&SHARED),
            created_at: Instant::now(),
        }
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<Entry> {
        self.entries.read().get(key).cloned()
    }

    fn exists(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    fn put(&self, key: &str, entry: &Entry, _ttl_secs: u64) -> bool {
        self.entries.write().insert(key.to_string(), entry.clone());
        true
    }

    fn delete(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    fn flush(&self, prefix: Option<&str>) -> bool {
        let mut entries = self.entries.write();
        match prefix {
            None => entries.clear(),
            Some(prefix) => entries.retain(|key, _| !key.starts_with(prefix)),
        }
        true
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.len() as u64,
            uptime_secs: Some(self.created_at.elapsed().as_secs()),
            memory_bytes: None,
        }
    }
}
