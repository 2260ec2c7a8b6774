//! Path-keyed cache over a single storage backend
//!
//! Flattens `(id, namespace)` into one string key, converts lifetimes into
//! absolute expiry timestamps, and hides entries that are logically expired
//! even when the backend still holds them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{
    Cache, Clock, Entry, Namespace, Stats, SystemClock, TimeToLive, DEFAULT_NAMESPACE_DELIMITER,
};
use crate::storage::Storage;

/// Key composition and TTL settings for a [`PathKeyCache`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathKeyConfig {
    /// Joins namespace segments and ids into storage keys
    pub delimiter: String,
    /// Lifetime in seconds used when a save gives none; `0` never expires
    pub default_ttl: u64,
}

impl Default for PathKeyConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_NAMESPACE_DELIMITER.to_string(),
            default_ttl: 0,
        }
    }
}

/// A cache that stores each entry under a composed path key
pub struct PathKeyCache<S> {
    storage: S,
    config: PathKeyConfig,
    clock: Arc<dyn Clock>,
}

impl<S: Storage> PathKeyCache<S> {
    /// Creates a cache with the default delimiter and no default TTL
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, PathKeyConfig::default())
    }

    /// Creates a cache with explicit settings
    pub fn with_config(storage: S, config: PathKeyConfig) -> Self {
        Self {
            storage,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The configured namespace delimiter
    pub fn namespace_delimiter(&self) -> &str {
        &self.config.delimiter
    }

    /// The lifetime applied when a save gives none
    pub fn default_time_to_live(&self) -> u64 {
        self.config.default_ttl
    }

    /// The wrapped storage backend
    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn key(&self, id: &str, namespace: &Namespace) -> String {
        namespace.compose(id, &self.config.delimiter)
    }

    /// Reads the entry for `key` if it has not expired
    fn live_entry(&self, key: &str) -> Option<Entry> {
        if !self.storage.exists(key) {
            return None;
        }
        self.storage
            .get(key)
            .filter(|entry| entry.is_live_at(self.clock.now()))
    }
}

impl<S: Storage> Cache for PathKeyCache<S> {
    fn fetch(&self, id: &str, namespace: &Namespace) -> Option<Value> {
        self.live_entry(&self.key(id, namespace)).map(|entry| entry.data)
    }

    fn contains(&self, id: &str, namespace: &Namespace) -> bool {
        self.live_entry(&self.key(id, namespace)).is_some()
    }

    fn time_to_live(&self, id: &str, namespace: &Namespace) -> Option<TimeToLive> {
        let entry = self.live_entry(&self.key(id, namespace))?;
        Some(entry.time_to_live_at(self.clock.now()))
    }

    fn save(&self, id: &str, data: Value, life_time: Option<u64>, namespace: &Namespace) -> bool {
        let key = self.key(id, namespace);
        let ttl = life_time.unwrap_or(self.config.default_ttl);
        let entry = Entry::new(data, ttl, self.clock.now());

        debug!(key = %key, ttl, "saving entry");
        self.storage.put(&key, &entry, ttl)
    }

    fn delete(&self, id: &str, namespace: &Namespace) -> bool {
        self.storage.delete(&self.key(id, namespace))
    }

    fn flush(&self, namespace: &Namespace) -> bool {
        let prefix = namespace.prefix(&self.config.delimiter);
        self.storage.flush(prefix.as_deref())
    }

    fn stats(&self) -> Stats {
        Stats::Single(self.storage.stats())
    }

    fn available(&self) -> bool {
        self.storage.available()
    }
}
