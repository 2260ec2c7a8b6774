//! Storage backends for path-keyed caches
//!
//! A backend stores raw [`Entry`] values under fully composed string keys. It
//! knows nothing about namespaces or TTL defaults; [`PathKeyCache`] handles
//! both and checks expiry on every read, so a backend may keep expired entries
//! around until they are overwritten or flushed.
//!
//! [`PathKeyCache`]: crate::cache::PathKeyCache

pub mod filesystem;
pub mod http;
pub mod memory;

pub use filesystem::FilesystemStorage;
pub use http::HttpStorage;
pub use memory::MemoryStorage;

use crate::cache::{CacheStats, Entry};

/// Minimal key/value contract a cache backend must satisfy
///
/// Every call is treated as atomic and blocking. Backend failures are mapped
/// to absence or `false`; they are never surfaced as errors.
pub trait Storage: Send + Sync {
    /// Reads the entry stored under `key`
    fn get(&self, key: &str) -> Option<Entry>;

    /// Whether anything is stored under `key`
    fn exists(&self, key: &str) -> bool;

    /// Stores `entry` under `key`
    ///
    /// # Arguments
    /// * `ttl_secs` - Lifetime for backends with native expiry; `0` means none
    fn put(&self, key: &str, entry: &Entry, ttl_secs: u64) -> bool;

    /// Removes the entry, returning `true` iff one existed
    fn delete(&self, key: &str) -> bool;

    /// Removes every key starting with `prefix`, or everything for `None`
    fn flush(&self, prefix: Option<&str>) -> bool;

    /// Statistics snapshot, at least the entry count
    fn stats(&self) -> CacheStats;

    /// Whether the backend is reachable and writable
    fn available(&self) -> bool {
        true
    }
}
