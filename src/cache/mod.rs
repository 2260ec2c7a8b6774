//! Cache module: the public cache surface and its two implementations
//!
//! [`PathKeyCache`] turns `(id, namespace)` operations into single-key calls on a
//! [`Storage`](crate::storage::Storage) backend and owns TTL accounting.
//! [`TieredCache`] stacks any number of caches, reading through them in order
//! and fanning writes out to all of them.
//!
//! Both implement [`Cache`], so tiered caches can themselves be used as tiers.

mod entry;
mod namespace;
mod path_key;
mod tiered;

pub use entry::{Clock, Entry, ManualClock, SystemClock, TimeToLive};
pub use namespace::{Namespace, DEFAULT_NAMESPACE_DELIMITER};
pub use path_key::{PathKeyCache, PathKeyConfig};
pub use tiered::TieredCache;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Statistics reported by a single cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of stored entries
    pub size: u64,
    /// Backend uptime, if the backend tracks it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime_secs: Option<u64>,
    /// Approximate memory used by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_bytes: Option<u64>,
}

/// Statistics snapshot of a cache or a stack of caches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Stats {
    /// Statistics of a single cache
    Single(CacheStats),
    /// Statistics of each tier, in stack order
    Tiered(Vec<Stats>),
}

impl Stats {
    /// Entry count of a single cache, `None` for a stack
    pub fn size(&self) -> Option<u64> {
        match self {
            Stats::Single(stats) => Some(stats.size),
            Stats::Tiered(_) => None,
        }
    }
}

/// Operations shared by every cache
///
/// Absence is always `None`, never an error, and a cached JSON `null` is a
/// value like any other. Writes report success as a boolean.
pub trait Cache: Send + Sync {
    /// Returns the value stored under `id` in `namespace`
    fn fetch(&self, id: &str, namespace: &Namespace) -> Option<Value>;

    /// Whether a live entry exists for `id` in `namespace`
    fn contains(&self, id: &str, namespace: &Namespace) -> bool;

    /// Remaining lifetime of the entry, `None` if there is no such entry
    fn time_to_live(&self, id: &str, namespace: &Namespace) -> Option<TimeToLive>;

    /// Stores `data` under `id`
    ///
    /// # Arguments
    /// * `life_time` - Seconds to keep the entry; `None` uses the default TTL,
    ///   `Some(0)` keeps it forever
    fn save(&self, id: &str, data: Value, life_time: Option<u64>, namespace: &Namespace) -> bool;

    /// Removes the entry, returning `true` only if something was deleted
    fn delete(&self, id: &str, namespace: &Namespace) -> bool;

    /// Removes every entry in `namespace`; the root namespace clears the cache
    fn flush(&self, namespace: &Namespace) -> bool;

    /// Statistics snapshot
    fn stats(&self) -> Stats;

    /// Whether the cache can currently be used
    fn available(&self) -> bool {
        true
    }
}

/// Typed access on top of [`Cache`]
pub trait CacheExt: Cache {
    /// Fetches the value and deserializes it into `T`
    ///
    /// A value that does not fit `T` reads as absent.
    fn fetch_as<T: DeserializeOwned>(&self, id: &str, namespace: &Namespace) -> Option<T> {
        let value = self.fetch(id, namespace)?;
        match serde_json::from_value(value) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(id, error = %e, "cached value has an unexpected shape");
                None
            }
        }
    }

    /// Serializes `data` and saves it
    fn save_as<T: Serialize>(
        &self,
        id: &str,
        data: &T,
        life_time: Option<u64>,
        namespace: &Namespace,
    ) -> bool {
        match serde_json::to_value(data) {
            Ok(value) => self.save(id, value, life_time, namespace),
            Err(e) => {
                warn!(id, error = %e, "value could not be serialized");
                false
            }
        }
    }
}

impl<C: Cache + ?Sized> CacheExt for C {}

impl<C: Cache + ?Sized> Cache for Box<C> {
    fn fetch(&self, id: &str, namespace: &Namespace) -> Option<Value> {
        (**self).fetch(id, namespace)
    }

    fn contains(&self, id: &str, namespace: &Namespace) -> bool {
        (**self).contains(id, namespace)
    }

    fn time_to_live(&self, id: &str, namespace: &Namespace) -> Option<TimeToLive> {
        (**self).time_to_live(id, namespace)
    }

    fn save(&self, id: &str, data: Value, life_time: Option<u64>, namespace: &Namespace) -> bool {
        (**self).save(id, data, life_time, namespace)
    }

    fn delete(&self, id: &str, namespace: &Namespace) -> bool {
        (**self).delete(id, namespace)
    }

    fn flush(&self, namespace: &Namespace) -> bool {
        (**self).flush(namespace)
    }

    fn stats(&self) -> Stats {
        (**self).stats()
    }

    fn available(&self) -> bool {
        (**self).available()
    }
}
