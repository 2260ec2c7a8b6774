//! Stratacache Library
//!
//! Namespaced key/value caching over interchangeable storage backends, with a
//! tiered cache that reads through an ordered stack of caches and can bubble
//! lower-tier hits back up.
//!
//! ```no_run
//! use serde_json::json;
//! use stratacache::cache::{Cache, Namespace, PathKeyCache, TieredCache};
//! use stratacache::storage::{FilesystemStorage, MemoryStorage};
//!
//! # fn main() -> stratacache::error::Result<()> {
//! let cache = TieredCache::new(
//!     vec![
//!         Box::new(PathKeyCache::new(MemoryStorage::new())),
//!         Box::new(PathKeyCache::new(FilesystemStorage::new("/tmp/stratacache")?)),
//!     ],
//!     true,
//! )?;
//!
//! let users = Namespace::from("users");
//! cache.save("42", json!({"name": "alice"}), Some(3600), &users);
//! assert!(cache.contains("42", &users));
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod storage;
