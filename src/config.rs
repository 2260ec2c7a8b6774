//! Stack configuration files
//!
//! Describes a tiered cache in JSON so it can be assembled at runtime:
//!
//! ```json
//! {
//!   "bubble_on_fetch": true,
//!   "default_ttl": 3600,
//!   "tiers": [
//!     { "type": "memory" },
//!     { "type": "filesystem", "directory": "/var/cache/app" },
//!     { "type": "http", "base_url": "http://cache.internal:8080/", "timeout_secs": 2 }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::{Cache, PathKeyCache, PathKeyConfig, TieredCache};
use crate::error::{CacheError, Result};
use crate::storage::{http::DEFAULT_TIMEOUT_SECS, FilesystemStorage, HttpStorage, MemoryStorage};

/// Application name used for the per-user cache directory
pub const DEFAULT_APP_NAME: &str = "stratacache";

/// One tier of a configured stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TierConfig {
    /// Private in-memory map
    Memory,
    /// Process-wide in-memory map
    SharedMemory,
    /// JSON files below `directory`
    Filesystem { directory: String },
    /// The per-user cache directory for `app`
    UserCache {
        #[serde(default = "default_app_name")]
        app: String,
    },
    /// Remote key/value service
    Http {
        base_url: String,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

/// A tiered cache description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackConfig {
    /// Restore lower-tier hits into higher tiers
    #[serde(default)]
    pub bubble_on_fetch: bool,
    /// Namespace delimiter for every tier
    #[serde(default)]
    pub delimiter: Option<String>,
    /// Lifetime applied when a save gives none
    #[serde(default)]
    pub default_ttl: Option<u64>,
    /// Tiers, highest priority first
    pub tiers: Vec<TierConfig>,
}

impl Default for StackConfig {
    /// A single tier in the user cache directory
    fn default() -> Self {
        Self {
            bubble_on_fetch: false,
            delimiter: None,
            default_ttl: None,
            tiers: vec![TierConfig::UserCache {
                app: default_app_name(),
            }],
        }
    }
}

impl StackConfig {
    /// Reads a configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parses a configuration from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Key settings shared by every tier
    pub fn path_key_config(&self) -> PathKeyConfig {
        let defaults = PathKeyConfig::default();
        PathKeyConfig {
            delimiter: self.delimiter.clone().unwrap_or(defaults.delimiter),
            default_ttl: self.default_ttl.unwrap_or(defaults.default_ttl),
        }
    }

    /// Assembles the described tiered cache
    ///
    /// # Returns
    /// * `Err(CacheError::EmptyStack)` if no tiers are listed
    /// * `Err(CacheError::Config)` if a tier cannot be set up
    pub fn build(&self) -> Result<TieredCache> {
        let path_key = self.path_key_config();
        if path_key.delimiter.is_empty() {
            return Err(CacheError::Config("delimiter must not be empty".to_string()));
        }

        let stack = self
            .tiers
            .iter()
            .map(|tier| build_tier(tier, &path_key))
            .collect::<Result<Vec<_>>>()?;

        debug!(tiers = stack.len(), bubble = self.bubble_on_fetch, "built cache stack");
        TieredCache::new(stack, self.bubble_on_fetch)
    }
}

fn build_tier(tier: &TierConfig, path_key: &PathKeyConfig) -> Result<Box<dyn Cache>> {
    let config = path_key.clone();
    let cache: Box<dyn Cache> = match tier {
        TierConfig::Memory => Box::new(PathKeyCache::with_config(MemoryStorage::new(), config)),
        TierConfig::SharedMemory => {
            Box::new(PathKeyCache::with_config(MemoryStorage::shared(), config))
        }
        TierConfig::Filesystem { directory } => Box::new(PathKeyCache::with_config(
            FilesystemStorage::new(directory)?,
            config,
        )),
        TierConfig::UserCache { app } => {
            let storage = FilesystemStorage::user_cache(app).ok_or_else(|| {
                CacheError::Config(format!("no user cache directory available for '{}'", app))
            })?;
            Box::new(PathKeyCache::with_config(storage, config))
        }
        TierConfig::Http {
            base_url,
            timeout_secs,
        } => {
            let timeout = Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
            Box::new(PathKeyCache::with_config(
                HttpStorage::with_timeout(base_url, timeout)?,
                config,
            ))
        }
    };
    Ok(cache)
}
