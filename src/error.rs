//! Error types for cache construction and configuration
//!
//! Runtime cache operations never fail with an error: a missing entry is `None`
//! and a rejected write is `false`. Errors only surface while building caches,
//! e.g. an empty tier stack or a cache directory that cannot be written.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while setting up a cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// A tiered cache needs at least one tier
    #[error("Need at least one cache in the stack")]
    EmptyStack,

    /// The cache directory could not be created or is read-only
    #[error("The directory \"{}\" does not exist or is not writable", .0.display())]
    DirectoryNotWritable(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse JSON
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client setup failed
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result alias for cache setup
pub type Result<T> = std::result::Result<T, CacheError>;
