//! Filesystem storage
//!
//! Each entry is a JSON file named after the SHA-256 of its key and placed two
//! directory levels deep (`ab12cd34/ef56ab78/<hash>.json`) so no single
//! directory grows too large. The file keeps the original key next to the
//! entry, which lets namespace flushes match on key prefixes.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::Storage;
use crate::cache::{CacheStats, Entry};
use crate::error::{CacheError, Result};

/// Length of each directory shard taken from the key hash
const SHARD_LEN: usize = 8;

/// Number of shard directories between the root and the entry file
const SHARD_DEPTH: usize = 2;

const ENTRY_EXTENSION: &str = "json";

/// On-disk wrapper for an entry
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile<K, E> {
    /// The full composed key
    key: K,
    /// The stored entry
    entry: E,
}

/// Stores entries as JSON files below a root directory
#[derive(Debug, Clone)]
pub struct FilesystemStorage {
    /// Directory where cache files are stored
    directory: PathBuf,
}

impl FilesystemStorage {
    /// Creates storage rooted at `directory`, creating it if needed
    ///
    /// # Returns
    /// * `Ok(FilesystemStorage)` if the directory exists and is writable
    /// * `Err(CacheError::DirectoryNotWritable)` otherwise
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();

        if let Err(e) = fs::create_dir_all(&directory) {
            warn!(path = %directory.display(), error = %e, "could not create cache directory");
            return Err(CacheError::DirectoryNotWritable(directory));
        }

        if !is_writable_dir(&directory) {
            return Err(CacheError::DirectoryNotWritable(directory));
        }

        let directory = directory.canonicalize()?;
        debug!(path = %directory.display(), "filesystem cache ready");
        Ok(Self { directory })
    }

    /// Creates storage in the per-user cache directory for `app`
    ///
    /// Uses `~/.cache/<app>/` on Linux, or the equivalent platform path.
    /// Returns `None` if the directory cannot be determined (e.g., no home
    /// directory) or cannot be created.
    pub fn user_cache(app: &str) -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", app)?;
        Self::new(project_dirs.cache_dir()).ok()
    }

    /// The root directory of this storage
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the path of the file holding `key`
    fn entry_path(&self, key: &str) -> PathBuf {
        let hash = hex::encode(Sha256::digest(key.as_bytes()));
        let mut path = self.directory.clone();
        for depth in 0..SHARD_DEPTH {
            path.push(&hash[depth * SHARD_LEN..(depth + 1) * SHARD_LEN]);
        }
        path.push(format!("{}.{}", hash, ENTRY_EXTENSION));
        path
    }

    /// Reads and parses the file at `path`
    fn read_file(path: &Path) -> Option<CacheFile<String, Entry>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read cache file");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(file) => Some(file),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt cache file");
                None
            }
        }
    }

    /// Collects every entry file below the root directory
    fn entry_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        collect_entry_files(&self.directory, &mut files);
        files
    }
}

/// Whether `path` is a directory we may write to
fn is_writable_dir(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => metadata.is_dir() && !metadata.permissions().readonly(),
        Err(_) => false,
    }
}

/// Removes the shard directories above a deleted entry file once they are
/// empty. Stops at the first directory that still holds something.
fn prune_shard_dirs(entry_path: &Path) {
    for dir in entry_path.ancestors().skip(1).take(SHARD_DEPTH) {
        if fs::remove_dir(dir).is_err() {
            break;
        }
    }
}

fn collect_entry_files(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(read_dir) = fs::read_dir(dir) else {
        return;
    };

    for dir_entry in read_dir.flatten() {
        let path = dir_entry.path();
        if path.is_dir() {
            collect_entry_files(&path, files);
        } else if path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION) {
            files.push(path);
        }
    }
}

impl Storage for FilesystemStorage {
    fn get(&self, key: &str) -> Option<Entry> {
        let file = Self::read_file(&self.entry_path(key))?;
        if file.key != key {
            warn!(key, stored = %file.key, "cache file holds a different key");
            return None;
        }
        Some(file.entry)
    }

    fn exists(&self, key: &str) -> bool {
        self.entry_path(key).is_file()
    }

    fn put(&self, key: &str, entry: &Entry, _ttl_secs: u64) -> bool {
        let path = self.entry_path(key);

        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "could not create shard directory");
                return false;
            }
        }

        let file = CacheFile { key, entry };
        let json = match serde_json::to_string(&file) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "could not serialize cache entry");
                return false;
            }
        };

        match fs::write(&path, json) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not write cache file");
                false
            }
        }
    }

    fn delete(&self, key: &str) -> bool {
        let path = self.entry_path(key);
        if fs::remove_file(&path).is_err() {
            return false;
        }
        prune_shard_dirs(&path);
        true
    }

    fn flush(&self, prefix: Option<&str>) -> bool {
        let mut ok = true;

        for path in self.entry_files() {
            if let Some(prefix) = prefix {
                match Self::read_file(&path) {
                    Some(file) if file.key.starts_with(prefix) => {}
                    _ => continue,
                }
            }

            match fs::remove_file(&path) {
                Ok(()) => prune_shard_dirs(&path),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not remove cache file");
                    ok = false;
                }
            }
        }

        ok
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entry_files().len() as u64,
            ..Default::default()
        }
    }

    fn available(&self) -> bool {
        is_writable_dir(&self.directory)
    }
}
