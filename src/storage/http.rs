//! Remote key/value storage over HTTP
//!
//! Talks to a small REST key/value service:
//!
//! | Call | Request | Success |
//! |---|---|---|
//! | get | `GET {base}/entries/{key}` | `200` with the JSON entry, `404` if missing |
//! | exists | `HEAD {base}/entries/{key}` | `200`, `404` if missing |
//! | put | `PUT {base}/entries/{key}?ttl={secs}` | any `2xx` |
//! | delete | `DELETE {base}/entries/{key}` | `200`/`204`, `404` if missing |
//! | flush | `DELETE {base}/entries[?prefix={prefix}]` | any `2xx` |
//! | stats | `GET {base}/stats` | JSON [`CacheStats`] |
//! | health | `GET {base}/health` | any `2xx` |
//!
//! The service is expected to expire entries itself when given a TTL.
//! Transport failures read as absence or `false`.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use tracing::{debug, warn};

use super::Storage;
use crate::cache::{CacheStats, Entry};
use crate::error::{CacheError, Result};

/// Request timeout used when none is given
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Storage on a remote key/value service
#[derive(Debug, Clone)]
pub struct HttpStorage {
    client: Client,
    base_url: Url,
}

impl HttpStorage {
    /// Creates storage for the service at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates storage with a custom request timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(client, base_url)
    }

    /// Creates storage with a custom HTTP client
    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CacheError::Config(format!("invalid base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(CacheError::Config(format!(
                "'{}' cannot be used as a base URL",
                base_url
            )));
        }
        Ok(Self { client, base_url })
    }

    /// The service base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds `{base}/{segments...}` with each segment percent-encoded
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn entry_url(&self, key: &str) -> Url {
        self.url(&["entries", key])
    }

    /// Logs transport errors and passes successful responses through
    fn checked(result: reqwest::Result<Response>, op: &str, key: &str) -> Option<Response> {
        match result {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(op, key, error = %e, "remote cache request failed");
                None
            }
        }
    }
}

impl Storage for HttpStorage {
    fn get(&self, key: &str) -> Option<Entry> {
        let response = Self::checked(self.client.get(self.entry_url(key)).send(), "get", key)?;

        match response.status() {
            StatusCode::OK => match response.json::<Entry>() {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(key, error = %e, "remote cache returned an unreadable entry");
                    None
                }
            },
            StatusCode::NOT_FOUND => None,
            status => {
                warn!(key, %status, "unexpected status from remote cache");
                None
            }
        }
    }

    fn exists(&self, key: &str) -> bool {
        Self::checked(self.client.head(self.entry_url(key)).send(), "exists", key)
            .is_some_and(|response| response.status() == StatusCode::OK)
    }

    fn put(&self, key: &str, entry: &Entry, ttl_secs: u64) -> bool {
        let mut url = self.entry_url(key);
        if ttl_secs > 0 {
            url.query_pairs_mut().append_pair("ttl", &ttl_secs.to_string());
        }

        Self::checked(self.client.put(url).json(entry).send(), "put", key)
            .is_some_and(|response| response.status().is_success())
    }

    fn delete(&self, key: &str) -> bool {
        Self::checked(self.client.delete(self.entry_url(key)).send(), "delete", key)
            .is_some_and(|response| {
                matches!(response.status(), StatusCode::OK | StatusCode::NO_CONTENT)
            })
    }

    fn flush(&self, prefix: Option<&str>) -> bool {
        let mut url = self.url(&["entries"]);
        if let Some(prefix) = prefix {
            url.query_pairs_mut().append_pair("prefix", prefix);
        }
        debug!(%url, "flushing remote cache");

        Self::checked(self.client.delete(url).send(), "flush", prefix.unwrap_or(""))
            .is_some_and(|response| response.status().is_success())
    }

    fn stats(&self) -> CacheStats {
        Self::checked(self.client.get(self.url(&["stats"])).send(), "stats", "")
            .filter(|response| response.status().is_success())
            .and_then(|response| response.json::<CacheStats>().ok())
            .unwrap_or_default()
    }

    fn available(&self) -> bool {
        Self::checked(self.client.get(self.url(&["health"])).send(), "health", "")
            .is_some_and(|response| response.status().is_success())
    }
}
