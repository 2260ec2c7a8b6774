//! Stored entries, remaining lifetimes and the clock used to age them

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The unit persisted by every storage backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// The cached value
    pub data: Value,
    /// When the entry expires; `None` means it never does
    pub expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    /// Creates an entry that expires `ttl_secs` after `now`.
    ///
    /// A TTL of `0` produces a never-expiring entry, and so does a TTL that
    /// would land beyond the largest representable timestamp.
    pub fn new(data: Value, ttl_secs: u64, now: DateTime<Utc>) -> Self {
        let expires_at = match ttl_secs {
            0 => None,
            secs => i64::try_from(secs)
                .ok()
                .and_then(Duration::try_seconds)
                .and_then(|ttl| now.checked_add_signed(ttl)),
        };
        Self { data, expires_at }
    }

    /// Whether the entry is still valid at `now`
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expires_at) => expires_at > now,
        }
    }

    /// Remaining lifetime at `now`, clamped at zero
    pub fn time_to_live_at(&self, now: DateTime<Utc>) -> TimeToLive {
        match self.expires_at {
            None => TimeToLive::Never,
            Some(expires_at) => {
                TimeToLive::Remaining((expires_at - now).num_seconds().max(0) as u64)
            }
        }
    }
}

/// Remaining lifetime of a cached entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeToLive {
    /// The entry never expires
    Never,
    /// Seconds until the entry expires
    Remaining(u64),
}

impl TimeToLive {
    /// Seconds left, with `0` standing for a never-expiring entry
    pub fn as_secs(&self) -> u64 {
        match self {
            TimeToLive::Never => 0,
            TimeToLive::Remaining(secs) => *secs,
        }
    }
}

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Returns the current instant
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
///
/// Lets tests age entries without sleeping.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl ManualClock {
    /// Creates a clock frozen at `start`
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward by `secs` seconds, stopping at the latest
    /// representable instant
    pub fn advance(&self, secs: u64) {
        let mut now = self.now.lock();
        let advanced = i64::try_from(secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|step| now.checked_add_signed(step))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        *now = advanced;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
