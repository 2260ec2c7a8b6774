//! Tiered cache
//!
//! Stacks several caches behind one [`Cache`] surface. Reads walk the stack
//! from the top (index 0) and stop at the first hit; writes go to every tier in
//! stack order.
//!
//! With `bubble_on_fetch` enabled, a value found only in a lower tier is saved
//! again into every tier above it, closest tier first, using the remaining
//! lifetime of the hit. Lifetimes are whole seconds, so a bubbled entry may
//! expire up to a second earlier than the original.

use serde_json::Value;
use tracing::{debug, warn};

use super::{Cache, Namespace, Stats, TimeToLive};
use crate::error::{CacheError, Result};

/// A cache made of an ordered stack of caches
pub struct TieredCache {
    stack: Vec<Box<dyn Cache>>,
    bubble_on_fetch: bool,
}

impl std::fmt::Debug for TieredCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredCache")
            .field("tiers", &self.stack.len())
            .field("bubble_on_fetch", &self.bubble_on_fetch)
            .finish()
    }
}

impl TieredCache {
    /// Creates a tiered cache over `stack`
    ///
    /// # Arguments
    /// * `stack` - Caches in priority order, highest first
    /// * `bubble_on_fetch` - Restore lower-tier hits into the tiers above
    ///
    /// # Returns
    /// * `Err(CacheError::EmptyStack)` if `stack` is empty
    pub fn new(stack: Vec<Box<dyn Cache>>, bubble_on_fetch: bool) -> Result<Self> {
        if stack.is_empty() {
            return Err(CacheError::EmptyStack);
        }

        Ok(Self {
            stack,
            bubble_on_fetch,
        })
    }

    /// The tiers, highest priority first
    pub fn stack(&self) -> &[Box<dyn Cache>] {
        &self.stack
    }

    /// Whether lower-tier hits are restored into higher tiers
    pub fn is_bubble_on_fetch(&self) -> bool {
        self.bubble_on_fetch
    }

    /// Saves `data` into tiers `hit - 1` down to `0`
    fn bubble(&self, hit: usize, id: &str, data: &Value, namespace: &Namespace) {
        let life_time = match self.time_to_live(id, namespace) {
            Some(TimeToLive::Never) => 0,
            Some(TimeToLive::Remaining(secs)) if secs > 0 => secs,
            // gone or expiring right now; a zero life time would mean forever
            _ => {
                debug!(id, hit, "entry expiring, not bubbling");
                return;
            }
        };

        for tier in (0..hit).rev() {
            if !self.stack[tier].save(id, data.clone(), Some(life_time), namespace) {
                warn!(id, tier, "bubbling stopped: tier rejected the save");
                return;
            }
            debug!(id, tier, life_time, "bubbled entry");
        }
    }
}

impl Cache for TieredCache {
    fn fetch(&self, id: &str, namespace: &Namespace) -> Option<Value> {
        for (tier, cache) in self.stack.iter().enumerate() {
            if let Some(data) = cache.fetch(id, namespace) {
                debug!(id, tier, "tier hit");
                if self.bubble_on_fetch && tier > 0 {
                    self.bubble(tier, id, &data, namespace);
                }
                return Some(data);
            }
        }

        None
    }

    fn contains(&self, id: &str, namespace: &Namespace) -> bool {
        self.stack.iter().any(|cache| cache.contains(id, namespace))
    }

    fn time_to_live(&self, id: &str, namespace: &Namespace) -> Option<TimeToLive> {
        self.stack
            .iter()
            .find_map(|cache| cache.time_to_live(id, namespace))
    }

    fn save(&self, id: &str, data: Value, life_time: Option<u64>, namespace: &Namespace) -> bool {
        for (tier, cache) in self.stack.iter().enumerate() {
            if !cache.save(id, data.clone(), life_time, namespace) {
                warn!(id, tier, "save failed, skipping remaining tiers");
                return false;
            }
        }

        true
    }

    fn delete(&self, id: &str, namespace: &Namespace) -> bool {
        let mut deleted = true;
        for (tier, cache) in self.stack.iter().enumerate() {
            if !cache.delete(id, namespace) {
                debug!(id, tier, "nothing deleted");
                deleted = false;
            }
        }
        deleted
    }

    fn flush(&self, namespace: &Namespace) -> bool {
        let mut flushed = true;
        for (tier, cache) in self.stack.iter().enumerate() {
            if !cache.flush(namespace) {
                warn!(tier, "flush failed");
                flushed = false;
            }
        }
        flushed
    }

    fn stats(&self) -> Stats {
        Stats::Tiered(self.stack.iter().map(|cache| cache.stats()).collect())
    }

    fn available(&self) -> bool {
        self.stack.iter().all(|cache| cache.available())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStats, PathKeyCache};
    use crate::storage::MemoryStorage;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    /// Records calls and answers from a fixed script
    #[derive(Default)]
    struct ScriptedCache {
        name: &'static str,
        value: Option<Value>,
        ttl: Option<TimeToLive>,
        save_ok: bool,
        delete_ok: bool,
        flush_ok: bool,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedCache {
        fn record(&self, op: &str) {
            self.log.lock().push(format!("{}:{}", self.name, op));
        }
    }

    impl Cache for ScriptedCache {
        fn fetch(&self, _id: &str, _namespace: &Namespace) -> Option<Value> {
            self.record("fetch");
            self.value.clone()
        }

        fn contains(&self, _id: &str, _namespace: &Namespace) -> bool {
            self.record("contains");
            self.value.is_some()
        }

        fn time_to_live(&self, _id: &str, _namespace: &Namespace) -> Option<TimeToLive> {
            self.value.as_ref().and(self.ttl)
        }

        fn save(&self, _id: &str, _data: Value, life_time: Option<u64>, _ns: &Namespace) -> bool {
            self.record(&format!("save({:?})", life_time));
            self.save_ok
        }

        fn delete(&self, _id: &str, _namespace: &Namespace) -> bool {
            self.record("delete");
            self.delete_ok
        }

        fn flush(&self, _namespace: &Namespace) -> bool {
            self.record("flush");
            self.flush_ok
        }

        fn stats(&self) -> Stats {
            Stats::Single(CacheStats::default())
        }
    }

    fn scripted(
        log: &Arc<Mutex<Vec<String>>>,
        name: &'static str,
        value: Option<Value>,
        save_ok: bool,
    ) -> Box<dyn Cache> {
        Box::new(ScriptedCache {
            name,
            value,
            ttl: Some(TimeToLive::Remaining(50)),
            save_ok,
            delete_ok: true,
            flush_ok: true,
            log: Arc::clone(log),
        })
    }

    #[test]
    fn test_empty_stack_is_rejected() {
        let result = TieredCache::new(Vec::new(), false);
        assert!(matches!(result, Err(CacheError::EmptyStack)));
    }

    #[test]
    fn test_fetch_stops_at_first_hit() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let cache = TieredCache::new(
            vec![
                scripted(&log, "a", None, true),
                scripted(&log, "b", Some(json!("b")), true),
                scripted(&log, "c", Some(json!("c")), true),
            ],
            false,
        )
        .expect("Should build stack");

        assert_eq!(cache.fetch("id", &Namespace::root()), Some(json!("b")));
        assert_eq!(*log.lock(), vec!["a:fetch", "b:fetch"]);
    }

    #[test]
    fn test_cached_null_short_circuits() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let cache = TieredCache::new(
            vec![
                scripted(&log, "a", Some(Value::Null), true),
                scripted(&log, "b", Some(json!("b")), true),
            ],
            true,
        )
        .expect("Should build stack");

        assert_eq!(cache.fetch("id", &Namespace::root()), Some(Value::Null));
        assert_eq!(*log.lock(), vec!["a:fetch"]);
    }

    #[test]
    fn test_bubbles_in_descending_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let cache = TieredCache::new(
            vec![
                scripted(&log, "a", None, true),
                scripted(&log, "b", None, true),
                scripted(&log, "c", Some(json!("c")), true),
            ],
            true,
        )
        .expect("Should build stack");

        assert_eq!(cache.fetch("id", &Namespace::root()), Some(json!("c")));
        assert_eq!(
            *log.lock(),
            vec![
                "a:fetch",
                "b:fetch",
                "c:fetch",
                "b:save(Some(50))",
                "a:save(Some(50))"
            ]
        );
    }

    #[test]
    fn test_bubbling_stops_at_failing_tier() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let cache = TieredCache::new(
            vec![
                scripted(&log, "a", None, true),
                scripted(&log, "b", None, false),
                scripted(&log, "c", Some(json!("c")), true),
            ],
            true,
        )
        .expect("Should build stack");

        assert_eq!(cache.fetch("id", &Namespace::root()), Some(json!("c")));
        assert!(!log.lock().contains(&"a:save(Some(50))".to_string()));
    }

    #[test]
    fn test_no_writes_on_miss() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let cache = TieredCache::new(
            vec![scripted(&log, "a", None, true), scripted(&log, "b", None, true)],
            true,
        )
        .expect("Should build stack");

        assert!(cache.fetch("id", &Namespace::root()).is_none());
        assert_eq!(*log.lock(), vec!["a:fetch", "b:fetch"]);
    }

    #[test]
    fn test_no_bubbling_when_entry_expires_now() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let last: Box<dyn Cache> = Box::new(ScriptedCache {
            name: "b",
            value: Some(json!("b")),
            ttl: Some(TimeToLive::Remaining(0)),
            save_ok: true,
            log: Arc::clone(&log),
            ..Default::default()
        });
        let cache = TieredCache::new(vec![scripted(&log, "a", None, true), last], true)
            .expect("Should build stack");

        assert_eq!(cache.fetch("id", &Namespace::root()), Some(json!("b")));
        assert_eq!(*log.lock(), vec!["a:fetch", "b:fetch"]);
    }

    #[test]
    fn test_no_bubbling_when_entry_vanished() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let last: Box<dyn Cache> = Box::new(ScriptedCache {
            name: "b",
            value: Some(json!("b")),
            ttl: None,
            save_ok: true,
            log: Arc::clone(&log),
            ..Default::default()
        });
        let cache = TieredCache::new(vec![scripted(&log, "a", None, true), last], true)
            .expect("Should build stack");

        assert_eq!(cache.fetch("id", &Namespace::root()), Some(json!("b")));
        assert!(log.lock().iter().all(|call| !call.contains("save")));
    }

    #[test]
    fn test_bubbles_never_expiring_entry_with_zero_life_time() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let last: Box<dyn Cache> = Box::new(ScriptedCache {
            name: "b",
            value: Some(json!("b")),
            ttl: Some(TimeToLive::Never),
            log: Arc::clone(&log),
            ..Default::default()
        });
        let cache = TieredCache::new(vec![scripted(&log, "a", None, true), last], true)
            .expect("Should build stack");

        assert_eq!(cache.fetch("id", &Namespace::root()), Some(json!("b")));
        assert_eq!(*log.lock(), vec!["a:fetch", "b:fetch", "a:save(Some(0))"]);
    }

    #[test]
    fn test_save_stops_at_first_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let cache = TieredCache::new(
            vec![
                scripted(&log, "a", None, true),
                scripted(&log, "b", None, false),
                scripted(&log, "c", None, true),
            ],
            false,
        )
        .expect("Should build stack");

        assert!(!cache.save("id", json!(1), Some(5), &Namespace::root()));
        assert_eq!(*log.lock(), vec!["a:save(Some(5))", "b:save(Some(5))"]);
    }

    #[test]
    fn test_delete_visits_every_tier() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first: Box<dyn Cache> = Box::new(ScriptedCache {
            name: "a",
            delete_ok: false,
            log: Arc::clone(&log),
            ..Default::default()
        });
        let cache = TieredCache::new(vec![first, scripted(&log, "b", None, true)], false)
            .expect("Should build stack");

        assert!(!cache.delete("id", &Namespace::root()));
        assert_eq!(*log.lock(), vec!["a:delete", "b:delete"]);
    }

    #[test]
    fn test_flush_visits_every_tier_and_reports_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first: Box<dyn Cache> = Box::new(ScriptedCache {
            name: "a",
            flush_ok: false,
            log: Arc::clone(&log),
            ..Default::default()
        });
        let cache = TieredCache::new(vec![first, scripted(&log, "b", None, true)], false)
            .expect("Should build stack");

        assert!(!cache.flush(&Namespace::from("users")));
        assert_eq!(*log.lock(), vec!["a:flush", "b:flush"]);
    }

    #[test]
    fn test_contains_short_circuits() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let cache = TieredCache::new(
            vec![
                scripted(&log, "a", Some(json!(1)), true),
                scripted(&log, "b", Some(json!(2)), true),
            ],
            false,
        )
        .expect("Should build stack");

        assert!(cache.contains("id", &Namespace::root()));
        assert_eq!(*log.lock(), vec!["a:contains"]);
    }

    #[test]
    fn test_nested_tiered_cache_as_tier() {
        let inner = TieredCache::new(
            vec![Box::new(PathKeyCache::new(MemoryStorage::new()))],
            false,
        )
        .expect("Should build inner stack");
        let outer = TieredCache::new(
            vec![
                Box::new(PathKeyCache::new(MemoryStorage::new())),
                Box::new(inner),
            ],
            true,
        )
        .expect("Should build outer stack");
        let root = Namespace::root();

        assert!(outer.save("yin", json!("yang"), Some(100), &root));
        assert!(outer.stack()[0].flush(&root));
        assert_eq!(outer.fetch("yin", &root), Some(json!("yang")));
        assert!(outer.stack()[0].contains("yin", &root));

        match outer.stats() {
            Stats::Tiered(tiers) => {
                assert_eq!(tiers.len(), 2);
                assert_eq!(tiers[0].size(), Some(1));
                assert!(matches!(tiers[1], Stats::Tiered(_)));
            }
            other => panic!("unexpected stats: {:?}", other),
        }
    }
}
