//! A bounded-lifetime response cache keyed by request parameters.
//!
//! Eviction is lazy: an expired entry is dropped on the next read that
//! touches it, not by a background sweep.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Thread-safe map of request key → cached value with a fixed time-to-live.
#[derive(Debug)]
pub struct TtlCache<V: Clone> {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, V)>>,
}

impl<V: Clone> TtlCache<V> {
    /// Creates an empty cache whose entries live for `ttl` after insertion.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `key` if it has not expired yet.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().expect("ttl cache lock poisoned");
        match entries.get(key) {
            Some((expires_at, value)) if *expires_at > Instant::now() => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        let mut entries = self.entries.lock().expect("ttl cache lock poisoned");
        entries.insert(key.into(), (Instant::now() + self.ttl, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_fresh_entries() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("spot", 42);
        assert_eq!(cache.get("spot"), Some(42));
        assert_eq!(cache.get("other"), None);
    }

    #[test]
    fn expired_entries_are_evicted_on_read() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.insert("spot", 42);
        assert_eq!(cache.get("spot"), None);
        // A second read must not resurrect the entry.
        assert_eq!(cache.get("spot"), None);
    }

    #[test]
    fn insert_replaces_previous_value() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("spot", 1);
        cache.insert("spot", 2);
        assert_eq!(cache.get("spot"), Some(2));
    }
}
