//! Process-wide TTL cache for upstream API payloads.
//!
//! Keys are opaque strings of the form `<endpoint>:<parameters>` so that
//! whole endpoint families can be dropped with a single prefix
//! invalidation. Values are arbitrary JSON documents paired with an
//! absolute expiry timestamp.

use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// In-memory key → (expiry epoch seconds, value) map.
///
/// An entry whose expiry is at or before the current time behaves exactly
/// like a missing entry; expired entries are only removed lazily, on the
/// next overwrite or an explicit `invalidate`. Growth is unbounded, which
/// is acceptable because keys are drawn from a small enumerable set of
/// endpoint/parameter combinations.
#[derive(Default)]
pub struct TtlCache {
    entries: RwLock<HashMap<String, (i64, Value)>>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value, treating expired entries as misses.
    pub fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read();
        match entries.get(key) {
            Some((expires_at, value)) if *expires_at > Utc::now().timestamp() => {
                Some(value.clone())
            }
            _ => None,
        }
    }

    /// Store a value for `ttl_seconds` from now. Last write wins.
    pub fn set(&self, key: &str, value: Value, ttl_seconds: i64) {
        let expires_at = Utc::now().timestamp() + ttl_seconds;
        self.entries.write().insert(key.to_string(), (expires_at, value));
    }

    /// Remove every entry whose key starts with the literal `prefix`.
    pub fn invalidate(&self, prefix: &str) {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Invalidated {} cache entries with prefix {:?}", removed, prefix);
        }
    }

    /// Number of stored entries, including expired ones awaiting lazy removal.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_then_get_returns_value() {
        let cache = TtlCache::new();
        cache.set("weather:31.768,35.214", json!({"temp": 28.5}), 60);

        assert_eq!(cache.get("weather:31.768,35.214"), Some(json!({"temp": 28.5})));
    }

    #[test]
    fn expired_entry_is_a_miss_but_stays_stored() {
        let cache = TtlCache::new();
        cache.set("news:israel", json!(["headline"]), 0);

        assert_eq!(cache.get("news:israel"), None);
        // Lazy removal: the entry is still present until overwritten or invalidated.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn overwrite_replaces_expired_entry() {
        let cache = TtlCache::new();
        cache.set("aqi:31.768,35.214", json!({"aqi": 40}), -10);
        assert_eq!(cache.get("aqi:31.768,35.214"), None);

        cache.set("aqi:31.768,35.214", json!({"aqi": 55}), 60);
        assert_eq!(cache.get("aqi:31.768,35.214"), Some(json!({"aqi": 55})));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_removes_exactly_the_prefix() {
        let cache = TtlCache::new();
        cache.set("emails:combined", json!([]), 60);
        cache.set("emails:me@example.com", json!([]), 60);
        cache.set("cal:combined:2026-08-04", json!({}), 60);

        cache.invalidate("emails:");

        assert_eq!(cache.get("emails:combined"), None);
        assert_eq!(cache.get("emails:me@example.com"), None);
        assert!(cache.get("cal:combined:2026-08-04").is_some());
        assert_eq!(cache.len(), 1);
    }
}
