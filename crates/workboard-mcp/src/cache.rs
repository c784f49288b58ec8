//! Response cache for resource reads with per-entry TTL.
//!
//! Entries are checked for staleness on every read and evicted then. Once
//! the map grows past `SWEEP_THRESHOLD` a store also sweeps stale entries;
//! there is no background sweeper.
//!
//! Every invalidation bumps a generation counter. A read that missed takes
//! a [`Generation`] before calling its handler and stores the payload with
//! [`ResponseCache::put_if_current`], which refuses it if the resource was
//! invalidated in the meantime.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::time::Instant;

/// Cache key for one resource read.
///
/// `canonical` is the JSON encoding of `[resource, params]` with object keys
/// sorted at every depth, so equal parameter sets always produce equal keys
/// and string escaping keeps field boundaries unambiguous. Equality and
/// hashing look at `canonical` only.
#[derive(Debug, Clone)]
pub struct CacheKey {
    resource: String,
    canonical: String,
    params: Map<String, Value>,
}

impl CacheKey {
    pub fn derive(resource: &str, params: &Map<String, Value>) -> Self {
        let sorted = canonicalize(&Value::Object(params.clone()));
        let canonical =
            Value::Array(vec![Value::String(resource.to_string()), sorted]).to_string();
        Self {
            resource: resource.to_string(),
            canonical,
            params: params.clone(),
        }
    }

    /// True when this key is a read of `resource` whose parameters include
    /// every name/value pair in `bound`.
    pub fn matches(&self, resource: &str, bound: &Map<String, Value>) -> bool {
        self.resource == resource
            && bound
                .iter()
                .all(|(name, value)| self.params.get(name) == Some(value))
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn as_str(&self) -> &str {
        &self.canonical
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical)
    }
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::new();
            for (k, v) in entries {
                sorted.insert(k.clone(), canonicalize(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    written_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_stale(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.written_at) > self.ttl
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub invalidated: u64,
    pub entries: usize,
}

/// Map size above which a store sweeps out every stale entry.
const SWEEP_THRESHOLD: usize = 256;

/// Invalidation state observed before a handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation {
    epoch: u64,
    resource: u64,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<CacheKey, CacheEntry>,
    stats: CacheStats,
    /// Bumped by `invalidate_all`.
    epoch: u64,
    /// Bumped by every invalidation that names the resource.
    generations: HashMap<String, u64>,
}

impl CacheInner {
    fn generation(&self, resource: &str) -> Generation {
        Generation {
            epoch: self.epoch,
            resource: self.generations.get(resource).copied().unwrap_or(0),
        }
    }

    fn bump(&mut self, resource: &str) {
        *self.generations.entry(resource.to_string()).or_insert(0) += 1;
    }

    fn sweep(&mut self, now: Instant) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_stale(now));
        let swept = before - self.entries.len();
        if swept > 0 {
            self.stats.expired += swept as u64;
            tracing::debug!(swept, "Swept stale cache entries");
        }
    }

    fn insert(&mut self, key: CacheKey, value: Value, ttl: Duration) {
        let now = Instant::now();
        if self.entries.len() >= SWEEP_THRESHOLD {
            self.sweep(now);
        }
        tracing::debug!(resource = key.resource(), ttl_secs = ttl.as_secs(), "Cache store");
        let entry = CacheEntry {
            value,
            written_at: now,
            ttl,
        };
        self.entries.insert(key, entry);
    }
}

#[derive(Debug, Default)]
pub struct ResponseCache {
    inner: Mutex<CacheInner>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fresh payload for `key`, or `None` on a miss. A stale entry is removed
    /// and reported as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        let now = Instant::now();
        let mut inner = self.lock();
        let lookup = inner
            .entries
            .get(key)
            .map(|entry| (!entry.is_stale(now)).then(|| entry.value.clone()));
        match lookup {
            Some(Some(value)) => {
                inner.stats.hits += 1;
                tracing::debug!(resource = key.resource(), "Cache hit");
                return Some(value);
            }
            Some(None) => {
                inner.entries.remove(key);
                inner.stats.expired += 1;
                tracing::debug!(resource = key.resource(), "Cache entry expired");
            }
            None => {}
        }
        inner.stats.misses += 1;
        None
    }

    /// Store or overwrite an entry, restarting its lifetime.
    pub fn put(&self, key: CacheKey, value: Value, ttl: Duration) {
        self.lock().insert(key, value, ttl);
    }

    /// Current invalidation state of `resource`.
    pub fn generation(&self, resource: &str) -> Generation {
        self.lock().generation(resource)
    }

    /// Store the entry only if `resource` has not been invalidated since
    /// `seen` was taken. Returns whether it was stored.
    pub fn put_if_current(
        &self,
        key: CacheKey,
        value: Value,
        ttl: Duration,
        seen: Generation,
    ) -> bool {
        let mut inner = self.lock();
        if inner.generation(key.resource()) != seen {
            tracing::debug!(
                resource = key.resource(),
                "Discarding read invalidated while in flight"
            );
            return false;
        }
        inner.insert(key, value, ttl);
        true
    }

    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let mut inner = self.lock();
        inner.bump(key.resource());
        let removed = inner.entries.remove(key).is_some();
        if removed {
            inner.stats.invalidated += 1;
        }
        removed
    }

    /// Drop every read of `resource` whose parameters include all of
    /// `bound`, however the remaining parameters are spelled.
    pub fn invalidate_matching(&self, resource: &str, bound: &Map<String, Value>) -> usize {
        let mut inner = self.lock();
        inner.bump(resource);
        let before = inner.entries.len();
        inner.entries.retain(|k, _| !k.matches(resource, bound));
        let removed = before - inner.entries.len();
        inner.stats.invalidated += removed as u64;
        removed
    }

    /// Drop every entry whatever its parameters. Returns the number removed.
    pub fn invalidate_resource(&self, resource: &str) -> usize {
        self.invalidate_matching(resource, &Map::new())
    }

    pub fn invalidate_all(&self) -> usize {
        let mut inner = self.lock();
        inner.epoch += 1;
        let removed = inner.entries.len();
        inner.entries.clear();
        inner.stats.invalidated += removed as u64;
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            entries: inner.entries.len(),
            ..inner.stats.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_key_ignores_parameter_order() {
        let a = CacheKey::derive(
            "items_by_status",
            &params(json!({"board_id": 1, "status": "Done"})),
        );
        let b = CacheKey::derive(
            "items_by_status",
            &params(json!({"status": "Done", "board_id": 1})),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_sorts_nested_objects() {
        let a = CacheKey::derive("r", &params(json!({"f": {"x": 1, "y": [{"b": 2, "a": 1}]}})));
        let b = CacheKey::derive("r", &params(json!({"f": {"y": [{"a": 1, "b": 2}], "x": 1}})));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_boundaries_unambiguous() {
        let a = CacheKey::derive("r", &params(json!({"a": "b,c=d"})));
        let b = CacheKey::derive("r", &params(json!({"a": "b", "c": "d"})));
        assert_ne!(a, b);
        let c = CacheKey::derive("r\",{", &Map::new());
        let d = CacheKey::derive("r", &params(json!({"": ""})));
        assert_ne!(c, d);
        let e = CacheKey::derive("board_items", &params(json!({"board_id": 1})));
        let f = CacheKey::derive("board_items", &params(json!({"board_id": "1"})));
        assert_ne!(e, f);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_served_until_ttl_then_evicted() {
        let cache = ResponseCache::new();
        let key = CacheKey::derive("boards", &Map::new());
        cache.put(key.clone(), json!(["A"]), Duration::from_secs(300));

        tokio::time::advance(Duration::from_secs(300)).await;
        assert_eq!(cache.get(&key), Some(json!(["A"])));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get(&key), None);
        assert!(cache.is_empty());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.expired, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_restarts_lifetime() {
        let cache = ResponseCache::new();
        let key = CacheKey::derive("boards", &Map::new());
        cache.put(key.clone(), json!(1), Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.put(key.clone(), json!(2), Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get(&key), Some(json!(2)));
    }

    #[test]
    fn test_invalidation_scopes() {
        let cache = ResponseCache::new();
        let ttl = Duration::from_secs(60);
        let one = CacheKey::derive("board_items", &params(json!({"board_id": 1})));
        let two = CacheKey::derive("board_items", &params(json!({"board_id": 2})));
        let boards = CacheKey::derive("boards", &Map::new());
        cache.put(one.clone(), json!([]), ttl);
        cache.put(two.clone(), json!([]), ttl);
        cache.put(boards.clone(), json!([]), ttl);

        assert!(cache.invalidate(&one));
        assert!(!cache.invalidate(&one));
        assert!(cache.get(&two).is_some());

        cache.put(one.clone(), json!([]), ttl);
        assert_eq!(cache.invalidate_resource("board_items"), 2);
        assert!(cache.get(&boards).is_some());

        assert_eq!(cache.invalidate_all(), 1);
        assert_eq!(cache.stats().invalidated, 4);
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_scoped_invalidation_ignores_extra_parameters() {
        let cache = ResponseCache::new();
        let ttl = Duration::from_secs(60);
        let plain = CacheKey::derive("board_items", &params(json!({"board_id": 1})));
        let extra = CacheKey::derive("board_items", &params(json!({"board_id": 1, "page": 2})));
        let other = CacheKey::derive("board_items", &params(json!({"board_id": 2})));
        cache.put(plain.clone(), json!([]), ttl);
        cache.put(extra.clone(), json!([]), ttl);
        cache.put(other.clone(), json!([]), ttl);

        let removed = cache.invalidate_matching("board_items", &params(json!({"board_id": 1})));
        assert_eq!(removed, 2);
        assert!(cache.get(&plain).is_none());
        assert!(cache.get(&extra).is_none());
        assert!(cache.get(&other).is_some());
    }

    #[test]
    fn test_put_if_current_refuses_after_invalidation() {
        let cache = ResponseCache::new();
        let ttl = Duration::from_secs(60);
        let key = CacheKey::derive("notes", &Map::new());
        let unrelated = CacheKey::derive("boards", &Map::new());

        let seen = cache.generation("notes");
        let seen_boards = cache.generation("boards");
        cache.invalidate_resource("notes");
        assert!(!cache.put_if_current(key.clone(), json!(["old"]), ttl, seen));
        assert!(cache.get(&key).is_none());
        assert!(cache.put_if_current(unrelated.clone(), json!([]), ttl, seen_boards));

        let seen = cache.generation("notes");
        assert!(cache.put_if_current(key.clone(), json!(["new"]), ttl, seen));
        assert_eq!(cache.get(&key), Some(json!(["new"])));

        let seen = cache.generation("boards");
        cache.invalidate_all();
        assert!(!cache.put_if_current(unrelated, json!([]), ttl, seen));
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_sweeps_stale_entries_past_threshold() {
        let cache = ResponseCache::new();
        for page in 0..SWEEP_THRESHOLD {
            let key = CacheKey::derive("overdue_items", &params(json!({ "page": page })));
            cache.put(key, json!([]), Duration::from_secs(10));
        }
        assert_eq!(cache.len(), SWEEP_THRESHOLD);

        tokio::time::advance(Duration::from_secs(11)).await;
        cache.put(CacheKey::derive("boards", &Map::new()), json!([]), Duration::from_secs(10));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().expired, SWEEP_THRESHOLD as u64);
    }
}
