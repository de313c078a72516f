use dashmap::DashMap;
use log::debug;
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::constants::QUERY_STALE_TIME;

#[derive(Debug, Clone)]
struct CachedQuery {
    value: Value,
    fetched_at: Instant,
}

/// Responses of GET queries keyed by path, served until they go stale.
#[derive(Debug)]
pub struct QueryCache {
    entries: DashMap<String, CachedQuery>,
    stale_time: Duration,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(QUERY_STALE_TIME)
    }
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            stale_time,
        }
    }

    /// Cached value for `key` if it is still fresh
    pub fn get_fresh(&self, key: &str) -> Option<Value> {
        let entry = self.entries.get(key)?;
        if entry.fetched_at.elapsed() < self.stale_time {
            debug!("Query cache hit for {}", key);
            Some(entry.value.clone())
        } else {
            drop(entry);
            self.entries.remove(key);
            None
        }
    }

    pub fn insert(&self, key: &str, value: Value) {
        self.entries.insert(
            key.to_string(),
            CachedQuery {
                value,
                fetched_at: Instant::now(),
            },
        );
    }

    pub fn invalidate_all(&self) {
        if !self.entries.is_empty() {
            debug!("Invalidating {} cached queries", self.entries.len());
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fresh_entries_are_served() {
        let cache = QueryCache::default();
        cache.insert("/api/kategori", json!([{ "id": 1, "name": "Tropis" }]));
        assert_eq!(cache.get_fresh("/api/kategori").unwrap()[0]["id"], 1);
        assert_eq!(cache.get_fresh("/api/fruit/all"), None);
    }

    #[test]
    fn test_stale_entries_are_evicted() {
        let cache = QueryCache::new(Duration::ZERO);
        cache.insert("/api/kategori", json!([]));
        assert_eq!(cache.get_fresh("/api/kategori"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_all() {
        let cache = QueryCache::default();
        cache.insert("/a", json!(1));
        cache.insert("/b", json!(2));
        cache.invalidate_all();
        assert_eq!(cache.len(), 0);
    }
}
