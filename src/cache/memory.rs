//! In-process cache backend

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use globset::{GlobBuilder, GlobMatcher};
use tokio::sync::RwLock;

use crate::cache::CacheBackend;
use crate::error::{CacheError, Result};

/// Default number of entries kept before the oldest is evicted
pub const DEFAULT_CAPACITY: usize = 10_000;

struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Default)]
struct Store {
    map: HashMap<String, Entry>,
    /// Insertion order, oldest at the back
    order: VecDeque<String>,
}

impl Store {
    fn forget(&mut self, key: &str) -> bool {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.map.remove(key).is_some()
    }

    fn sweep_expired(&mut self, now: Instant) {
        let map = &mut self.map;
        map.retain(|_, entry| entry.expires_at > now);
        self.order.retain(|key| map.contains_key(key));
    }

    fn insert(&mut self, key: &str, entry: Entry, capacity: usize) {
        self.forget(key);
        self.map.insert(key.to_string(), entry);
        self.order.push_front(key.to_string());

        while self.order.len() > capacity {
            if let Some(old) = self.order.pop_back() {
                self.map.remove(&old);
            }
        }
    }
}

/// Map-backed cache with per-entry expiry and a capacity bound
pub struct MemoryCache {
    store: RwLock<Store>,
    capacity: usize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: RwLock::new(Store::default()),
            capacity: capacity.max(1),
        }
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.store
            .read()
            .await
            .map
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Entries held, expired or not
    async fn stored(&self) -> usize {
        self.store.read().await.map.len()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        {
            let store = self.store.read().await;
            match store.map.get(key) {
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        self.store.write().await.forget(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let entry = Entry {
            value,
            expires_at: now + ttl,
        };

        let mut store = self.store.write().await;
        store.sweep_expired(now);
        store.insert(key, entry, self.capacity);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.write().await.forget(key);
        Ok(())
    }

    async fn clear_pattern(&self, pattern: &str) -> Result<usize> {
        let matcher = compile_pattern(pattern)?;

        let mut store = self.store.write().await;
        let matching: Vec<String> = store
            .map
            .keys()
            .filter(|key| matcher.is_match(key.as_str()))
            .cloned()
            .collect();

        for key in &matching {
            store.forget(key);
        }
        Ok(matching.len())
    }

    async fn ping(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Compile a Redis-style key pattern: `*`, `?`, `[...]` classes and `\` escapes
pub fn compile_pattern(pattern: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(false)
        .backslash_escape(true)
        .build()
        .map_err(|e| CacheError::Backend {
            message: format!("invalid key pattern '{}': {}", pattern, e),
        })?;
    Ok(glob.compile_matcher())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, key: &str) -> bool {
        compile_pattern(pattern).unwrap().is_match(key)
    }

    #[test]
    fn test_key_patterns() {
        assert!(matches("*", "analysis:abc"));
        assert!(matches("analysis:*", "analysis:abc"));
        assert!(!matches("analysis:*", "optimization:abc"));
        assert!(matches("a?c", "abc"));
        assert!(matches("*:*c", "analysis:abc"));
        assert!(matches("analysis:[12]", "analysis:2"));
        assert!(!matches("analysis:[12]", "analysis:3"));
        assert!(matches(r"literal\*", "literal*"));
        assert!(!matches(r"literal\*", "literally"));
        assert!(!matches("", "x"));
        assert!(compile_pattern("analysis:[").is_err());
    }

    #[test]
    fn test_set_get_delete() {
        tokio_test::block_on(async {
            let cache = MemoryCache::new();
            cache
                .set("k", "v".to_string(), Duration::from_secs(60))
                .await
                .unwrap();
            assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));

            cache.delete("k").await.unwrap();
            assert_eq!(cache.get("k").await.unwrap(), None);
        });
    }

    #[test]
    fn test_expiry() {
        tokio_test::block_on(async {
            let cache = MemoryCache::new();
            cache.set("k", "v".to_string(), Duration::ZERO).await.unwrap();
            assert_eq!(cache.get("k").await.unwrap(), None);
            assert!(cache.is_empty().await);
        });
    }

    #[test]
    fn test_expired_entries_swept_on_write() {
        tokio_test::block_on(async {
            let cache = MemoryCache::new();
            for i in 0..1000 {
                cache
                    .set(&format!("analysis:{}", i), "v".to_string(), Duration::ZERO)
                    .await
                    .unwrap();
            }
            // Each write drops what has already expired.
            assert!(cache.stored().await <= 1);
            assert_eq!(cache.len().await, 0);
        });
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        tokio_test::block_on(async {
            let cache = MemoryCache::with_capacity(2);
            let ttl = Duration::from_secs(60);
            cache.set("a", "1".to_string(), ttl).await.unwrap();
            cache.set("b", "2".to_string(), ttl).await.unwrap();
            cache.set("a", "3".to_string(), ttl).await.unwrap();
            cache.set("c", "4".to_string(), ttl).await.unwrap();

            assert_eq!(cache.stored().await, 2);
            assert_eq!(cache.get("b").await.unwrap(), None);
            assert_eq!(cache.get("a").await.unwrap().as_deref(), Some("3"));
            assert_eq!(cache.get("c").await.unwrap().as_deref(), Some("4"));
        });
    }

    #[test]
    fn test_clear_pattern() {
        tokio_test::block_on(async {
            let cache = MemoryCache::new();
            let ttl = Duration::from_secs(60);
            cache.set("analysis:1", "a".to_string(), ttl).await.unwrap();
            cache.set("analysis:2", "b".to_string(), ttl).await.unwrap();
            cache.set("optimization:1", "c".to_string(), ttl).await.unwrap();

            assert_eq!(cache.clear_pattern("analysis:*").await.unwrap(), 2);
            assert_eq!(cache.len().await, 1);
        });
    }

    #[test]
    fn test_clear_pattern_with_class() {
        tokio_test::block_on(async {
            let cache = MemoryCache::new();
            let ttl = Duration::from_secs(60);
            cache.set("analysis:1", "a".to_string(), ttl).await.unwrap();
            cache.set("analysis:2", "b".to_string(), ttl).await.unwrap();
            cache.set("analysis:3", "c".to_string(), ttl).await.unwrap();

            assert_eq!(cache.clear_pattern("analysis:[12]").await.unwrap(), 2);
            assert_eq!(cache.get("analysis:3").await.unwrap().as_deref(), Some("c"));
            assert!(cache.clear_pattern("analysis:[").await.is_err());
        });
    }
}
