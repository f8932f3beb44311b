//! Result cache
//!
//! Analysis and optimization results are cached by a hash of the prompt and
//! its parameters. Cache failures never fail a request: they are logged and
//! treated as misses.

pub mod memory;
pub mod redis_backend;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::config::{CacheBackendKind, Config};
use crate::error::Result;

pub use memory::MemoryCache;
pub use redis_backend::RedisCache;

/// Key/value store with expiry
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Remove every key matching a glob; returns how many were removed
    async fn clear_pattern(&self, pattern: &str) -> Result<usize>;

    async fn ping(&self) -> bool;

    fn name(&self) -> &'static str;
}

/// Cache front-end used by the service
pub struct CacheManager {
    backend: Option<Arc<dyn CacheBackend>>,
    default_ttl: Duration,
}

impl CacheManager {
    /// Connect the configured backend
    ///
    /// A failed connection disables caching instead of failing startup.
    pub async fn connect(config: &Config) -> Self {
        if !config.cache_enabled {
            tracing::info!("Cache disabled");
            return Self::disabled();
        }

        let backend: Arc<dyn CacheBackend> = match config.cache_backend {
            CacheBackendKind::Memory => Arc::new(MemoryCache::new()),
            CacheBackendKind::Redis => match RedisCache::connect(&config.redis_url).await {
                Ok(cache) => Arc::new(cache),
                Err(e) => {
                    tracing::error!("Redis connection failed: {}", e);
                    return Self::disabled();
                }
            },
        };

        tracing::info!("{} cache connected", backend.name());
        Self::with_backend(backend, config.cache_ttl)
    }

    pub fn with_backend(backend: Arc<dyn CacheBackend>, default_ttl: Duration) -> Self {
        Self {
            backend: Some(backend),
            default_ttl,
        }
    }

    pub fn disabled() -> Self {
        Self {
            backend: None,
            default_ttl: Duration::ZERO,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Retrieve and decode a cached value
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let backend = self.backend.as_ref()?;

        match backend.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    tracing::debug!("Cache HIT: {}", key);
                    Some(value)
                }
                Err(e) => {
                    tracing::warn!("Cache decode error for {}: {}", key, e);
                    None
                }
            },
            Ok(None) => {
                tracing::debug!("Cache MISS: {}", key);
                None
            }
            Err(e) => {
                tracing::warn!("Cache get error: {}", e);
                None
            }
        }
    }

    /// Encode and store a value; `None` uses the default TTL
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        let backend = match &self.backend {
            Some(backend) => backend,
            None => return,
        };

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Cache encode error for {}: {}", key, e);
                return;
            }
        };

        let ttl = ttl.unwrap_or(self.default_ttl);
        match backend.set(key, raw, ttl).await {
            Ok(()) => tracing::debug!("Cache SET: {} (TTL: {}s)", key, ttl.as_secs()),
            Err(e) => tracing::warn!("Cache set error: {}", e),
        }
    }

    pub async fn delete(&self, key: &str) {
        if let Some(backend) = &self.backend {
            match backend.delete(key).await {
                Ok(()) => tracing::debug!("Cache DELETE: {}", key),
                Err(e) => tracing::warn!("Cache delete error: {}", e),
            }
        }
    }

    /// Clear all keys matching a glob pattern
    pub async fn clear_pattern(&self, pattern: &str) -> usize {
        let backend = match &self.backend {
            Some(backend) => backend,
            None => return 0,
        };

        match backend.clear_pattern(pattern).await {
            Ok(count) => {
                if count > 0 {
                    tracing::info!("Cleared {} cache entries matching '{}'", count, pattern);
                }
                count
            }
            Err(e) => {
                tracing::warn!("Cache clear error: {}", e);
                0
            }
        }
    }

    /// Whether the backend is reachable; false when caching is disabled
    pub async fn is_connected(&self) -> bool {
        match &self.backend {
            Some(backend) => backend.ping().await,
            None => false,
        }
    }

    /// Build a cache key from a prefix, the prompt and its parameters
    ///
    /// Parameters are rendered as JSON with sorted keys, so the same request
    /// always maps to the same key.
    pub fn generate_key(prefix: &str, text: &str, params: &BTreeMap<&str, Value>) -> String {
        let rendered = params
            .iter()
            .map(|(name, value)| format!("\"{}\": {}", name, value))
            .collect::<Vec<_>>()
            .join(", ");

        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.update(format!("{{{}}}", rendered).as_bytes());
        let digest = hex::encode(hasher.finalize());

        format!("{}:{}", prefix, &digest[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&'static str, Value)]) -> BTreeMap<&'static str, Value> {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn test_generate_key_shape() {
        let key = CacheManager::generate_key("analysis", "analyze data", &params(&[("use_llm", json!(false))]));
        assert!(key.starts_with("analysis:"));
        assert_eq!(key.len(), "analysis:".len() + 16);
    }

    #[test]
    fn test_generate_key_depends_on_params() {
        let text = "analyze data";
        let a = CacheManager::generate_key("analysis", text, &params(&[("use_llm", json!(false))]));
        let b = CacheManager::generate_key("analysis", text, &params(&[("use_llm", json!(true))]));
        assert_ne!(a, b);

        let c = CacheManager::generate_key(
            "optimization",
            text,
            &params(&[("level", json!("basic")), ("focus", json!("all"))]),
        );
        let d = CacheManager::generate_key(
            "optimization",
            text,
            &params(&[("focus", json!("all")), ("level", json!("basic"))]),
        );
        assert_eq!(c, d);
    }

    #[tokio::test]
    async fn test_cache_operations() {
        let cache = CacheManager::with_backend(Arc::new(MemoryCache::new()), Duration::from_secs(60));

        let value = json!({"score": 85});
        cache.set("test-key", &value, None).await;
        assert_eq!(cache.get::<Value>("test-key").await, Some(value));

        cache.delete("test-key").await;
        assert_eq!(cache.get::<Value>("test-key").await, None);
        assert!(cache.is_connected().await);
    }

    #[tokio::test]
    async fn test_disabled_cache_is_noop() {
        let cache = CacheManager::disabled();
        cache.set("k", &json!(1), None).await;
        assert_eq!(cache.get::<Value>("k").await, None);
        assert_eq!(cache.clear_pattern("*").await, 0);
        assert!(!cache.is_connected().await);
        assert!(!cache.is_enabled());
    }

    #[tokio::test]
    async fn test_connect_disabled_by_config() {
        let config = Config {
            cache_enabled: false,
            ..Config::default()
        };
        assert!(!CacheManager::connect(&config).await.is_enabled());
    }

    #[tokio::test]
    async fn test_connect_memory_backend() {
        let config = Config {
            cache_backend: CacheBackendKind::Memory,
            ..Config::default()
        };
        let cache = CacheManager::connect(&config).await;
        assert!(cache.is_enabled());
        assert!(cache.is_connected().await);
    }
}
