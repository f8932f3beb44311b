//! Redis cache backend

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;

use crate::cache::CacheBackend;
use crate::error::{CacheError, PromptAssistError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Cache stored in Redis
pub struct RedisCache {
    connection: MultiplexedConnection,
}

impl RedisCache {
    /// Connect and verify the server answers `PING`
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;

        let connection = tokio::time::timeout(
            CONNECT_TIMEOUT,
            client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| {
            PromptAssistError::Cache(CacheError::ConnectionFailed {
                message: format!("timed out after {}s", CONNECT_TIMEOUT.as_secs()),
            })
        })??;

        let cache = Self { connection };
        if !cache.ping().await {
            return Err(PromptAssistError::Cache(CacheError::ConnectionFailed {
                message: "PING failed".to_string(),
            }));
        }
        Ok(cache)
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut conn = self.connection.clone();
        let seconds = ttl.as_secs().max(1);
        let _: () = redis::cmd("SETEX")
            .arg(key)
            .arg(seconds)
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        let _: i64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(())
    }

    async fn clear_pattern(&self, pattern: &str) -> Result<usize> {
        let mut conn = self.connection.clone();
        let keys: Vec<String> = redis::cmd("KEYS").arg(pattern).query_async(&mut conn).await?;
        if keys.is_empty() {
            return Ok(0);
        }

        let removed: i64 = redis::cmd("DEL").arg(&keys).query_async(&mut conn).await?;
        Ok(removed.max(0) as usize)
    }

    async fn ping(&self) -> bool {
        let mut conn = self.connection.clone();
        let reply: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
        reply.is_ok()
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
