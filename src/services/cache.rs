use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::sync::Arc;
use std::time::Duration;

use crate::services::storage::{KeyValueStore, StorageError};

/// Two-tier Redis-backed store
///
/// L1 is an in-memory cache in front of Redis (L2), which is shared across
/// instances and is the durable copy.
pub struct RedisStore {
    redis: Arc<tokio::sync::Mutex<ConnectionManager>>,
    l1_cache: moka::future::Cache<String, String>,
    /// Expiry applied to Redis writes; `None` keeps keys forever
    ttl_secs: Option<u64>,
}

impl RedisStore {
    /// Connect to Redis and build the L1 cache
    pub async fn new(
        redis_url: &str,
        l1_size: u64,
        ttl_secs: Option<u64>,
    ) -> Result<Self, StorageError> {
        let client = redis::Client::open(redis_url)?;
        let redis = redis::aio::ConnectionManager::new(client).await?;

        let mut builder = moka::future::CacheBuilder::new(l1_size);
        if let Some(ttl) = ttl_secs {
            builder = builder.time_to_live(Duration::from_secs(ttl));
        }

        Ok(Self {
            redis: Arc::new(tokio::sync::Mutex::new(redis)),
            l1_cache: builder.build(),
            ttl_secs,
        })
    }

    /// Number of entries currently held in L1
    pub fn l1_size(&self) -> u64 {
        self.l1_cache.entry_count()
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    /// Get a value (L1 first, then L2)
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if let Some(value) = self.l1_cache.get(key).await {
            tracing::trace!("L1 hit: {}", key);
            return Ok(Some(value));
        }

        let mut conn = self.redis.lock().await;
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut *conn)
            .await?;
        drop(conn);

        if let Some(json) = &value {
            tracing::trace!("L2 hit: {}", key);
            self.l1_cache.insert(key.to_string(), json.clone()).await;
        }

        Ok(value)
    }

    /// Write a value to both tiers
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.l1_cache.insert(key.to_string(), value.clone()).await;

        let mut conn = self.redis.lock().await;
        match self.ttl_secs {
            Some(ttl) => {
                redis::cmd("SETEX")
                    .arg(key)
                    .arg(ttl)
                    .arg(value)
                    .query_async::<()>(&mut *conn)
                    .await?
            }
            None => {
                redis::cmd("SET")
                    .arg(key)
                    .arg(value)
                    .query_async::<()>(&mut *conn)
                    .await?
            }
        }
        drop(conn);

        tracing::trace!("Stored: {}", key);
        Ok(())
    }

    /// Delete a value from both tiers
    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.l1_cache.invalidate(key).await;
        let mut conn = self.redis.lock().await;
        redis::cmd("DEL")
            .arg(key)
            .query_async::<()>(&mut *conn)
            .await?;
        Ok(())
    }
}
