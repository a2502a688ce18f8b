//! Shared key-value stores backing the response cache.

use async_trait::async_trait;
use axum::body::Bytes;
use dashmap::DashMap;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("redis pool: {0}")]
    Pool(#[from] deadpool_redis::PoolError),
    #[error("redis config: {0}")]
    Config(String),
    #[error("cache store timed out")]
    Timeout,
}

/// Get and set-with-expiry on a shared store. Last write wins; no read-modify-write.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    async fn set_ex(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError>;
}

/// Redis-backed store shared across gateway instances.
pub struct RedisCacheStore {
    pool: Pool,
}

impl RedisCacheStore {
    pub fn new(pool: Pool) -> Self {
        RedisCacheStore { pool }
    }

    /// Pool creation does not connect; an unreachable server shows up as errors per call.
    pub fn from_url(url: &str) -> Result<Self, CacheError> {
        let pool = deadpool_redis::Config::from_url(url)
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .map_err(|e| CacheError::Config(e.to_string()))?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        let mut conn = self.pool.get().await?;
        let value = conn.get::<_, Option<Vec<u8>>>(key).await?;
        Ok(value.map(Bytes::from))
    }

    async fn set_ex(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.pool.get().await?;
        let payload = value.to_vec();
        conn.set_ex::<_, _, ()>(key, &payload, ttl.as_secs().max(1)).await?;
        Ok(())
    }
}

#[derive(Clone, Debug)]
struct MemoryEntry {
    payload: Bytes,
    expires_at: Instant,
}

/// In-process store for single-instance deployments. Expired entries are dropped on read
/// and swept on every write.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: DashMap<String, MemoryEntry>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry whose expiry has passed.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Ok(Some(entry.payload.clone()));
            }
            drop(entry);
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set_ex(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        self.purge_expired();
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                payload: value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }
}
