//! Read-through response cache keyed by URL fingerprint.
//!
//! The cache is an optimization only: store failures and timeouts are logged
//! and degrade to "miss, don't store". Nothing here surfaces to clients.

mod fingerprint;
mod store;

pub use fingerprint::{fingerprint, request_url};
pub use store::{CacheError, CacheStore, MemoryCacheStore, RedisCacheStore};

use crate::config::{CacheBackendKind, GatewayConfig};
use axum::body::Bytes;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Response header marking a replayed payload.
pub const CACHE_HIT_HEADER: &str = "cache-hit";

/// Upper bound on any single store round trip.
const STORE_OP_TIMEOUT: Duration = Duration::from_millis(500);

/// A stored payload, returned byte-for-byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub payload: Bytes,
}

/// Root and empty paths are never cached.
pub fn is_cacheable_path(path_info: &str) -> bool {
    !path_info.is_empty() && path_info != "/"
}

#[derive(Clone)]
pub struct ResponseCache {
    store: Option<Arc<dyn CacheStore>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        ResponseCache {
            store: Some(store),
            ttl,
        }
    }

    pub fn disabled() -> Self {
        ResponseCache {
            store: None,
            ttl: Duration::ZERO,
        }
    }

    /// Cache per config; a bad Redis URL disables caching rather than failing startup.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let Some(caching) = config.active_caching() else {
            tracing::info!("response caching disabled");
            return Self::disabled();
        };
        let ttl = Duration::from_secs(caching.expires);
        match caching.backend {
            CacheBackendKind::Memory => {
                tracing::info!(ttl_secs = caching.expires, "response caching in memory");
                Self::new(Arc::new(MemoryCacheStore::new()), ttl)
            }
            CacheBackendKind::Redis => {
                let url = caching.redis_url.as_deref().unwrap_or("redis://localhost:6379");
                match RedisCacheStore::from_url(url) {
                    Ok(store) => {
                        tracing::info!(ttl_secs = caching.expires, redis = %url, "response caching in redis");
                        Self::new(Arc::new(store), ttl)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "redis cache unavailable, caching disabled");
                        Self::disabled()
                    }
                }
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stored payload for this URL, if any. Store errors read as a miss.
    pub async fn lookup(&self, url: &str) -> Option<CacheEntry> {
        let store = self.store.as_ref()?;
        let key = fingerprint(url);
        match bounded(store.get(&key)).await {
            Ok(Some(payload)) => {
                tracing::debug!(key = %key, "cache hit");
                Some(CacheEntry {
                    fingerprint: key,
                    payload,
                })
            }
            Ok(None) => {
                tracing::debug!(key = %key, "cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache lookup failed");
                None
            }
        }
    }

    /// Unconditional overwrite. Store errors are logged and dropped.
    pub async fn store(&self, url: &str, payload: Bytes, ttl: Duration) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let key = fingerprint(url);
        match bounded(store.set_ex(&key, payload, ttl)).await {
            Ok(()) => tracing::debug!(key = %key, ttl_secs = ttl.as_secs(), "cache set"),
            Err(e) => tracing::warn!(key = %key, error = %e, "cache store failed"),
        }
    }
}

async fn bounded<T>(fut: impl Future<Output = Result<T, CacheError>>) -> Result<T, CacheError> {
    tokio::time::timeout(STORE_OP_TIMEOUT, fut)
        .await
        .unwrap_or(Err(CacheError::Timeout))
}
