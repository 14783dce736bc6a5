//! Best-effort cache in front of the store.
//!
//! `CacheBackend` is the raw, fallible key/value seam. `CacheGateway` wraps a
//! backend with JSON encoding and swallows every failure: `get` degrades to a
//! miss, `set` and `delete` log and return.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use configs::CacheConfig;

use super::errors::CacheError;

#[async_trait]
pub trait CacheBackend: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

#[derive(Clone)]
struct CachedValue {
    payload: Arc<str>,
    ttl: Duration,
}

/// Each entry lives for the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, CachedValue> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &CachedValue, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process backend on `moka::future::Cache`.
pub struct MokaCacheBackend {
    inner: Cache<String, CachedValue>,
}

impl MokaCacheBackend {
    pub fn new(max_capacity: u64) -> Self {
        let inner = Cache::builder().max_capacity(max_capacity).expire_after(PerEntryTtl).build();
        Self { inner }
    }

    pub fn from_config(cfg: &CacheConfig) -> Self { Self::new(cfg.max_capacity) }
}

#[async_trait]
impl CacheBackend for MokaCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.inner.get(key).await.map(|v| v.payload.to_string()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.inner.insert(key.to_string(), CachedValue { payload: value.into(), ttl }).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.inner.invalidate(key).await;
        Ok(())
    }
}

/// Typed, failure-absorbing front of a `CacheBackend`.
pub struct CacheGateway<B: CacheBackend> {
    backend: Arc<B>,
    default_ttl: Duration,
}

impl<B: CacheBackend> Clone for CacheGateway<B> {
    fn clone(&self) -> Self {
        Self { backend: Arc::clone(&self.backend), default_ttl: self.default_ttl }
    }
}

impl<B: CacheBackend> CacheGateway<B> {
    pub fn new(backend: Arc<B>, default_ttl: Duration) -> Self { Self { backend, default_ttl } }

    pub fn from_config(backend: Arc<B>, cfg: &CacheConfig) -> Self { Self::new(backend, cfg.default_ttl()) }

    /// Decoded value, or `None` on a miss or any failure.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_get(key).await {
            Ok(found) => found,
            Err(e) => {
                warn!(op = "cache.get", key, error = %e, "cache read degraded to miss");
                None
            }
        }
    }

    /// Store `value` for `ttl`; a zero `ttl` uses the configured default.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        let ttl = if ttl.is_zero() { self.default_ttl } else { ttl };
        if let Err(e) = self.try_set(key, value, ttl).await {
            warn!(op = "cache.set", key, error = %e, "cache write dropped");
        }
    }

    pub async fn delete(&self, key: &str) {
        if let Err(e) = self.backend.delete(key).await {
            warn!(op = "cache.delete", key, error = %e, "cache invalidation dropped");
        }
    }

    async fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let Some(raw) = self.backend.get(key).await? else {
            debug!(key, "cache miss");
            return Ok(None);
        };
        serde_json::from_str(&raw).map(Some).map_err(CacheError::Decode)
    }

    async fn try_set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value).map_err(CacheError::Encode)?;
        self.backend.set(key, raw, ttl).await
    }
}

/// In-memory backend with failure injection for tests.
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records the TTL of each write but never expires entries.
    #[derive(Default)]
    pub struct MockCacheBackend {
        entries: Mutex<HashMap<String, (String, Duration)>>,
        failing: AtomicBool,
        gets: AtomicUsize,
        sets: AtomicUsize,
        deletes: AtomicUsize,
    }

    impl MockCacheBackend {
        /// Seed a raw payload, bypassing encoding.
        pub fn put_raw(&self, key: &str, payload: &str) {
            self.entries.lock().unwrap().insert(key.to_string(), (payload.to_string(), Duration::ZERO));
        }

        pub fn raw(&self, key: &str) -> Option<String> {
            self.entries.lock().unwrap().get(key).map(|(v, _)| v.clone())
        }

        pub fn ttl_of(&self, key: &str) -> Option<Duration> {
            self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
        }

        pub fn set_failing(&self, failing: bool) { self.failing.store(failing, Ordering::SeqCst); }

        pub fn get_count(&self) -> usize { self.gets.load(Ordering::SeqCst) }

        pub fn set_count(&self) -> usize { self.sets.load(Ordering::SeqCst) }

        pub fn delete_count(&self) -> usize { self.deletes.load(Ordering::SeqCst) }

        fn check(&self) -> Result<(), CacheError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(CacheError::Backend("mock cache unavailable".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CacheBackend for MockCacheBackend {
        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            Ok(self.raw(key))
        }

        async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
            self.sets.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            self.entries.lock().unwrap().insert(key.to_string(), (value, ttl));
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), CacheError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }
    }
}
