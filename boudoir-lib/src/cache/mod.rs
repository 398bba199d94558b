//! TTL cache
//!
//! A [`CacheProvider`] stores opaque byte blobs under string keys with an
//! expiry. Analytics snapshots and the category list go through it; the
//! typed helpers [`load`] and [`store`] serialize values with bincode.

mod config;
mod memory;
mod sqlite;

pub use config::*;
pub use memory::*;
pub use sqlite::*;

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A cached blob and its lifetime.
#[derive(Debug, Clone)]
pub struct CachedValue {
    /// Serialized payload.
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
    /// The value is dead from this instant on.
    pub expires_at: DateTime<Utc>,
}

impl CachedValue {
    pub fn new(data: Vec<u8>, created_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            data,
            created_at,
            expires_at,
        }
    }

    /// Creates a value that expires `ttl` from now. A TTL too large for
    /// chrono is treated as zero.
    pub fn with_ttl(data: Vec<u8>, ttl: Duration) -> Self {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero());
        Self::new(data, now, now + ttl)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Key-value cache with expiry.
///
/// Implementations never return an expired value from `get()`. Failures of
/// the underlying storage are logged and behave as a miss.
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// Returns the live value for `key`, if any.
    async fn get(&self, key: &str) -> Option<CachedValue>;

    async fn set(&self, key: &str, value: CachedValue);

    async fn remove(&self, key: &str);

    async fn clear(&self);

    /// Drops expired entries and returns how many were removed.
    async fn gc(&self) -> usize;
}

/// Reads and decodes a typed value. Undecodable entries count as a miss
/// and are evicted.
pub async fn load<T: DeserializeOwned>(cache: &dyn CacheProvider, key: &str) -> Option<T> {
    let cached = cache.get(key).await?;
    match bincode::deserialize(&cached.data) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Dropping undecodable cache entry {}: {}", key, e);
            cache.remove(key).await;
            None
        }
    }
}

/// Encodes and stores a typed value for `ttl`. A zero TTL skips the write.
pub async fn store<T: Serialize>(cache: &dyn CacheProvider, key: &str, value: &T, ttl: Duration) {
    if ttl.is_zero() {
        return;
    }
    match bincode::serialize(value) {
        Ok(data) => cache.set(key, CachedValue::with_ttl(data, ttl)).await,
        Err(e) => log::warn!("Failed to encode cache entry {}: {}", key, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_typed_round_trip() {
        let cache = InMemoryCache::new();
        store(&cache, "counts", &vec![1u32, 2, 3], Duration::from_secs(60)).await;
        assert_eq!(load::<Vec<u32>>(&cache, "counts").await, Some(vec![1, 2, 3]));
        assert_eq!(load::<Vec<u32>>(&cache, "missing").await, None);
    }

    #[tokio::test]
    async fn test_zero_ttl_is_not_stored() {
        let cache = InMemoryCache::new();
        store(&cache, "k", &1u8, Duration::ZERO).await;
        assert!(cache.is_empty());
    }
}
