//! DashMap-backed cache

use async_trait::async_trait;
use dashmap::DashMap;

use super::CacheProvider;
use super::CachedValue;

/// Process-local cache. Expired entries are evicted lazily on `get()` or
/// in bulk by `gc()`.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: DashMap<String, CachedValue>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheProvider for InMemoryCache {
    async fn get(&self, key: &str) -> Option<CachedValue> {
        // remove_if takes the shard lock once for the check and the eviction
        if self.entries.remove_if(key, |_, v| v.is_expired()).is_some() {
            return None;
        }
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    async fn set(&self, key: &str, value: CachedValue) {
        self.entries.insert(key.to_string(), value);
    }

    async fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    async fn clear(&self) {
        self.entries.clear();
    }

    async fn gc(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, v| !v.is_expired());
        before.saturating_sub(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use super::*;

    fn expired(data: &[u8]) -> CachedValue {
        let past = Utc::now() - chrono::Duration::seconds(10);
        CachedValue::new(data.to_vec(), past, past)
    }

    #[tokio::test]
    async fn test_expired_values_are_never_returned() {
        let cache = InMemoryCache::new();
        cache.set("old", expired(b"x")).await;
        cache.set("fresh", CachedValue::with_ttl(b"y".to_vec(), Duration::from_secs(60))).await;

        assert!(cache.get("old").await.is_none());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("fresh").await.map(|v| v.data), Some(b"y".to_vec()));
    }

    #[tokio::test]
    async fn test_gc_counts_removed_entries() {
        let cache = InMemoryCache::new();
        cache.set("a", expired(b"a")).await;
        cache.set("b", expired(b"b")).await;
        cache.set("c", CachedValue::with_ttl(b"c".to_vec(), Duration::from_secs(60))).await;

        assert_eq!(cache.gc().await, 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.gc().await, 0);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let cache = InMemoryCache::new();
        cache.set("a", CachedValue::with_ttl(vec![1], Duration::from_secs(60))).await;
        cache.set("b", CachedValue::with_ttl(vec![2], Duration::from_secs(60))).await;
        cache.remove("a").await;
        assert!(cache.get("a").await.is_none());
        cache.clear().await;
        assert!(cache.is_empty());
    }
}
