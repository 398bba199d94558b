//! SQLite-backed cache that survives restarts.

use std::path::Path;

use async_sqlite::Client;
use async_sqlite::ClientBuilder;
use async_sqlite::JournalMode;
use async_sqlite::rusqlite;
use async_trait::async_trait;
use chrono::TimeZone;
use chrono::Utc;

use super::CacheProvider;
use super::CachedValue;

/// Persistent cache in a `cache_entries` table. Timestamps are stored as
/// milliseconds since the epoch.
pub struct SqliteCache {
    client: Client,
}

impl SqliteCache {
    /// Opens (or creates) a cache database file in WAL mode.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, async_sqlite::Error> {
        let client = ClientBuilder::new()
            .path(path)
            .journal_mode(JournalMode::Wal)
            .open()
            .await?;
        Self::with_client(client).await
    }

    pub async fn open_in_memory() -> Result<Self, async_sqlite::Error> {
        let client = ClientBuilder::new().path(":memory:").open().await?;
        Self::with_client(client).await
    }

    /// Shares an existing connection, creating the table when missing.
    pub async fn with_client(client: Client) -> Result<Self, async_sqlite::Error> {
        client
            .conn(|conn| {
                conn.execute_batch(
                    "CREATE TABLE IF NOT EXISTS cache_entries (
                        key TEXT PRIMARY KEY,
                        data BLOB NOT NULL,
                        created_at INTEGER NOT NULL,
                        expires_at INTEGER NOT NULL
                    );
                    CREATE INDEX IF NOT EXISTS idx_cache_entries_expires ON cache_entries(expires_at);",
                )
            })
            .await?;
        Ok(Self { client })
    }

    /// Number of rows, expired ones included.
    pub async fn len(&self) -> Result<usize, async_sqlite::Error> {
        self.client
            .conn(|conn| conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get::<_, i64>(0)))
            .await
            .map(|count| count as usize)
    }

    pub async fn is_empty(&self) -> Result<bool, async_sqlite::Error> {
        Ok(self.len().await? == 0)
    }
}

#[async_trait]
impl CacheProvider for SqliteCache {
    async fn get(&self, key: &str) -> Option<CachedValue> {
        let key = key.to_string();
        let now = Utc::now().timestamp_millis();

        let row = self
            .client
            .conn(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT data, created_at, expires_at FROM cache_entries WHERE key = ? AND expires_at > ?",
                )?;
                let mut rows = stmt.query(rusqlite::params![key, now])?;
                match rows.next()? {
                    Some(row) => Ok(Some((row.get::<_, Vec<u8>>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?))),
                    None => Ok(None),
                }
            })
            .await;

        match row {
            Ok(Some((data, created_at, expires_at))) => {
                let created_at = Utc.timestamp_millis_opt(created_at).single()?;
                let expires_at = Utc.timestamp_millis_opt(expires_at).single()?;
                Some(CachedValue::new(data, created_at, expires_at))
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("Cache read failed: {}", e);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: CachedValue) {
        let key = key.to_string();
        let created_at = value.created_at.timestamp_millis();
        let expires_at = value.expires_at.timestamp_millis();
        let data = value.data;

        let result = self
            .client
            .conn(move |conn| {
                conn.execute(
                    "INSERT INTO cache_entries (key, data, created_at, expires_at) VALUES (?, ?, ?, ?)
                     ON CONFLICT(key) DO UPDATE SET
                        data = excluded.data,
                        created_at = excluded.created_at,
                        expires_at = excluded.expires_at",
                    rusqlite::params![key, data, created_at, expires_at],
                )
            })
            .await;
        if let Err(e) = result {
            log::warn!("Cache write failed: {}", e);
        }
    }

    async fn remove(&self, key: &str) {
        let key = key.to_string();
        if let Err(e) = self
            .client
            .conn(move |conn| conn.execute("DELETE FROM cache_entries WHERE key = ?", [key]))
            .await
        {
            log::warn!("Cache remove failed: {}", e);
        }
    }

    async fn clear(&self) {
        if let Err(e) = self.client.conn(|conn| conn.execute("DELETE FROM cache_entries", [])).await {
            log::warn!("Cache clear failed: {}", e);
        }
    }

    async fn gc(&self) -> usize {
        let now = Utc::now().timestamp_millis();
        match self
            .client
            .conn(move |conn| conn.execute("DELETE FROM cache_entries WHERE expires_at <= ?", [now]))
            .await
        {
            Ok(removed) => removed,
            Err(e) => {
                log::warn!("Cache gc failed: {}", e);
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_sqlite_cache_expiry_and_gc() {
        let cache = SqliteCache::open_in_memory().await.unwrap();
        let past = Utc::now() - chrono::Duration::seconds(5);

        cache.set("stale", CachedValue::new(vec![1], past, past)).await;
        cache.set("live", CachedValue::with_ttl(vec![2], Duration::from_secs(60))).await;

        assert!(cache.get("stale").await.is_none());
        assert_eq!(cache.get("live").await.map(|v| v.data), Some(vec![2]));
        assert_eq!(cache.len().await.unwrap(), 2);
        assert_eq!(cache.gc().await, 1);
        assert_eq!(cache.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_cache_overwrite() {
        let cache = SqliteCache::open_in_memory().await.unwrap();
        cache.set("k", CachedValue::with_ttl(vec![1], Duration::from_secs(60))).await;
        cache.set("k", CachedValue::with_ttl(vec![9], Duration::from_secs(60))).await;
        assert_eq!(cache.get("k").await.map(|v| v.data), Some(vec![9]));
        cache.clear().await;
        assert!(cache.is_empty().await.unwrap());
    }
}
