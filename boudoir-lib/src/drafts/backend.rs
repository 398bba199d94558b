//! Key-value backends for draft storage.

use std::path::Path;

use async_sqlite::Client;
use async_sqlite::rusqlite;
use async_trait::async_trait;
use dashmap::DashMap;

use super::DraftError;

/// Byte storage under string keys, one blob per key like browser local
/// storage. [`KeyValueDraftStore`] layers JSON and eviction on top.
///
/// [`KeyValueDraftStore`]: super::KeyValueDraftStore
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, DraftError>;

    /// Replaces whatever `key` held.
    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), DraftError>;

    /// Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), DraftError>;
}

/// In-process backend, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    store: DashMap<String, Vec<u8>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueBackend for MemoryBackend {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, DraftError> {
        Ok(self.store.get(key).map(|v| v.value().clone()))
    }

    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), DraftError> {
        self.store.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DraftError> {
        self.store.remove(key);
        Ok(())
    }
}

/// Blobs in a `kv_store` table, typically inside the marketplace database.
pub struct SqliteBackend {
    client: Client,
}

impl SqliteBackend {
    /// Opens (or creates) the key-value table in the database at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, DraftError> {
        let client = async_sqlite::ClientBuilder::new().path(path).open().await?;
        Self::with_client(client).await
    }

    /// Uses an already open client, e.g. the application database.
    pub async fn with_client(client: Client) -> Result<Self, DraftError> {
        client
            .conn(|conn| {
                conn.execute(
                    "CREATE TABLE IF NOT EXISTS kv_store (
                        key TEXT PRIMARY KEY,
                        value BLOB NOT NULL
                    )",
                    [],
                )
            })
            .await?;

        Ok(Self { client })
    }
}

#[async_trait]
impl KeyValueBackend for SqliteBackend {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, DraftError> {
        let key = key.to_string();
        self.client
            .conn(move |conn| {
                let mut stmt = conn.prepare("SELECT value FROM kv_store WHERE key = ?")?;
                let mut rows = stmt.query([&key])?;
                match rows.next()? {
                    Some(row) => Ok(Some(row.get::<_, Vec<u8>>(0)?)),
                    None => Ok(None),
                }
            })
            .await
            .map_err(DraftError::from)
    }

    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), DraftError> {
        let key = key.to_string();
        self.client
            .conn(move |conn| {
                conn.execute(
                    "INSERT INTO kv_store (key, value) VALUES (?, ?)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    rusqlite::params![&key, &value],
                )
            })
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DraftError> {
        let key = key.to_string();
        self.client
            .conn(move |conn| conn.execute("DELETE FROM kv_store WHERE key = ?", [&key]))
            .await?;
        Ok(())
    }
}
