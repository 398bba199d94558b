//! SQLite data-access layer
//!
//! A [`Database`] owns one `async_sqlite` client and a [`RetryPolicy`].
//! Repositories are cheap borrowed views obtained from it
//! (`db.articles()`, `db.users()`, ...); each call runs on the client's
//! connection thread and is retried while SQLite reports busy or locked.

mod analytics;
mod articles;
mod categories;
mod favorites;
mod follows;
mod notifications;
mod orders;
mod row;
mod schema;
mod sessions;
mod users;

pub use analytics::AnalyticsStore;
pub use articles::ArticleStore;
pub use categories::CategoryStore;
pub use favorites::FavoriteStore;
pub use follows::FollowStore;
pub use notifications::NotificationStore;
pub use orders::OrderStore;
pub use sessions::SessionStore;
pub use users::UserStore;

use std::path::Path;

use async_sqlite::Client;
use async_sqlite::ClientBuilder;
use async_sqlite::JournalMode;
use async_sqlite::rusqlite;
use async_sqlite::rusqlite::Connection;

use crate::error::StoreError;
use crate::retry::RetryPolicy;

/// Handle to the marketplace database.
#[derive(Clone)]
pub struct Database {
    client: Client,
    retry: RetryPolicy,
}

impl Database {
    /// Opens (or creates) the database file in WAL mode and applies the schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            log::warn!("Could not create database directory {}: {}", parent.display(), e);
        }
        let client = ClientBuilder::new()
            .path(path)
            .journal_mode(JournalMode::Wal)
            .open()
            .await?;
        log::info!("Opened database at {}", path.display());
        Self::with_client(client).await
    }

    /// Private in-memory database, used by tests and demos.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let client = ClientBuilder::new().path(":memory:").open().await?;
        Self::with_client(client).await
    }

    async fn with_client(client: Client) -> Result<Self, StoreError> {
        client
            .conn(|conn| {
                conn.execute_batch("PRAGMA foreign_keys = ON;")?;
                conn.execute_batch(schema::SCHEMA)
            })
            .await?;
        Ok(Self {
            client,
            retry: RetryPolicy::default(),
        })
    }

    /// Replaces the retry policy applied to every call.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// The underlying client, for stores sharing this file (cache, drafts).
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn users(&self) -> UserStore<'_> {
        UserStore::new(self)
    }

    pub fn sessions(&self) -> SessionStore<'_> {
        SessionStore::new(self)
    }

    pub fn categories(&self) -> CategoryStore<'_> {
        CategoryStore::new(self)
    }

    pub fn articles(&self) -> ArticleStore<'_> {
        ArticleStore::new(self)
    }

    pub fn favorites(&self) -> FavoriteStore<'_> {
        FavoriteStore::new(self)
    }

    pub fn follows(&self) -> FollowStore<'_> {
        FollowStore::new(self)
    }

    pub fn notifications(&self) -> NotificationStore<'_> {
        NotificationStore::new(self)
    }

    pub fn orders(&self) -> OrderStore<'_> {
        OrderStore::new(self)
    }

    pub fn analytics(&self) -> AnalyticsStore<'_> {
        AnalyticsStore::new(self)
    }

    /// Runs `f` on the connection thread under the retry policy.
    pub(crate) async fn call<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Clone + Send + 'static,
        T: Send + 'static,
    {
        self.retry
            .retry(
                || {
                    let f = f.clone();
                    async move { self.client.conn(f).await.map_err(StoreError::from) }
                },
                StoreError::is_transient,
            )
            .await
    }

    /// Like [`call`](Self::call) with a mutable connection, for transactions.
    pub(crate) async fn call_mut<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Clone + Send + 'static,
        T: Send + 'static,
    {
        self.retry
            .retry(
                || {
                    let f = f.clone();
                    async move { self.client.conn_mut(f).await.map_err(StoreError::from) }
                },
                StoreError::is_transient,
            )
            .await
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("retry", &self.retry).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_is_idempotent_and_enforces_foreign_keys() {
        let db = Database::open_in_memory().await.unwrap();
        db.client().conn(|conn| conn.execute_batch(schema::SCHEMA)).await.unwrap();

        let fk: i64 = db
            .call(|conn| conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(fk, 1);
    }
}
