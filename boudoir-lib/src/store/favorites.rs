//! Favorited articles.

use async_sqlite::rusqlite;
use chrono::Utc;
use uuid::Uuid;

use super::Database;
use super::articles::ARTICLE_COLUMNS;
use super::articles::article_from_row;
use super::row::ts;
use crate::error::StoreError;
use crate::model::Article;

pub struct FavoriteStore<'a> {
    db: &'a Database,
}

impl<'a> FavoriteStore<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Adds the favorite if absent, removes it otherwise. Returns the new state.
    pub async fn toggle(&self, user_id: Uuid, article_id: Uuid) -> Result<bool, StoreError> {
        let user_id = user_id.to_string();
        let article_id = article_id.to_string();
        let now = ts(&Utc::now());
        self.db
            .call_mut(move |conn| {
                let tx = conn.transaction()?;
                let removed = tx.execute(
                    "DELETE FROM favorites WHERE user_id = ? AND article_id = ?",
                    [&user_id, &article_id],
                )?;
                if removed == 0 {
                    tx.execute(
                        "INSERT INTO favorites (user_id, article_id, created_at) VALUES (?, ?, ?)",
                        rusqlite::params![user_id, article_id, now],
                    )?;
                }
                tx.commit()?;
                Ok(removed == 0)
            })
            .await
    }

    /// Articles the user favorited, most recent favorite first.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Article>, StoreError> {
        let user_id = user_id.to_string();
        self.db
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ARTICLE_COLUMNS} FROM favorites f
                     JOIN articles a ON a.id = f.article_id
                     WHERE f.user_id = ?
                     ORDER BY f.created_at DESC"
                ))?;
                let rows = stmt.query_map([&user_id], article_from_row)?;
                rows.collect()
            })
            .await
    }

    pub async fn is_favorite(&self, user_id: Uuid, article_id: Uuid) -> Result<bool, StoreError> {
        let user_id = user_id.to_string();
        let article_id = article_id.to_string();
        self.db
            .call(move |conn| {
                conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM favorites WHERE user_id = ? AND article_id = ?)",
                    [&user_id, &article_id],
                    |row| row.get(0),
                )
            })
            .await
    }
}
