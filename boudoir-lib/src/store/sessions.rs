//! Login sessions.

use async_sqlite::rusqlite;
use chrono::Utc;

use super::Database;
use super::row::get_datetime;
use super::row::get_uuid;
use super::row::ts;
use crate::error::StoreError;
use crate::model::Session;

pub struct SessionStore<'a> {
    db: &'a Database,
}

impl<'a> SessionStore<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn insert(&self, session: &Session) -> Result<(), StoreError> {
        let token = session.token.clone();
        let user_id = session.user_id.to_string();
        let created_at = ts(&session.created_at);
        let expires_at = ts(&session.expires_at);
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
                    rusqlite::params![token, user_id, created_at, expires_at],
                )
            })
            .await?;
        Ok(())
    }

    /// Returns the session, expired or not.
    pub async fn find(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let token = token.to_string();
        self.db
            .call(move |conn| {
                let mut stmt =
                    conn.prepare("SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = ?")?;
                let mut rows = stmt.query([&token])?;
                match rows.next()? {
                    Some(row) => Ok(Some(Session {
                        token: row.get(0)?,
                        user_id: get_uuid(row, 1)?,
                        created_at: get_datetime(row, 2)?,
                        expires_at: get_datetime(row, 3)?,
                    })),
                    None => Ok(None),
                }
            })
            .await
    }

    pub async fn delete(&self, token: &str) -> Result<bool, StoreError> {
        let token = token.to_string();
        let deleted = self
            .db
            .call(move |conn| conn.execute("DELETE FROM sessions WHERE token = ?", [&token]))
            .await?;
        Ok(deleted > 0)
    }

    /// Removes expired sessions and returns how many were dropped.
    pub async fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = ts(&Utc::now());
        self.db
            .call(move |conn| conn.execute("DELETE FROM sessions WHERE expires_at <= ?", [&now]))
            .await
    }
}
