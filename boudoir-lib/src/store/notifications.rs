//! In-app notifications.

use async_sqlite::rusqlite;
use async_sqlite::rusqlite::Row;
use uuid::Uuid;

use super::Database;
use super::row::get_datetime;
use super::row::get_enum;
use super::row::get_opt_uuid;
use super::row::get_uuid;
use super::row::ts;
use crate::error::StoreError;
use crate::model::Notification;
use crate::model::NotificationKind;

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: get_uuid(row, 0)?,
        user_id: get_uuid(row, 1)?,
        kind: get_enum(row, 2, "notification kind", NotificationKind::parse)?,
        message: row.get(3)?,
        article_id: get_opt_uuid(row, 4)?,
        read: row.get(5)?,
        created_at: get_datetime(row, 6)?,
    })
}

pub struct NotificationStore<'a> {
    db: &'a Database,
}

impl<'a> NotificationStore<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Inserts notifications in one transaction.
    pub async fn insert_many(&self, notifications: &[Notification]) -> Result<(), StoreError> {
        if notifications.is_empty() {
            return Ok(());
        }
        let notifications = notifications.to_vec();
        self.db
            .call_mut(move |conn| {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO notifications (id, user_id, kind, message, article_id, read, created_at)
                         VALUES (?, ?, ?, ?, ?, ?, ?)",
                    )?;
                    for n in &notifications {
                        stmt.execute(rusqlite::params![
                            n.id.to_string(),
                            n.user_id.to_string(),
                            n.kind.as_str(),
                            n.message,
                            n.article_id.map(|id| id.to_string()),
                            n.read,
                            ts(&n.created_at),
                        ])?;
                    }
                }
                tx.commit()
            })
            .await
    }

    /// The user's notifications, newest first.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Notification>, StoreError> {
        let user_id = user_id.to_string();
        self.db
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, kind, message, article_id, read, created_at
                     FROM notifications WHERE user_id = ? ORDER BY created_at DESC",
                )?;
                let rows = stmt.query_map([&user_id], notification_from_row)?;
                rows.collect()
            })
            .await
    }

    /// Marks one of the user's notifications read. Returns `false` when the
    /// notification does not exist or belongs to someone else.
    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let user_id = user_id.to_string();
        let id = id.to_string();
        let changed = self
            .db
            .call(move |conn| {
                conn.execute("UPDATE notifications SET read = 1 WHERE id = ? AND user_id = ?", [&id, &user_id])
            })
            .await?;
        Ok(changed > 0)
    }

    /// Returns the number of notifications that were unread.
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<usize, StoreError> {
        let user_id = user_id.to_string();
        self.db
            .call(move |conn| conn.execute("UPDATE notifications SET read = 1 WHERE user_id = ? AND read = 0", [&user_id]))
            .await
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let user_id = user_id.to_string();
        self.db
            .call(move |conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND read = 0",
                    [&user_id],
                    |row| row.get(0),
                )
            })
            .await
    }
}
