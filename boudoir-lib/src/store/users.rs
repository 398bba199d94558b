//! User accounts.

use async_sqlite::rusqlite;
use async_sqlite::rusqlite::Row;
use uuid::Uuid;

use super::Database;
use super::row::get_datetime;
use super::row::get_enum;
use super::row::get_uuid;
use super::row::like_pattern;
use super::row::ts;
use crate::error::StoreError;
use crate::model::Role;
use crate::model::User;
use crate::model::UserFilter;

const COLUMNS: &str = "id, email, name, role, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: get_uuid(row, 0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        role: get_enum(row, 3, "role", Role::parse)?,
        created_at: get_datetime(row, 4)?,
    })
}

pub struct UserStore<'a> {
    db: &'a Database,
}

impl<'a> UserStore<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Inserts a user. Returns `false` when the email is already taken,
    /// so concurrent sign-ups for one address cannot both succeed.
    pub async fn insert(&self, user: &User, password_hash: &str) -> Result<bool, StoreError> {
        let id = user.id.to_string();
        let email = user.email.to_lowercase();
        let name = user.name.clone();
        let role = user.role.as_str();
        let password_hash = password_hash.to_string();
        let created_at = ts(&user.created_at);
        let inserted = self
            .db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO users (id, email, name, role, password_hash, created_at)
                     VALUES (?, ?, ?, ?, ?, ?)",
                    rusqlite::params![id, email, name, role, password_hash, created_at],
                )
            })
            .await;
        match inserted {
            Ok(_) => Ok(true),
            Err(e) if e.is_constraint_violation() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let id = id.to_string();
        self.db
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM users WHERE id = ?"))?;
                let mut rows = stmt.query([&id])?;
                match rows.next()? {
                    Some(row) => Ok(Some(user_from_row(row)?)),
                    None => Ok(None),
                }
            })
            .await
    }

    /// Looks up a user and their password hash by (lowercased) email.
    pub async fn find_credentials(&self, email: &str) -> Result<Option<(User, String)>, StoreError> {
        let email = email.to_lowercase();
        self.db
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!("SELECT {COLUMNS}, password_hash FROM users WHERE email = ?"))?;
                let mut rows = stmt.query([&email])?;
                match rows.next()? {
                    Some(row) => Ok(Some((user_from_row(row)?, row.get(5)?))),
                    None => Ok(None),
                }
            })
            .await
    }

    /// Users matching the filter, newest first. The search matches name or email.
    pub async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);
        let role = filter.role.map(|r| r.as_str());

        self.db
            .call(move |conn| {
                let mut sql = format!("SELECT {COLUMNS} FROM users WHERE 1 = 1");
                let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
                if let Some(pattern) = search {
                    sql.push_str(" AND (name LIKE ? ESCAPE '\\' OR email LIKE ? ESCAPE '\\')");
                    params.push(Box::new(pattern.clone()));
                    params.push(Box::new(pattern));
                }
                if let Some(role) = role {
                    sql.push_str(" AND role = ?");
                    params.push(Box::new(role));
                }
                sql.push_str(" ORDER BY created_at DESC");

                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), user_from_row)?;
                rows.collect()
            })
            .await
    }

    /// Returns `false` when no such user exists.
    pub async fn set_role(&self, id: Uuid, role: Role) -> Result<bool, StoreError> {
        let id = id.to_string();
        let changed = self
            .db
            .call(move |conn| conn.execute("UPDATE users SET role = ? WHERE id = ?", rusqlite::params![role.as_str(), id]))
            .await?;
        Ok(changed > 0)
    }

    /// Deletes a user; sessions, articles and social links cascade.
    pub async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let id = id.to_string();
        let deleted = self.db.call(move |conn| conn.execute("DELETE FROM users WHERE id = ?", [&id])).await?;
        Ok(deleted > 0)
    }
}
