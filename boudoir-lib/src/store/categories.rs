//! Article categories.

use async_sqlite::rusqlite;
use async_sqlite::rusqlite::Row;
use uuid::Uuid;

use super::Database;
use super::row::get_uuid;
use crate::error::StoreError;
use crate::model::Category;

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: get_uuid(row, 0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
    })
}

pub struct CategoryStore<'a> {
    db: &'a Database,
}

impl<'a> CategoryStore<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// All categories by name.
    pub async fn list(&self) -> Result<Vec<Category>, StoreError> {
        self.db
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT id, name, slug FROM categories ORDER BY name COLLATE NOCASE")?;
                let rows = stmt.query_map([], category_from_row)?;
                rows.collect()
            })
            .await
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Category>, StoreError> {
        let id = id.to_string();
        self.db
            .call(move |conn| {
                let mut stmt = conn.prepare("SELECT id, name, slug FROM categories WHERE id = ?")?;
                let mut rows = stmt.query([&id])?;
                match rows.next()? {
                    Some(row) => Ok(Some(category_from_row(row)?)),
                    None => Ok(None),
                }
            })
            .await
    }

    pub async fn slug_exists(&self, slug: &str) -> Result<bool, StoreError> {
        let slug = slug.to_string();
        self.db
            .call(move |conn| {
                conn.query_row("SELECT EXISTS(SELECT 1 FROM categories WHERE slug = ?)", [&slug], |row| row.get(0))
            })
            .await
    }

    pub async fn insert(&self, category: &Category) -> Result<(), StoreError> {
        let id = category.id.to_string();
        let name = category.name.clone();
        let slug = category.slug.clone();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO categories (id, name, slug) VALUES (?, ?, ?)",
                    rusqlite::params![id, name, slug],
                )
            })
            .await?;
        Ok(())
    }
}
