//! Articles and the listing search.

use async_sqlite::rusqlite;
use async_sqlite::rusqlite::Row;
use async_sqlite::rusqlite::ToSql;
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use uuid::Uuid;

use super::Database;
use super::row::get_datetime;
use super::row::get_decimal;
use super::row::get_enum;
use super::row::get_uuid;
use super::row::like_pattern;
use super::row::ts;
use crate::error::StoreError;
use crate::images;
use crate::model::Article;
use crate::model::ArticleQuery;
use crate::model::ArticleStatus;
use crate::model::Condition;
use crate::model::Paged;

/// Article columns under the `a` alias, in [`article_from_row`] order.
pub(crate) const ARTICLE_COLUMNS: &str = "a.id, a.title, a.description, a.price, a.brand, a.size, a.condition, \
     a.category_id, a.seller_id, a.images, a.status, a.rejection_reason, a.views, a.created_at, a.updated_at";

pub(crate) fn article_from_row(row: &Row<'_>) -> rusqlite::Result<Article> {
    let raw_images: Option<String> = row.get(9)?;
    Ok(Article {
        id: get_uuid(row, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        price: get_decimal(row, 3)?,
        brand: row.get(4)?,
        size: row.get(5)?,
        condition: get_enum(row, 6, "condition", Condition::parse)?,
        category_id: get_uuid(row, 7)?,
        seller_id: get_uuid(row, 8)?,
        images: images::decode_opt(raw_images.as_deref()),
        status: get_enum(row, 10, "status", ArticleStatus::parse)?,
        rejection_reason: row.get(11)?,
        views: row.get(12)?,
        created_at: get_datetime(row, 13)?,
        updated_at: get_datetime(row, 14)?,
    })
}

/// WHERE clause and its parameters for a listing query.
struct Filter {
    clause: String,
    params: Vec<Box<dyn ToSql>>,
}

impl Filter {
    fn from_query(query: &ArticleQuery) -> Self {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            conditions.push(
                "(a.title LIKE ? ESCAPE '\\' OR a.description LIKE ? ESCAPE '\\' OR a.brand LIKE ? ESCAPE '\\')"
                    .to_string(),
            );
            let pattern = like_pattern(search);
            params.push(Box::new(pattern.clone()));
            params.push(Box::new(pattern.clone()));
            params.push(Box::new(pattern));
        }
        if let Some(category_id) = query.category_id {
            conditions.push("a.category_id = ?".to_string());
            params.push(Box::new(category_id.to_string()));
        }
        if let Some(seller_id) = query.seller_id {
            conditions.push("a.seller_id = ?".to_string());
            params.push(Box::new(seller_id.to_string()));
        }
        if !query.statuses.is_empty() {
            let marks = vec!["?"; query.statuses.len()].join(", ");
            conditions.push(format!("a.status IN ({})", marks));
            for status in &query.statuses {
                params.push(Box::new(status.as_str()));
            }
        }
        if let Some(size) = query.size.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            conditions.push("a.size = ? COLLATE NOCASE".to_string());
            params.push(Box::new(size.to_string()));
        }
        if let Some(condition) = query.condition {
            conditions.push("a.condition = ?".to_string());
            params.push(Box::new(condition.as_str()));
        }
        if let Some(min) = query.min_price.and_then(|p| p.to_f64()) {
            conditions.push("CAST(a.price AS REAL) >= ?".to_string());
            params.push(Box::new(min));
        }
        if let Some(max) = query.max_price.and_then(|p| p.to_f64()) {
            conditions.push("CAST(a.price AS REAL) <= ?".to_string());
            params.push(Box::new(max));
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        Self { clause, params }
    }
}

pub struct ArticleStore<'a> {
    db: &'a Database,
}

impl<'a> ArticleStore<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn insert(&self, article: &Article) -> Result<(), StoreError> {
        let article = article.clone();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO articles (id, title, description, price, brand, size, condition, category_id,
                        seller_id, images, status, rejection_reason, views, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    rusqlite::params![
                        article.id.to_string(),
                        article.title,
                        article.description,
                        article.price.to_string(),
                        article.brand,
                        article.size,
                        article.condition.as_str(),
                        article.category_id.to_string(),
                        article.seller_id.to_string(),
                        images::encode(&article.images),
                        article.status.as_str(),
                        article.rejection_reason,
                        article.views,
                        ts(&article.created_at),
                        ts(&article.updated_at),
                    ],
                )
            })
            .await?;
        Ok(())
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Article>, StoreError> {
        let id = id.to_string();
        self.db
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!("SELECT {ARTICLE_COLUMNS} FROM articles a WHERE a.id = ?"))?;
                let mut rows = stmt.query([&id])?;
                match rows.next()? {
                    Some(row) => Ok(Some(article_from_row(row)?)),
                    None => Ok(None),
                }
            })
            .await
    }

    /// Writes every editable column of `article`, only if the stored status
    /// is still `expected`. Returns `false` when the article is missing or
    /// was moderated or sold since it was read.
    pub async fn update(&self, article: &Article, expected: ArticleStatus) -> Result<bool, StoreError> {
        let article = article.clone();
        let changed = self
            .db
            .call(move |conn| {
                conn.execute(
                    "UPDATE articles SET title = ?, description = ?, price = ?, brand = ?, size = ?,
                        condition = ?, category_id = ?, images = ?, status = ?, rejection_reason = ?,
                        updated_at = ?
                     WHERE id = ? AND status = ?",
                    rusqlite::params![
                        article.title,
                        article.description,
                        article.price.to_string(),
                        article.brand,
                        article.size,
                        article.condition.as_str(),
                        article.category_id.to_string(),
                        images::encode(&article.images),
                        article.status.as_str(),
                        article.rejection_reason,
                        ts(&article.updated_at),
                        article.id.to_string(),
                        expected.as_str(),
                    ],
                )
            })
            .await?;
        Ok(changed > 0)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let id = id.to_string();
        let deleted = self
            .db
            .call(move |conn| conn.execute("DELETE FROM articles WHERE id = ?", [&id]))
            .await?;
        Ok(deleted > 0)
    }

    /// Moves an article from `from` to `to`. Returns `false` when the
    /// article is missing or no longer in `from`.
    pub async fn transition(
        &self,
        id: Uuid,
        from: ArticleStatus,
        to: ArticleStatus,
        rejection_reason: Option<String>,
    ) -> Result<bool, StoreError> {
        let id = id.to_string();
        let now = ts(&Utc::now());
        let changed = self
            .db
            .call(move |conn| {
                conn.execute(
                    "UPDATE articles SET status = ?, rejection_reason = ?, updated_at = ?
                     WHERE id = ? AND status = ?",
                    rusqlite::params![to.as_str(), rejection_reason, now, id, from.as_str()],
                )
            })
            .await?;
        Ok(changed > 0)
    }

    pub async fn increment_views(&self, id: Uuid) -> Result<(), StoreError> {
        let id = id.to_string();
        self.db
            .call(move |conn| conn.execute("UPDATE articles SET views = views + 1 WHERE id = ?", [&id]))
            .await?;
        Ok(())
    }

    /// One page of articles matching `query`, with the total match count.
    pub async fn search(&self, query: &ArticleQuery) -> Result<Paged<Article>, StoreError> {
        let query = query.clone();
        let (page, page_size) = query.normalized_paging();

        let (items, total) = self
            .db
            .call(move |conn| {
                let filter = Filter::from_query(&query);
                let params = || rusqlite::params_from_iter(filter.params.iter());

                let total: i64 = conn.query_row(
                    &format!("SELECT COUNT(*) FROM articles a{}", filter.clause),
                    params(),
                    |row| row.get(0),
                )?;

                let sql = format!(
                    "SELECT {ARTICLE_COLUMNS} FROM articles a{} ORDER BY {} LIMIT {} OFFSET {}",
                    filter.clause,
                    query.sort.order_clause(),
                    page_size,
                    u64::from(page - 1) * u64::from(page_size),
                );
                let mut stmt = conn.prepare(&sql)?;
                let items = stmt.query_map(params(), article_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
                Ok((items, total))
            })
            .await?;

        Ok(Paged::new(items, page, page_size, total.max(0) as u64))
    }

    /// Rewrites every `images` value that is not in canonical JSON-array
    /// form. Returns the number of rows changed.
    pub async fn normalize_images(&self) -> Result<usize, StoreError> {
        self.db
            .call_mut(|conn| {
                let tx = conn.transaction()?;
                let repairs = {
                    let mut stmt = tx.prepare("SELECT id, images FROM articles")?;
                    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)))?;
                    let mut repairs = Vec::new();
                    for row in rows {
                        let (id, raw) = row?;
                        if let Some(canonical) = images::normalize(raw.as_deref()) {
                            repairs.push((id, canonical));
                        }
                    }
                    repairs
                };
                for (id, canonical) in &repairs {
                    tx.execute("UPDATE articles SET images = ? WHERE id = ?", [canonical, id])?;
                }
                tx.commit()?;
                Ok(repairs.len())
            })
            .await
    }
}
