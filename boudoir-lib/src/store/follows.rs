//! Follows between users and sellers, and the feed built from them.

use async_sqlite::rusqlite;
use chrono::Utc;
use uuid::Uuid;

use super::Database;
use super::articles::ARTICLE_COLUMNS;
use super::articles::article_from_row;
use super::row::get_datetime;
use super::row::get_uuid;
use super::row::ts;
use crate::error::StoreError;
use crate::model::Article;
use crate::model::ArticleStatus;
use crate::model::Paged;
use crate::model::SellerSummary;

pub struct FollowStore<'a> {
    db: &'a Database,
}

impl<'a> FollowStore<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Follows if not following, unfollows otherwise. Returns the new state.
    pub async fn toggle(&self, follower_id: Uuid, seller_id: Uuid) -> Result<bool, StoreError> {
        let follower_id = follower_id.to_string();
        let seller_id = seller_id.to_string();
        let now = ts(&Utc::now());
        self.db
            .call_mut(move |conn| {
                let tx = conn.transaction()?;
                let removed = tx.execute(
                    "DELETE FROM follows WHERE follower_id = ? AND seller_id = ?",
                    [&follower_id, &seller_id],
                )?;
                if removed == 0 {
                    tx.execute(
                        "INSERT INTO follows (follower_id, seller_id, created_at) VALUES (?, ?, ?)",
                        rusqlite::params![follower_id, seller_id, now],
                    )?;
                }
                tx.commit()?;
                Ok(removed == 0)
            })
            .await
    }

    /// Sellers the user follows, most recently followed first.
    pub async fn followed_sellers(&self, follower_id: Uuid) -> Result<Vec<SellerSummary>, StoreError> {
        let follower_id = follower_id.to_string();
        self.db
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT u.id, u.name, f.created_at,
                        (SELECT COUNT(*) FROM articles a WHERE a.seller_id = u.id AND a.status = ?)
                     FROM follows f
                     JOIN users u ON u.id = f.seller_id
                     WHERE f.follower_id = ?
                     ORDER BY f.created_at DESC",
                )?;
                let rows = stmt.query_map([ArticleStatus::Approved.as_str(), follower_id.as_str()], |row| {
                    Ok(SellerSummary {
                        id: get_uuid(row, 0)?,
                        name: row.get(1)?,
                        followed_at: get_datetime(row, 2)?,
                        approved_articles: row.get(3)?,
                    })
                })?;
                rows.collect()
            })
            .await
    }

    pub async fn follower_ids(&self, seller_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let seller_id = seller_id.to_string();
        self.db
            .call(move |conn| {
                let mut stmt = conn.prepare("SELECT follower_id FROM follows WHERE seller_id = ?")?;
                let rows = stmt.query_map([&seller_id], |row| get_uuid(row, 0))?;
                rows.collect()
            })
            .await
    }

    /// Approved articles of followed sellers, newest first.
    pub async fn feed(&self, follower_id: Uuid, page: u32, page_size: u32) -> Result<Paged<Article>, StoreError> {
        let follower_id = follower_id.to_string();
        let page = page.max(1);
        let page_size = page_size.clamp(1, crate::model::MAX_PAGE_SIZE);
        let offset = u64::from(page - 1) * u64::from(page_size);

        let (items, total) = self
            .db
            .call(move |conn| {
                let from = "FROM articles a
                     JOIN follows f ON f.seller_id = a.seller_id
                     WHERE f.follower_id = ?1 AND a.status = ?2";
                let approved = ArticleStatus::Approved.as_str();

                let total: i64 = conn.query_row(&format!("SELECT COUNT(*) {from}"), [follower_id.as_str(), approved], |row| {
                    row.get(0)
                })?;
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ARTICLE_COLUMNS} {from} ORDER BY a.created_at DESC LIMIT {page_size} OFFSET {offset}"
                ))?;
                let items = stmt
                    .query_map([follower_id.as_str(), approved], article_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok((items, total))
            })
            .await?;

        Ok(Paged::new(items, page, page_size, total.max(0) as u64))
    }
}
