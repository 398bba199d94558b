//! Orders.

use async_sqlite::rusqlite;
use async_sqlite::rusqlite::Row;
use uuid::Uuid;

use super::Database;
use super::row::get_datetime;
use super::row::get_decimal;
use super::row::get_enum;
use super::row::get_uuid;
use super::row::ts;
use crate::error::StoreError;
use crate::model::ArticleStatus;
use crate::model::Order;
use crate::model::OrderStatus;

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: get_uuid(row, 0)?,
        article_id: get_uuid(row, 1)?,
        buyer_id: get_uuid(row, 2)?,
        seller_id: get_uuid(row, 3)?,
        amount: get_decimal(row, 4)?,
        status: get_enum(row, 5, "order status", OrderStatus::parse)?,
        created_at: get_datetime(row, 6)?,
    })
}

pub struct OrderStore<'a> {
    db: &'a Database,
}

impl<'a> OrderStore<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Records `order` and marks its article SOLD in one transaction, only
    /// if the article is still APPROVED. Returns `false` (and writes
    /// nothing) otherwise.
    pub async fn place(&self, order: &Order) -> Result<bool, StoreError> {
        let order = order.clone();
        self.db
            .call_mut(move |conn| {
                let tx = conn.transaction()?;
                let article_id = order.article_id.to_string();
                let sold = tx.execute(
                    "UPDATE articles SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
                    rusqlite::params![
                        ArticleStatus::Sold.as_str(),
                        ts(&order.created_at),
                        article_id,
                        ArticleStatus::Approved.as_str(),
                    ],
                )?;
                if sold == 0 {
                    return Ok(false);
                }
                tx.execute(
                    "INSERT INTO orders (id, article_id, buyer_id, seller_id, amount, status, created_at)
                     VALUES (?, ?, ?, ?, ?, ?, ?)",
                    rusqlite::params![
                        order.id.to_string(),
                        article_id,
                        order.buyer_id.to_string(),
                        order.seller_id.to_string(),
                        order.amount.to_string(),
                        order.status.as_str(),
                        ts(&order.created_at),
                    ],
                )?;
                tx.commit()?;
                Ok(true)
            })
            .await
    }

    /// Orders placed by a buyer, newest first.
    pub async fn for_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let buyer_id = buyer_id.to_string();
        self.db
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, article_id, buyer_id, seller_id, amount, status, created_at
                     FROM orders WHERE buyer_id = ? ORDER BY created_at DESC",
                )?;
                let rows = stmt.query_map([&buyer_id], order_from_row)?;
                rows.collect()
            })
            .await
    }
}
