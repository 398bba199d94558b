//! Aggregates for the admin and seller dashboards.

use std::collections::BTreeMap;
use std::str::FromStr;

use async_sqlite::rusqlite;
use async_sqlite::rusqlite::Connection;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::Database;
use super::row::ts;
use crate::error::StoreError;
use crate::model::AdminAnalytics;
use crate::model::ArticleStatus;
use crate::model::DailySales;
use crate::model::OrderStatus;
use crate::model::Role;
use crate::model::SellerAnalytics;

/// Days covered by `AdminAnalytics::sales_by_day`.
pub const SALES_WINDOW_DAYS: i64 = 30;

/// Runs a `key, count` grouping query into a map pre-filled with `keys` at 0.
fn counts(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
    keys: impl IntoIterator<Item = &'static str>,
) -> rusqlite::Result<BTreeMap<String, i64>> {
    let mut map: BTreeMap<String, i64> = keys.into_iter().map(|k| (k.to_string(), 0)).collect();
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
    for row in rows {
        let (key, count) = row?;
        map.insert(key, count);
    }
    Ok(map)
}

/// Sums decimal text amounts. Unparsable amounts are skipped.
fn sum_amounts(amounts: impl IntoIterator<Item = String>) -> Decimal {
    amounts
        .into_iter()
        .filter_map(|a| Decimal::from_str(&a).ok())
        .fold(Decimal::ZERO, |acc, a| acc + a)
}

pub struct AnalyticsStore<'a> {
    db: &'a Database,
}

impl<'a> AnalyticsStore<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn admin(&self) -> Result<AdminAnalytics, StoreError> {
        let since = ts(&(Utc::now() - Duration::days(SALES_WINDOW_DAYS)));
        self.db
            .call(move |conn| {
                let users_by_role = counts(
                    conn,
                    "SELECT role, COUNT(*) FROM users GROUP BY role",
                    rusqlite::params![],
                    Role::ALL.iter().map(|r| r.as_str()),
                )?;
                let articles_by_status = counts(
                    conn,
                    "SELECT status, COUNT(*) FROM articles GROUP BY status",
                    rusqlite::params![],
                    ArticleStatus::ALL.iter().map(|s| s.as_str()),
                )?;

                let mut stmt = conn.prepare("SELECT amount, created_at FROM orders WHERE status = ?")?;
                let paid = stmt
                    .query_map([OrderStatus::Paid.as_str()], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                let mut by_day: BTreeMap<NaiveDate, (i64, Decimal)> = BTreeMap::new();
                for (amount, created_at) in paid.iter().filter(|(_, created_at)| *created_at >= since) {
                    let Some(day) = created_at.get(..10).and_then(|d| NaiveDate::from_str(d).ok()) else {
                        continue;
                    };
                    let entry = by_day.entry(day).or_insert((0, Decimal::ZERO));
                    entry.0 += 1;
                    entry.1 += Decimal::from_str(amount).unwrap_or(Decimal::ZERO);
                }

                Ok(AdminAnalytics {
                    users_by_role,
                    articles_by_status,
                    total_orders: paid.len() as i64,
                    revenue: sum_amounts(paid.into_iter().map(|(amount, _)| amount)),
                    sales_by_day: by_day
                        .into_iter()
                        .map(|(day, (orders, revenue))| DailySales { day, orders, revenue })
                        .collect(),
                })
            })
            .await
    }

    pub async fn seller(&self, seller_id: Uuid) -> Result<SellerAnalytics, StoreError> {
        let seller_id = seller_id.to_string();
        self.db
            .call(move |conn| {
                let articles_by_status = counts(
                    conn,
                    "SELECT status, COUNT(*) FROM articles WHERE seller_id = ? GROUP BY status",
                    [&seller_id],
                    ArticleStatus::ALL.iter().map(|s| s.as_str()),
                )?;
                let total_views: i64 = conn.query_row(
                    "SELECT COALESCE(SUM(views), 0) FROM articles WHERE seller_id = ?",
                    [&seller_id],
                    |row| row.get(0),
                )?;
                let total_favorites: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM favorites f JOIN articles a ON a.id = f.article_id WHERE a.seller_id = ?",
                    [&seller_id],
                    |row| row.get(0),
                )?;
                let followers: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM follows WHERE seller_id = ?",
                    [&seller_id],
                    |row| row.get(0),
                )?;

                let mut stmt = conn.prepare("SELECT amount FROM orders WHERE seller_id = ? AND status = ?")?;
                let amounts = stmt
                    .query_map([seller_id.as_str(), OrderStatus::Paid.as_str()], |row| row.get::<_, String>(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                Ok(SellerAnalytics {
                    articles_by_status,
                    total_views,
                    total_favorites,
                    sales: amounts.len() as i64,
                    revenue: sum_amounts(amounts),
                    followers,
                })
            })
            .await
    }
}
