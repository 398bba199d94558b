//! Purchases.

use chrono::Utc;
use uuid::Uuid;

use super::Marketplace;
use super::notification;
use crate::error::Error;
use crate::error::Result;
use crate::model::ArticleStatus;
use crate::model::NotificationKind;
use crate::model::Order;
use crate::model::OrderStatus;
use crate::model::User;

impl Marketplace {
    /// Buys an approved article: records a PAID order, marks the article
    /// SOLD and notifies the seller.
    pub async fn purchase(&self, buyer: &User, article_id: Uuid) -> Result<Order> {
        let article = self
            .db
            .articles()
            .find(article_id)
            .await?
            .filter(|a| matches!(a.status, ArticleStatus::Approved | ArticleStatus::Sold) || a.seller_id == buyer.id)
            .ok_or_else(|| Error::not_found("Article", article_id.to_string()))?;

        if article.seller_id == buyer.id {
            return Err(Error::forbidden("you cannot buy your own article"));
        }
        if article.status != ArticleStatus::Approved {
            return Err(Error::conflict("article is no longer available"));
        }

        let order = Order {
            id: Uuid::new_v4(),
            article_id,
            buyer_id: buyer.id,
            seller_id: article.seller_id,
            amount: article.price,
            status: OrderStatus::Paid,
            created_at: Utc::now(),
        };
        if !self.db.orders().place(&order).await? {
            return Err(Error::conflict("article is no longer available"));
        }

        self.notify(vec![notification(
            article.seller_id,
            NotificationKind::ArticleSold,
            format!("« {} » a été vendu pour {} €", article.title, article.price),
            Some(article.id),
        )])
        .await;

        log::info!("Order {} placed by {} for article {}", order.id, buyer.email, article_id);
        Ok(order)
    }

    /// The buyer's orders, newest first.
    pub async fn orders(&self, buyer: &User) -> Result<Vec<Order>> {
        Ok(self.db.orders().for_buyer(buyer.id).await?)
    }
}
