//! Favorites, follows, feed and notifications.

use uuid::Uuid;

use super::Marketplace;
use super::notification;
use crate::error::Error;
use crate::error::Result;
use crate::model::Article;
use crate::model::ArticleStatus;
use crate::model::Notification;
use crate::model::NotificationKind;
use crate::model::Paged;
use crate::model::Role;
use crate::model::SellerSummary;
use crate::model::User;

impl Marketplace {
    // =========================================================================
    // Favorites
    // =========================================================================

    /// Adds or removes a favorite; returns the new state.
    pub async fn toggle_favorite(&self, user: &User, article_id: Uuid) -> Result<bool> {
        let article = self.db.articles().find(article_id).await?;
        let visible = article.is_some_and(|a| a.status == ArticleStatus::Approved || a.seller_id == user.id);
        if !visible {
            return Err(Error::not_found("Article", article_id.to_string()));
        }
        Ok(self.db.favorites().toggle(user.id, article_id).await?)
    }

    pub async fn favorites(&self, user: &User) -> Result<Vec<Article>> {
        Ok(self.db.favorites().list(user.id).await?)
    }

    // =========================================================================
    // Follows
    // =========================================================================

    /// Follows or unfollows a seller; returns the new state. A new follow
    /// notifies the seller.
    pub async fn toggle_follow(&self, user: &User, seller_id: Uuid) -> Result<bool> {
        if seller_id == user.id {
            return Err(Error::invalid("sellerId", "you cannot follow yourself"));
        }
        let seller = self
            .db
            .users()
            .find(seller_id)
            .await?
            .ok_or_else(|| Error::not_found("Seller", seller_id.to_string()))?;
        if seller.role != Role::Seller {
            return Err(Error::invalid("sellerId", "only sellers can be followed"));
        }

        let following = self.db.follows().toggle(user.id, seller_id).await?;
        if following {
            self.notify(vec![notification(
                seller_id,
                NotificationKind::NewFollower,
                format!("{} vous suit désormais", user.name),
                None,
            )])
            .await;
        }
        Ok(following)
    }

    pub async fn followed_sellers(&self, user: &User) -> Result<Vec<SellerSummary>> {
        Ok(self.db.follows().followed_sellers(user.id).await?)
    }

    /// Approved articles from followed sellers, newest first.
    pub async fn feed(&self, user: &User, page: u32, page_size: u32) -> Result<Paged<Article>> {
        Ok(self.db.follows().feed(user.id, page, page_size).await?)
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    pub async fn notifications(&self, user: &User) -> Result<Vec<Notification>> {
        Ok(self.db.notifications().list(user.id).await?)
    }

    pub async fn mark_read(&self, user: &User, id: Uuid) -> Result<()> {
        if self.db.notifications().mark_read(user.id, id).await? {
            Ok(())
        } else {
            Err(Error::not_found("Notification", id.to_string()))
        }
    }

    /// Returns how many notifications were newly marked read.
    pub async fn mark_all_read(&self, user: &User) -> Result<usize> {
        Ok(self.db.notifications().mark_all_read(user.id).await?)
    }

    pub async fn unread_count(&self, user: &User) -> Result<i64> {
        Ok(self.db.notifications().unread_count(user.id).await?)
    }
}
