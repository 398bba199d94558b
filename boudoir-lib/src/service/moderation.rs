//! Moderation workflow.

use uuid::Uuid;

use super::Marketplace;
use super::notification;
use super::require_role;
use crate::error::Error;
use crate::error::Result;
use crate::model::Article;
use crate::model::ArticleQuery;
use crate::model::ArticleSort;
use crate::model::ArticleStatus;
use crate::model::NotificationKind;
use crate::model::Paged;
use crate::model::User;

impl Marketplace {
    /// Articles awaiting moderation, oldest first.
    pub async fn pending_articles(&self, moderator: &User, page: u32, page_size: u32) -> Result<Paged<Article>> {
        require_role(moderator, |r| r.can_moderate(), "moderation")?;
        let query = ArticleQuery::new()
            .with_status(ArticleStatus::Pending)
            .with_sort(ArticleSort::Oldest)
            .with_page(page, page_size);
        Ok(self.db.articles().search(&query).await?)
    }

    async fn pending(&self, id: Uuid) -> Result<Article> {
        let article = self
            .db
            .articles()
            .find(id)
            .await?
            .ok_or_else(|| Error::not_found("Article", id.to_string()))?;
        if article.status != ArticleStatus::Pending {
            return Err(Error::conflict(format!(
                "article is {} and cannot be moderated",
                article.status.as_str()
            )));
        }
        Ok(article)
    }

    /// Approves a pending article, then notifies the seller and their followers.
    pub async fn approve(&self, moderator: &User, id: Uuid) -> Result<Article> {
        require_role(moderator, |r| r.can_moderate(), "moderation")?;
        let mut article = self.pending(id).await?;

        if !self
            .db
            .articles()
            .transition(id, ArticleStatus::Pending, ArticleStatus::Approved, None)
            .await?
        {
            return Err(Error::conflict("article was moderated concurrently"));
        }
        article.status = ArticleStatus::Approved;
        article.rejection_reason = None;

        let mut notifications = vec![notification(
            article.seller_id,
            NotificationKind::ArticleApproved,
            format!("Votre article « {} » a été approuvé", article.title),
            Some(article.id),
        )];
        let seller_name = self.db.users().find(article.seller_id).await?.map(|u| u.name).unwrap_or_default();
        for follower in self.db.follows().follower_ids(article.seller_id).await? {
            notifications.push(notification(
                follower,
                NotificationKind::NewArticleFromFollowed,
                format!("{} a publié « {} »", seller_name, article.title),
                Some(article.id),
            ));
        }
        self.notify(notifications).await;

        log::info!("Article {} approved by {}", id, moderator.email);
        Ok(article)
    }

    /// Rejects a pending article with a mandatory reason.
    pub async fn reject(&self, moderator: &User, id: Uuid, reason: &str) -> Result<Article> {
        require_role(moderator, |r| r.can_moderate(), "moderation")?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(Error::invalid("reason", "a rejection reason is required"));
        }
        let mut article = self.pending(id).await?;

        if !self
            .db
            .articles()
            .transition(id, ArticleStatus::Pending, ArticleStatus::Rejected, Some(reason.to_string()))
            .await?
        {
            return Err(Error::conflict("article was moderated concurrently"));
        }
        article.status = ArticleStatus::Rejected;
        article.rejection_reason = Some(reason.to_string());

        self.notify(vec![notification(
            article.seller_id,
            NotificationKind::ArticleRejected,
            format!("Votre article « {} » a été refusé : {}", article.title, reason),
            Some(article.id),
        )])
        .await;

        log::info!("Article {} rejected by {}", id, moderator.email);
        Ok(article)
    }
}
