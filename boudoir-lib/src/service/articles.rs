//! Article listing and CRUD.

use chrono::Utc;
use uuid::Uuid;

use super::Marketplace;
use super::require_role;
use super::validation::validate_article;
use crate::error::Error;
use crate::error::Result;
use crate::model::Article;
use crate::model::ArticleInput;
use crate::model::ArticleQuery;
use crate::model::ArticleStatus;
use crate::model::Paged;
use crate::model::Role;
use crate::model::User;

/// Whether `viewer` may see `article` outside the public listing.
fn can_view(article: &Article, viewer: Option<&User>) -> bool {
    article.status == ArticleStatus::Approved
        || viewer.is_some_and(|u| u.role.can_moderate() || u.id == article.seller_id)
}

fn can_edit(article: &Article, user: &User) -> bool {
    user.role == Role::Admin || user.id == article.seller_id
}

impl Marketplace {
    /// Searches articles. Anonymous visitors and buyers only ever see
    /// APPROVED articles; a seller sees every status of their own
    /// articles; moderators and admins see everything.
    pub async fn list_articles(&self, query: ArticleQuery, viewer: Option<&User>) -> Result<Paged<Article>> {
        let mut query = query;
        let unrestricted = match viewer {
            Some(user) if user.role.can_moderate() => true,
            Some(user) => query.seller_id == Some(user.id),
            None => false,
        };
        if !unrestricted {
            query.statuses = vec![ArticleStatus::Approved];
        }
        Ok(self.db.articles().search(&query).await?)
    }

    /// Fetches one article. Viewing an approved article counts a view.
    pub async fn get_article(&self, id: Uuid, viewer: Option<&User>) -> Result<Article> {
        let mut article = self
            .db
            .articles()
            .find(id)
            .await?
            .filter(|a| can_view(a, viewer))
            .ok_or_else(|| Error::not_found("Article", id.to_string()))?;

        if article.status == ArticleStatus::Approved {
            self.db.articles().increment_views(id).await?;
            article.views += 1;
        }
        Ok(article)
    }

    async fn check_category(&self, input: &ArticleInput) -> Result<()> {
        if self.db.categories().find(input.category_id).await?.is_none() {
            return Err(Error::invalid("categoryId", "unknown category"));
        }
        Ok(())
    }

    /// Publishes a new article as PENDING.
    pub async fn create_article(&self, seller: &User, input: ArticleInput) -> Result<Article> {
        require_role(seller, |r| r.can_sell(), "selling")?;
        validate_article(&input)?;
        self.check_category(&input).await?;

        let now = Utc::now();
        let article = Article {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            price: input.price,
            brand: input.brand.filter(|b| !b.trim().is_empty()),
            size: input.size.filter(|s| !s.trim().is_empty()),
            condition: input.condition,
            category_id: input.category_id,
            seller_id: seller.id,
            images: input.images,
            status: ArticleStatus::Pending,
            rejection_reason: None,
            views: 0,
            created_at: now,
            updated_at: now,
        };
        self.db.articles().insert(&article).await?;
        log::info!("Article {} submitted by {}", article.id, seller.email);
        Ok(article)
    }

    /// Edits an article. A seller's edit sends it back to moderation; sold
    /// articles are frozen.
    pub async fn update_article(&self, user: &User, id: Uuid, input: ArticleInput) -> Result<Article> {
        let mut article = self
            .db
            .articles()
            .find(id)
            .await?
            .ok_or_else(|| Error::not_found("Article", id.to_string()))?;
        if !can_edit(&article, user) {
            return Err(Error::forbidden("only the seller or an admin may edit this article"));
        }
        if article.status == ArticleStatus::Sold {
            return Err(Error::conflict("sold articles cannot be edited"));
        }
        validate_article(&input)?;
        self.check_category(&input).await?;

        let read_status = article.status;
        article.title = input.title.trim().to_string();
        article.description = input.description.trim().to_string();
        article.price = input.price;
        article.brand = input.brand.filter(|b| !b.trim().is_empty());
        article.size = input.size.filter(|s| !s.trim().is_empty());
        article.condition = input.condition;
        article.category_id = input.category_id;
        article.images = input.images;
        article.updated_at = Utc::now();
        if user.role != Role::Admin {
            article.status = ArticleStatus::Pending;
            article.rejection_reason = None;
        }

        if !self.db.articles().update(&article, read_status).await? {
            return match self.db.articles().find(id).await? {
                Some(_) => Err(Error::conflict("article changed while it was being edited")),
                None => Err(Error::not_found("Article", id.to_string())),
            };
        }
        Ok(article)
    }

    pub async fn delete_article(&self, user: &User, id: Uuid) -> Result<()> {
        let article = self
            .db
            .articles()
            .find(id)
            .await?
            .ok_or_else(|| Error::not_found("Article", id.to_string()))?;
        if !can_edit(&article, user) {
            return Err(Error::forbidden("only the seller or an admin may delete this article"));
        }
        if article.status == ArticleStatus::Sold {
            return Err(Error::conflict("sold articles cannot be deleted"));
        }
        match self.db.articles().delete(id).await {
            Ok(true) => {}
            Ok(false) => return Err(Error::not_found("Article", id.to_string())),
            // Sold in the meantime; its order still references it.
            Err(e) if e.is_constraint_violation() => {
                return Err(Error::conflict("sold articles cannot be deleted"));
            }
            Err(e) => return Err(e.into()),
        }
        log::info!("Article {} deleted by {}", id, user.email);
        Ok(())
    }
}
