//! User and category administration.

use uuid::Uuid;

use super::Marketplace;
use super::require_admin;
use crate::cache;
use crate::error::Error;
use crate::error::Result;
use crate::model::Category;
use crate::model::NewUser;
use crate::model::Role;
use crate::model::User;
use crate::model::UserFilter;
use crate::model::slugify;

const CATEGORIES_KEY: &str = "categories";

impl Marketplace {
    pub async fn list_users(&self, admin: &User, filter: &UserFilter) -> Result<Vec<User>> {
        require_admin(admin)?;
        Ok(self.db.users().list(filter).await?)
    }

    /// Creates an account with any role.
    pub async fn create_user(&self, admin: &User, input: NewUser) -> Result<User> {
        require_admin(admin)?;
        self.create_account(input).await
    }

    /// Changes a user's role. Admins cannot demote themselves.
    pub async fn set_role(&self, admin: &User, user_id: Uuid, role: Role) -> Result<User> {
        require_admin(admin)?;
        if user_id == admin.id && role != Role::Admin {
            return Err(Error::forbidden("admins cannot demote themselves"));
        }
        if !self.db.users().set_role(user_id, role).await? {
            return Err(Error::not_found("User", user_id.to_string()));
        }
        log::info!("User {} is now {} (by {})", user_id, role, admin.email);
        self.db
            .users()
            .find(user_id)
            .await?
            .ok_or_else(|| Error::not_found("User", user_id.to_string()))
    }

    /// Deletes an account and everything it owns.
    pub async fn delete_user(&self, admin: &User, user_id: Uuid) -> Result<()> {
        require_admin(admin)?;
        if user_id == admin.id {
            return Err(Error::forbidden("admins cannot delete their own account"));
        }
        if !self.db.users().delete(user_id).await? {
            return Err(Error::not_found("User", user_id.to_string()));
        }
        log::info!("User {} deleted by {}", user_id, admin.email);
        Ok(())
    }

    /// All categories, served from cache when fresh.
    pub async fn categories(&self) -> Result<Vec<Category>> {
        if let Some(categories) = cache::load(self.cache.as_ref(), CATEGORIES_KEY).await {
            return Ok(categories);
        }
        let categories = self.db.categories().list().await?;
        cache::store(self.cache.as_ref(), CATEGORIES_KEY, &categories, self.config.cache.categories_ttl).await;
        Ok(categories)
    }

    /// Creates a category; its slug is derived from the name and must be unique.
    pub async fn create_category(&self, admin: &User, name: &str) -> Result<Category> {
        require_admin(admin)?;
        let name = name.trim();
        let slug = slugify(name);
        if slug.is_empty() || name.chars().count() > 50 {
            return Err(Error::invalid("name", "must contain letters or digits, 50 characters at most"));
        }
        if self.db.categories().slug_exists(&slug).await? {
            return Err(Error::conflict(format!("category '{}' already exists", slug)));
        }

        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug,
        };
        self.db.categories().insert(&category).await?;
        self.cache.remove(CATEGORIES_KEY).await;
        log::info!("Category {} created", category.slug);
        Ok(category)
    }
}
