//! Marketplace operations
//!
//! [`Marketplace`] is the single entry point used by the HTTP layer. Every
//! operation takes the acting [`User`] (or `None` for anonymous visitors),
//! applies the role rules, and goes through the [`Database`] repositories.
//!
//! | Area | Operations |
//! |---|---|
//! | auth | register, login, logout, authenticate |
//! | articles | list, get, create, update, delete |
//! | moderation | pending, approve, reject |
//! | social | favorites, follows, feed, notifications |
//! | orders | purchase |
//! | admin | users, roles, categories |
//! | analytics | admin and seller dashboards |

mod admin;
mod analytics;
mod articles;
mod auth;
mod moderation;
mod orders;
mod password;
mod social;
pub mod validation;

use std::sync::Arc;

use chrono::Duration;
use chrono::Utc;
use uuid::Uuid;

use crate::cache::CacheConfig;
use crate::cache::CacheProvider;
use crate::cache::InMemoryCache;
use crate::error::Error;
use crate::error::Result;
use crate::model::Notification;
use crate::model::NotificationKind;
use crate::model::Role;
use crate::model::User;
use crate::store::Database;

/// Tunables of the marketplace service.
#[derive(Debug, Clone)]
pub struct MarketplaceConfig {
    /// Lifetime of a login session.
    pub session_ttl: Duration,
    pub cache: CacheConfig,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::hours(24 * 7),
            cache: CacheConfig::default(),
        }
    }
}

/// The marketplace service. Cheap to clone.
#[derive(Clone)]
pub struct Marketplace {
    db: Database,
    cache: Arc<dyn CacheProvider>,
    config: MarketplaceConfig,
}

impl Marketplace {
    /// Creates the service with an in-memory cache.
    pub fn new(db: Database, config: MarketplaceConfig) -> Self {
        Self::with_cache(db, config, Arc::new(InMemoryCache::new()))
    }

    pub fn with_cache(db: Database, config: MarketplaceConfig, cache: Arc<dyn CacheProvider>) -> Self {
        Self { db, cache, config }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &MarketplaceConfig {
        &self.config
    }

    /// Stores notifications, logging instead of failing the caller's
    /// operation when the write fails.
    async fn notify(&self, notifications: Vec<Notification>) {
        if let Err(e) = self.db.notifications().insert_many(&notifications).await {
            log::error!("Failed to store {} notification(s): {}", notifications.len(), e);
        }
    }
}

fn notification(user_id: Uuid, kind: NotificationKind, message: String, article_id: Option<Uuid>) -> Notification {
    Notification {
        id: Uuid::new_v4(),
        user_id,
        kind,
        message,
        article_id,
        read: false,
        created_at: Utc::now(),
    }
}

fn require_user(user: Option<&User>) -> Result<&User> {
    user.ok_or_else(|| Error::unauthorized("authentication required"))
}

fn require_role(user: &User, allowed: impl Fn(Role) -> bool, what: &str) -> Result<()> {
    if allowed(user.role) {
        Ok(())
    } else {
        Err(Error::forbidden(format!("{} not allowed for role {}", what, user.role)))
    }
}

fn require_admin(user: &User) -> Result<()> {
    require_role(user, |r| r == Role::Admin, "administration")
}
