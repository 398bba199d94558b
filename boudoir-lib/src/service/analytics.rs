//! Dashboard analytics, cached for `CacheConfig::analytics_ttl`.

use super::Marketplace;
use super::require_admin;
use super::require_role;
use crate::cache;
use crate::error::Result;
use crate::model::AdminAnalytics;
use crate::model::SellerAnalytics;
use crate::model::User;

impl Marketplace {
    pub async fn admin_analytics(&self, admin: &User) -> Result<AdminAnalytics> {
        require_admin(admin)?;
        let key = "analytics:admin";
        if let Some(hit) = cache::load(self.cache.as_ref(), key).await {
            return Ok(hit);
        }
        let analytics = self.db.analytics().admin().await?;
        cache::store(self.cache.as_ref(), key, &analytics, self.config.cache.analytics_ttl).await;
        Ok(analytics)
    }

    pub async fn seller_analytics(&self, seller: &User) -> Result<SellerAnalytics> {
        require_role(seller, |r| r.can_sell(), "seller analytics")?;
        let key = format!("analytics:seller:{}", seller.id);
        if let Some(hit) = cache::load(self.cache.as_ref(), &key).await {
            return Ok(hit);
        }
        let analytics = self.db.analytics().seller(seller.id).await?;
        cache::store(self.cache.as_ref(), &key, &analytics, self.config.cache.analytics_ttl).await;
        Ok(analytics)
    }
}
