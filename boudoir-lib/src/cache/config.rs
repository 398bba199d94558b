//! Cache lifetimes

use std::time::Duration;

/// Time-to-live per kind of cached data.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use boudoir_lib::cache::CacheConfig;
///
/// let config = CacheConfig::default().with_analytics_ttl(Duration::from_secs(60));
/// assert_eq!(config.categories_ttl, Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Dashboard analytics snapshots.
    ///
    /// Default: 5 minutes
    pub analytics_ttl: Duration,

    /// The category list.
    ///
    /// Default: 1 hour
    pub categories_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            analytics_ttl: Duration::from_secs(300),
            categories_ttl: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_analytics_ttl(mut self, ttl: Duration) -> Self {
        self.analytics_ttl = ttl;
        self
    }

    pub fn with_categories_ttl(mut self, ttl: Duration) -> Self {
        self.categories_ttl = ttl;
        self
    }

    /// Disables caching.
    pub fn no_cache() -> Self {
        Self {
            analytics_ttl: Duration::ZERO,
            categories_ttl: Duration::ZERO,
        }
    }
}
