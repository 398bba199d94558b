//! Cached, cancellable analytics loading for the dashboards.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::Digest;
use sha2::Sha256;
use tokio::sync::Mutex;

use super::BoudoirClient;
use crate::cache;
use crate::cache::CacheProvider;
use crate::error::ClientError;
use crate::fetch::FetchController;
use crate::fetch::FetchState;
use crate::model::AdminAnalytics;
use crate::model::SellerAnalytics;

const ADMIN_SCOPE: &str = "admin";
const SELLER_SCOPE: &str = "seller";

/// Cache key of one dashboard for one session. The token is hashed so it
/// never lands in the cache table.
fn cache_key(scope: &str, token: Option<&str>) -> String {
    match token {
        Some(token) => {
            let digest = Sha256::digest(token.as_bytes());
            let id: String = digest[..12].iter().map(|b| format!("{:02x}", b)).collect();
            format!("analytics:{}:{}", scope, id)
        }
        None => format!("analytics:{}:anonymous", scope),
    }
}

/// Loads dashboard analytics through a TTL cache.
///
/// A refresh first consults the cache; on a miss it issues the request
/// under a fresh [`FetchController`] ticket so that a newer refresh cancels
/// the older one. Failures leave the last loaded snapshot in place and
/// raise a toast. Cached snapshots are keyed by the client's session, so
/// fetchers sharing a cache never see each other's figures.
pub struct AnalyticsFetcher {
    client: BoudoirClient,
    cache: Arc<dyn CacheProvider>,
    ttl: Duration,
    admin: Mutex<FetchController<AdminAnalytics>>,
    seller: Mutex<FetchController<SellerAnalytics>>,
}

impl AnalyticsFetcher {
    pub fn new(client: BoudoirClient, cache: Arc<dyn CacheProvider>, ttl: Duration) -> Self {
        Self {
            client,
            cache,
            ttl,
            admin: Mutex::new(FetchController::new()),
            seller: Mutex::new(FetchController::new()),
        }
    }

    /// Admin dashboard figures. `force` bypasses the cache.
    pub async fn refresh_admin(&self, force: bool) -> Option<AdminAnalytics> {
        let client = self.client.clone();
        let key = self.key(ADMIN_SCOPE);
        self.run(&self.admin, &key, force, async move { client.admin_analytics().await })
            .await
    }

    /// Seller dashboard figures for the authenticated seller.
    pub async fn refresh_seller(&self, force: bool) -> Option<SellerAnalytics> {
        let client = self.client.clone();
        let key = self.key(SELLER_SCOPE);
        self.run(&self.seller, &key, force, async move { client.seller_analytics().await })
            .await
    }

    pub async fn admin_state(&self) -> FetchState<AdminAnalytics> {
        self.admin.lock().await.state().clone()
    }

    pub async fn seller_state(&self) -> FetchState<SellerAnalytics> {
        self.seller.lock().await.state().clone()
    }

    /// Cancels whatever is in flight for both dashboards.
    pub async fn cancel(&self) {
        self.admin.lock().await.reset();
        self.seller.lock().await.reset();
    }

    /// Drops cached snapshots so the next refresh hits the server.
    pub async fn invalidate(&self) {
        self.cache.remove(&self.key(ADMIN_SCOPE)).await;
        self.cache.remove(&self.key(SELLER_SCOPE)).await;
    }

    /// Pending error toast from either dashboard.
    pub async fn take_toast(&self) -> Option<String> {
        if let Some(toast) = self.admin.lock().await.take_toast() {
            return Some(toast);
        }
        self.seller.lock().await.take_toast()
    }

    fn key(&self, scope: &str) -> String {
        cache_key(scope, self.client.token())
    }

    async fn run<T, Fut>(&self, slot: &Mutex<FetchController<T>>, key: &str, force: bool, request: Fut) -> Option<T>
    where
        T: Serialize + DeserializeOwned + Clone,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        if !force && let Some(hit) = cache::load::<T>(self.cache.as_ref(), key).await {
            log::debug!("Analytics cache hit for {}", key);
            let mut fetch = slot.lock().await;
            let ticket = fetch.begin();
            fetch.finish(&ticket, Ok::<_, ClientError>(hit.clone()));
            return Some(hit);
        }

        let ticket = slot.lock().await.begin();
        let result = tokio::select! {
            _ = ticket.token().cancelled() => Err(ClientError::Cancelled),
            result = request => result,
        };

        if let Ok(data) = &result {
            cache::store(self.cache.as_ref(), key, data, self.ttl).await;
        }

        let loaded = result.as_ref().ok().cloned();
        if slot.lock().await.finish(&ticket, result) {
            loaded
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rust_decimal::Decimal;

    use super::*;
    use crate::cache::InMemoryCache;

    fn snapshot() -> AdminAnalytics {
        AdminAnalytics {
            users_by_role: BTreeMap::from([("BUYER".to_string(), 4)]),
            articles_by_status: BTreeMap::new(),
            total_orders: 2,
            revenue: Decimal::new(4550, 2),
            sales_by_day: Vec::new(),
        }
    }

    fn seller_snapshot(sales: i64) -> SellerAnalytics {
        SellerAnalytics {
            sales,
            ..Default::default()
        }
    }

    fn unreachable_client() -> BoudoirClient {
        BoudoirClient::with_http("http://127.0.0.1:9", reqwest::Client::new(), Some(Duration::from_secs(2)))
            .unwrap()
    }

    fn fetcher(cache: Arc<InMemoryCache>) -> AnalyticsFetcher {
        AnalyticsFetcher::new(unreachable_client().with_token("jeton-a"), cache, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let cache = Arc::new(InMemoryCache::new());
        let fetcher = fetcher(Arc::clone(&cache));
        cache::store(cache.as_ref(), &fetcher.key(ADMIN_SCOPE), &snapshot(), Duration::from_secs(60)).await;

        assert_eq!(fetcher.refresh_admin(false).await, Some(snapshot()));
        assert_eq!(fetcher.admin_state().await, FetchState::Success(snapshot()));
    }

    #[tokio::test]
    async fn test_force_bypasses_and_refreshes_cache() {
        let cache = Arc::new(InMemoryCache::new());
        let fetcher = fetcher(Arc::clone(&cache));
        let key = fetcher.key(SELLER_SCOPE);
        cache::store(cache.as_ref(), &key, &seller_snapshot(1), Duration::from_secs(60)).await;

        let fresh = async { Ok(seller_snapshot(2)) };
        assert_eq!(fetcher.run(&fetcher.seller, &key, true, fresh).await, Some(seller_snapshot(2)));
        assert_eq!(cache::load::<SellerAnalytics>(cache.as_ref(), &key).await, Some(seller_snapshot(2)));
    }

    #[tokio::test]
    async fn test_newer_refresh_cancels_older() {
        let fetcher = fetcher(Arc::new(InMemoryCache::new()));
        let key = fetcher.key(SELLER_SCOPE);

        let older = fetcher.run(&fetcher.seller, &key, true, std::future::pending());
        let newer = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            fetcher.run(&fetcher.seller, &key, true, async { Ok(seller_snapshot(3)) }).await
        };
        let (older, newer) = tokio::join!(older, newer);

        assert_eq!(older, None);
        assert_eq!(newer, Some(seller_snapshot(3)));
        assert_eq!(fetcher.seller_state().await, FetchState::Success(seller_snapshot(3)));
        assert!(fetcher.take_toast().await.is_none());
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_snapshots() {
        let cache = Arc::new(InMemoryCache::new());
        let first = fetcher(Arc::clone(&cache));
        let second =
            AnalyticsFetcher::new(unreachable_client().with_token("jeton-b"), cache.clone(), Duration::from_secs(60));
        assert_ne!(first.key(SELLER_SCOPE), second.key(SELLER_SCOPE));

        cache::store(cache.as_ref(), &first.key(SELLER_SCOPE), &seller_snapshot(5), Duration::from_secs(60)).await;
        assert_eq!(second.refresh_seller(false).await, None);
        assert_eq!(first.refresh_seller(false).await, Some(seller_snapshot(5)));

        first.invalidate().await;
        assert!(cache::load::<SellerAnalytics>(cache.as_ref(), &first.key(SELLER_SCOPE)).await.is_none());
    }

    #[tokio::test]
    async fn test_network_failure_raises_toast() {
        let cache = Arc::new(InMemoryCache::new());
        let fetcher = AnalyticsFetcher::new(unreachable_client(), cache, Duration::from_secs(60));

        assert!(fetcher.refresh_seller(true).await.is_none());
        assert!(fetcher.seller_state().await.error().is_some());
        assert!(fetcher.take_toast().await.is_some());
        assert!(fetcher.take_toast().await.is_none());
    }
}
