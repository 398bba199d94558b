//! Typed HTTP client for the `/api` surface
//!
//! [`BoudoirClient`] wraps `reqwest` with one method per endpoint and
//! explicit request/response types from [`api`]. It is what the dashboards
//! (and the integration tests) talk to the server with.
//!
//! [`AnalyticsFetcher`] layers the TTL cache and last-request-wins
//! cancellation on top of the analytics endpoints.

pub mod api;
mod analytics;

pub use analytics::AnalyticsFetcher;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::RequestBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;
use uuid::Uuid;

use self::api::CategoryRequest;
use self::api::ErrorBody;
use self::api::LoginRequest;
use self::api::LoginResponse;
use self::api::MarkAllReadResponse;
use self::api::RegisterRequest;
use self::api::RejectRequest;
use self::api::RoleRequest;
use self::api::UnreadCount;
use crate::error::ClientError;
use crate::model::AdminAnalytics;
use crate::model::Article;
use crate::model::ArticleInput;
use crate::model::ArticleQuery;
use crate::model::Category;
use crate::model::NewUser;
use crate::model::Notification;
use crate::model::Order;
use crate::model::Paged;
use crate::model::Role;
use crate::model::SellerAnalytics;
use crate::model::SellerSummary;
use crate::model::ToggleResult;
use crate::model::User;
use crate::model::UserFilter;

/// Client for the marketplace API. Cheap to clone.
///
/// # Example
///
/// ```ignore
/// use boudoir_lib::client::BoudoirClient;
///
/// let anonymous = BoudoirClient::new("http://127.0.0.1:8080")?;
/// let login = anonymous.login("marie@example.fr", "motdepasse").await?;
/// let client = anonymous.with_token(login.token);
/// let me = client.me().await?;
/// ```
#[derive(Clone)]
pub struct BoudoirClient {
    inner: Arc<ClientInner>,
    token: Option<Arc<str>>,
}

struct ClientInner {
    base_url: Url,
    http: reqwest::Client,
    timeout: Option<Duration>,
}

impl BoudoirClient {
    /// Creates an anonymous client for the server at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_http(base_url, reqwest::Client::new(), Some(Duration::from_secs(30)))
    }

    /// Creates a client over a preconfigured `reqwest` client.
    pub fn with_http(base_url: &str, http: reqwest::Client, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            inner: Arc::new(ClientInner { base_url, http, timeout }),
            token: None,
        })
    }

    /// A copy of this client that authenticates with `token`.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            token: Some(Arc::from(token.into())),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut request = self.inner.http.request(method, url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }
        request
    }

    async fn execute(&self, request: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(error) => Err(ClientError::Http {
                status,
                message: error.error,
                fields: error.fields,
            }),
            Err(_) => Err(ClientError::http(status, body)),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.execute(self.request(Method::GET, self.url(path)?)).await?;
        Ok(response.json().await?)
    }

    async fn get_with_query<T: DeserializeOwned>(&self, path: &str, pairs: &[(&str, String)]) -> Result<T, ClientError> {
        let mut url = self.url(path)?;
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())));
        }
        let response = self.execute(self.request(Method::GET, url)).await?;
        Ok(response.json().await?)
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError> {
        let mut request = self.request(method, self.url(path)?);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = self.execute(request).await?;
        Ok(response.json().await?)
    }

    async fn send_empty(&self, method: Method, path: &str) -> Result<(), ClientError> {
        self.execute(self.request(method, self.url(path)?)).await?;
        Ok(())
    }

    // =========================================================================
    // Auth
    // =========================================================================

    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ClientError> {
        self.send_json(Method::POST, "api/auth/register", Some(request)).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.send_json(Method::POST, "api/auth/login", Some(&body)).await
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.send_empty(Method::POST, "api/auth/logout").await
    }

    pub async fn me(&self) -> Result<User, ClientError> {
        self.get("api/auth/me").await
    }

    // =========================================================================
    // Articles
    // =========================================================================

    pub async fn list_articles(&self, query: &ArticleQuery) -> Result<Paged<Article>, ClientError> {
        self.get_with_query("api/articles", &query.to_query_pairs()).await
    }

    pub async fn get_article(&self, id: Uuid) -> Result<Article, ClientError> {
        self.get(&format!("api/articles/{}", id)).await
    }

    pub async fn create_article(&self, input: &ArticleInput) -> Result<Article, ClientError> {
        self.send_json(Method::POST, "api/articles", Some(input)).await
    }

    pub async fn update_article(&self, id: Uuid, input: &ArticleInput) -> Result<Article, ClientError> {
        self.send_json(Method::PUT, &format!("api/articles/{}", id), Some(input)).await
    }

    pub async fn delete_article(&self, id: Uuid) -> Result<(), ClientError> {
        self.send_empty(Method::DELETE, &format!("api/articles/{}", id)).await
    }

    pub async fn toggle_favorite(&self, id: Uuid) -> Result<ToggleResult, ClientError> {
        self.send_json::<(), _>(Method::POST, &format!("api/articles/{}/favorite", id), None).await
    }

    pub async fn purchase(&self, id: Uuid) -> Result<Order, ClientError> {
        self.send_json::<(), _>(Method::POST, &format!("api/articles/{}/purchase", id), None).await
    }

    pub async fn favorites(&self) -> Result<Vec<Article>, ClientError> {
        self.get("api/favorites").await
    }

    pub async fn orders(&self) -> Result<Vec<Order>, ClientError> {
        self.get("api/orders").await
    }

    // =========================================================================
    // Categories & administration
    // =========================================================================

    pub async fn categories(&self) -> Result<Vec<Category>, ClientError> {
        self.get("api/categories").await
    }

    pub async fn create_category(&self, name: &str) -> Result<Category, ClientError> {
        let body = CategoryRequest { name: name.to_string() };
        self.send_json(Method::POST, "api/categories", Some(&body)).await
    }

    pub async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, ClientError> {
        let mut pairs = Vec::new();
        if let Some(search) = &filter.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(role) = filter.role {
            pairs.push(("role", role.as_str().to_string()));
        }
        self.get_with_query("api/admin/users", &pairs).await
    }

    pub async fn create_user(&self, input: &NewUser) -> Result<User, ClientError> {
        self.send_json(Method::POST, "api/admin/users", Some(input)).await
    }

    pub async fn set_role(&self, id: Uuid, role: Role) -> Result<User, ClientError> {
        let body = RoleRequest { role };
        self.send_json(Method::PUT, &format!("api/admin/users/{}/role", id), Some(&body)).await
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<(), ClientError> {
        self.send_empty(Method::DELETE, &format!("api/admin/users/{}", id)).await
    }

    // =========================================================================
    // Moderation
    // =========================================================================

    pub async fn pending_articles(&self, page: u32, page_size: u32) -> Result<Paged<Article>, ClientError> {
        let pairs = [("page", page.to_string()), ("pageSize", page_size.to_string())];
        self.get_with_query("api/moderation/articles", &pairs).await
    }

    pub async fn approve(&self, id: Uuid) -> Result<Article, ClientError> {
        self.send_json::<(), _>(Method::POST, &format!("api/moderation/articles/{}/approve", id), None)
            .await
    }

    pub async fn reject(&self, id: Uuid, reason: &str) -> Result<Article, ClientError> {
        let body = RejectRequest {
            reason: reason.to_string(),
        };
        self.send_json(Method::POST, &format!("api/moderation/articles/{}/reject", id), Some(&body))
            .await
    }

    // =========================================================================
    // Social
    // =========================================================================

    pub async fn toggle_follow(&self, seller_id: Uuid) -> Result<ToggleResult, ClientError> {
        self.send_json::<(), _>(Method::POST, &format!("api/sellers/{}/follow", seller_id), None)
            .await
    }

    pub async fn following(&self) -> Result<Vec<SellerSummary>, ClientError> {
        self.get("api/following").await
    }

    pub async fn feed(&self, page: u32, page_size: u32) -> Result<Paged<Article>, ClientError> {
        let pairs = [("page", page.to_string()), ("pageSize", page_size.to_string())];
        self.get_with_query("api/feed", &pairs).await
    }

    pub async fn notifications(&self) -> Result<Vec<Notification>, ClientError> {
        self.get("api/notifications").await
    }

    pub async fn unread_count(&self) -> Result<UnreadCount, ClientError> {
        self.get("api/notifications/unread-count").await
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<(), ClientError> {
        self.send_empty(Method::POST, &format!("api/notifications/{}/read", id)).await
    }

    pub async fn mark_all_read(&self) -> Result<MarkAllReadResponse, ClientError> {
        self.send_json::<(), _>(Method::POST, "api/notifications/read-all", None).await
    }

    // =========================================================================
    // Analytics
    // =========================================================================

    pub async fn admin_analytics(&self) -> Result<AdminAnalytics, ClientError> {
        self.get("api/analytics/admin").await
    }

    pub async fn seller_analytics(&self) -> Result<SellerAnalytics, ClientError> {
        self.get("api/analytics/seller").await
    }
}

impl std::fmt::Debug for BoudoirClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoudoirClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = BoudoirClient::new("http://localhost:8080/boudoir").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8080/boudoir/");
        assert_eq!(
            client.url("/api/articles").unwrap().as_str(),
            "http://localhost:8080/boudoir/api/articles"
        );
    }

    #[test]
    fn test_with_token_keeps_connection_settings() {
        let anonymous = BoudoirClient::new("http://localhost:8080").unwrap();
        let client = anonymous.with_token("abc");
        assert_eq!(client.token(), Some("abc"));
        assert!(anonymous.token().is_none());
        assert!(Arc::ptr_eq(&client.inner, &anonymous.inner));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(BoudoirClient::new("not a url"), Err(ClientError::InvalidUrl(_))));
    }
}
