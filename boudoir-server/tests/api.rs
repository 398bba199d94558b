//! The HTTP API driven through `BoudoirClient`, on an ephemeral port and
//! an in-memory database.

use std::net::SocketAddr;

use boudoir_lib::BoudoirClient;
use boudoir_lib::Marketplace;
use boudoir_lib::MarketplaceConfig;
use boudoir_lib::client::api::RegisterRequest;
use boudoir_lib::error::ClientError;
use boudoir_lib::model::ArticleInput;
use boudoir_lib::model::ArticleQuery;
use boudoir_lib::model::ArticleStatus;
use boudoir_lib::model::Condition;
use boudoir_lib::model::NewUser;
use boudoir_lib::model::Role;
use boudoir_lib::retry::RetryPolicy;
use boudoir_lib::store::Database;
use boudoir_server::Server;
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const PASSWORD: &str = "motdepasse";

struct TestServer {
    market: Marketplace,
    base_url: String,
    shutdown: CancellationToken,
}

impl TestServer {
    async fn start() -> Self {
        let db = Database::open_in_memory().await.unwrap().with_retry(RetryPolicy::none());
        let market = Marketplace::new(db, MarketplaceConfig::default());
        let server = Server::bind(SocketAddr::from(([127, 0, 0, 1], 0)), market.clone())
            .await
            .unwrap();
        let base_url = format!("http://{}", server.local_addr().unwrap());
        let shutdown = CancellationToken::new();
        tokio::spawn(server.run(shutdown.clone()));
        Self {
            market,
            base_url,
            shutdown,
        }
    }

    fn anonymous(&self) -> BoudoirClient {
        BoudoirClient::new(&self.base_url).unwrap()
    }

    /// Creates an account directly and returns a client logged in as it.
    async fn login_as(&self, email: &str, role: Role) -> BoudoirClient {
        self.market
            .create_account(NewUser {
                email: email.to_string(),
                name: email.split('@').next().unwrap_or("user").to_string(),
                password: PASSWORD.to_string(),
                role,
            })
            .await
            .unwrap();
        let anonymous = self.anonymous();
        let login = anonymous.login(email, PASSWORD).await.unwrap();
        anonymous.with_token(login.token)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn article(category_id: Uuid, title: &str) -> ArticleInput {
    ArticleInput {
        title: title.to_string(),
        description: "Pièce vintage en excellent état".to_string(),
        price: Decimal::new(3990, 2),
        brand: None,
        size: Some("M".to_string()),
        condition: Condition::Good,
        category_id,
        images: vec!["https://img.boudoir.fr/robe.jpg".to_string()],
    }
}

#[tokio::test]
async fn test_register_login_me_logout() {
    let server = TestServer::start().await;
    let anonymous = server.anonymous();

    let user = anonymous
        .register(&RegisterRequest {
            email: "lea@boudoir.fr".to_string(),
            name: "Léa".to_string(),
            password: PASSWORD.to_string(),
            role: Role::Buyer,
        })
        .await
        .unwrap();
    assert_eq!(user.role, Role::Buyer);

    let login = anonymous.login("lea@boudoir.fr", PASSWORD).await.unwrap();
    let client = anonymous.with_token(login.token);
    assert_eq!(client.me().await.unwrap().id, user.id);

    client.logout().await.unwrap();
    assert_eq!(client.me().await.unwrap_err().status_code(), Some(401));
}

#[tokio::test]
async fn test_validation_errors_carry_fields() {
    let server = TestServer::start().await;
    let seller = server.login_as("vendeur@boudoir.fr", Role::Seller).await;

    let mut input = article(Uuid::new_v4(), "Ro");
    input.price = Decimal::ZERO;
    let err = seller.create_article(&input).await.unwrap_err();

    assert_eq!(err.status_code(), Some(400));
    let fields: Vec<&str> = err.fields().iter().map(|f| f.field.as_str()).collect();
    assert!(fields.contains(&"title"));
    assert!(fields.contains(&"price"));
}

#[tokio::test]
async fn test_marketplace_flow() {
    let server = TestServer::start().await;
    let admin = server.login_as("admin@boudoir.fr", Role::Admin).await;
    let moderator = server.login_as("modo@boudoir.fr", Role::Moderator).await;
    let seller = server.login_as("vendeuse@boudoir.fr", Role::Seller).await;
    let buyer = server.login_as("acheteuse@boudoir.fr", Role::Buyer).await;
    let anonymous = server.anonymous();

    let category = admin.create_category("Robes").await.unwrap();
    assert_eq!(anonymous.categories().await.unwrap(), vec![category.clone()]);

    let created = seller.create_article(&article(category.id, "Robe fleurie")).await.unwrap();
    assert_eq!(created.status, ArticleStatus::Pending);
    assert_eq!(anonymous.list_articles(&ArticleQuery::new()).await.unwrap().total_items, 0);

    let pending = moderator.pending_articles(1, 10).await.unwrap();
    assert_eq!(pending.items[0].id, created.id);
    moderator.approve(created.id).await.unwrap();

    let listed = anonymous.list_articles(&ArticleQuery::new().with_search("fleurie")).await.unwrap();
    assert_eq!(listed.items[0].images, vec!["https://img.boudoir.fr/robe.jpg".to_string()]);

    assert!(buyer.toggle_favorite(created.id).await.unwrap().active);
    assert_eq!(buyer.favorites().await.unwrap().len(), 1);

    let order = buyer.purchase(created.id).await.unwrap();
    assert_eq!(order.amount, Decimal::new(3990, 2));
    let again = buyer.purchase(created.id).await.unwrap_err();
    assert_eq!(again.status_code(), Some(409));
    assert_eq!(buyer.orders().await.unwrap().len(), 1);

    // ArticleApproved and ArticleSold
    assert_eq!(seller.unread_count().await.unwrap().count, 2);
    assert_eq!(seller.mark_all_read().await.unwrap().updated, 2);

    let analytics = admin.admin_analytics().await.unwrap();
    assert_eq!(analytics.total_orders, 1);
    assert_eq!(analytics.revenue, Decimal::new(3990, 2));
    assert_eq!(seller.seller_analytics().await.unwrap().sales, 1);
    assert_eq!(buyer.admin_analytics().await.unwrap_err().status_code(), Some(403));
}

#[tokio::test]
async fn test_follow_and_feed() {
    let server = TestServer::start().await;
    let moderator = server.login_as("modo@boudoir.fr", Role::Moderator).await;
    let seller = server.login_as("vendeuse@boudoir.fr", Role::Seller).await;
    let buyer = server.login_as("acheteuse@boudoir.fr", Role::Buyer).await;
    let admin = server.login_as("admin@boudoir.fr", Role::Admin).await;
    let category = admin.create_category("Vestes").await.unwrap();

    let seller_id = seller.me().await.unwrap().id;
    assert!(buyer.toggle_follow(seller_id).await.unwrap().active);
    assert_eq!(buyer.following().await.unwrap()[0].id, seller_id);

    let buyer_id = buyer.me().await.unwrap().id;
    let err = buyer.toggle_follow(buyer_id).await.unwrap_err();
    assert_eq!(err.status_code(), Some(400));

    let created = seller.create_article(&article(category.id, "Veste en velours")).await.unwrap();
    moderator.approve(created.id).await.unwrap();
    assert_eq!(buyer.feed(1, 10).await.unwrap().items[0].id, created.id);

    let notification = buyer.notifications().await.unwrap().remove(0);
    buyer.mark_read(notification.id).await.unwrap();
    assert_eq!(buyer.unread_count().await.unwrap().count, 0);
}

#[tokio::test]
async fn test_admin_user_management() {
    let server = TestServer::start().await;
    let admin = server.login_as("admin@boudoir.fr", Role::Admin).await;

    let created = admin
        .create_user(&NewUser {
            email: "nouveau@boudoir.fr".to_string(),
            name: "Nouveau".to_string(),
            password: PASSWORD.to_string(),
            role: Role::Buyer,
        })
        .await
        .unwrap();
    let promoted = admin.set_role(created.id, Role::Moderator).await.unwrap();
    assert_eq!(promoted.role, Role::Moderator);

    let filter = boudoir_lib::model::UserFilter {
        search: None,
        role: Some(Role::Moderator),
    };
    assert_eq!(admin.list_users(&filter).await.unwrap().len(), 1);

    admin.delete_user(created.id).await.unwrap();
    let err = admin.delete_user(created.id).await.unwrap_err();
    assert_eq!(err.status_code(), Some(404));
}

#[tokio::test]
async fn test_cookie_session_and_unknown_route() {
    let server = TestServer::start().await;
    let client = server.login_as("cookie@boudoir.fr", Role::Buyer).await;
    let token = client.token().unwrap().to_string();

    let http = reqwest::Client::new();
    let me = http
        .get(format!("{}/api/auth/me", server.base_url))
        .header("Cookie", format!("session={}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(me.status().as_u16(), 200);

    let missing = http.get(format!("{}/api/nope", server.base_url)).send().await.unwrap();
    assert_eq!(missing.status().as_u16(), 404);
    let body: serde_json::Value = missing.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("/api/nope"));

    let bad = http
        .post(format!("{}/api/auth/login", server.base_url))
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status().as_u16(), 400);
}

#[tokio::test]
async fn test_network_errors_are_not_http_errors() {
    let client = BoudoirClient::new("http://127.0.0.1:9").unwrap();
    let err = client.categories().await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)));
}
