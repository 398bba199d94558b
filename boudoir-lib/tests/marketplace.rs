//! End-to-end marketplace flows on an in-memory database.

use boudoir_lib::Marketplace;
use boudoir_lib::MarketplaceConfig;
use boudoir_lib::error::Error;
use boudoir_lib::model::ArticleInput;
use boudoir_lib::model::ArticleQuery;
use boudoir_lib::model::ArticleStatus;
use boudoir_lib::model::Category;
use boudoir_lib::model::Condition;
use boudoir_lib::model::NewUser;
use boudoir_lib::model::NotificationKind;
use boudoir_lib::model::Order;
use boudoir_lib::model::OrderStatus;
use boudoir_lib::model::Role;
use boudoir_lib::model::User;
use boudoir_lib::retry::RetryPolicy;
use boudoir_lib::store::Database;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

struct Fixture {
    market: Marketplace,
    admin: User,
    moderator: User,
    seller: User,
    buyer: User,
    category: Category,
}

async fn fixture() -> Fixture {
    let db = Database::open_in_memory().await.unwrap().with_retry(RetryPolicy::none());
    let market = Marketplace::new(db, MarketplaceConfig::default());

    let account = |email: &str, name: &str, role: Role| NewUser {
        email: email.to_string(),
        name: name.to_string(),
        password: "motdepasse".to_string(),
        role,
    };
    let admin = market.create_account(account("admin@boudoir.fr", "Admin", Role::Admin)).await.unwrap();
    let moderator = market.create_account(account("modo@boudoir.fr", "Modo", Role::Moderator)).await.unwrap();
    let seller = market.register(account("vendeuse@boudoir.fr", "Camille", Role::Seller)).await.unwrap();
    let buyer = market.register(account("acheteur@boudoir.fr", "Louis", Role::Buyer)).await.unwrap();
    let category = market.create_category(&admin, "Robes").await.unwrap();

    Fixture {
        market,
        admin,
        moderator,
        seller,
        buyer,
        category,
    }
}

fn input(category: &Category, title: &str, price: i64) -> ArticleInput {
    ArticleInput {
        title: title.to_string(),
        description: "Très joli vêtement, porté deux fois".to_string(),
        price: Decimal::new(price, 0),
        brand: Some("Sézane".to_string()),
        size: Some("S".to_string()),
        condition: Condition::VeryGood,
        category_id: category.id,
        images: vec!["https://img.boudoir.fr/1.jpg".to_string()],
    }
}

async fn approved_article(f: &Fixture, title: &str, price: i64) -> Uuid {
    let article = f.market.create_article(&f.seller, input(&f.category, title, price)).await.unwrap();
    f.market.approve(&f.moderator, article.id).await.unwrap();
    article.id
}

// =============================================================================
// Accounts
// =============================================================================

#[tokio::test]
async fn test_register_login_and_authenticate() {
    let f = fixture().await;

    let (session, user) = f.market.login("VENDEUSE@boudoir.fr", "motdepasse").await.unwrap();
    assert_eq!(user.id, f.seller.id);
    assert_eq!(f.market.authenticate(&session.token).await.unwrap().id, f.seller.id);

    f.market.logout(&session.token).await.unwrap();
    assert!(matches!(f.market.authenticate(&session.token).await, Err(Error::Unauthorized(_))));
}

#[tokio::test]
async fn test_login_rejects_bad_password() {
    let f = fixture().await;
    let result = f.market.login("acheteur@boudoir.fr", "mauvais-mdp").await;
    assert_eq!(result.map(|_| ()).unwrap_err().status_code(), 401);
}

#[tokio::test]
async fn test_duplicate_email_and_privileged_signup() {
    let f = fixture().await;
    let duplicate = NewUser {
        email: "acheteur@boudoir.fr".to_string(),
        name: "Autre".to_string(),
        password: "motdepasse".to_string(),
        role: Role::Buyer,
    };
    assert!(matches!(f.market.register(duplicate.clone()).await, Err(Error::Conflict(_))));

    let admin = NewUser {
        email: "pirate@boudoir.fr".to_string(),
        role: Role::Admin,
        ..duplicate
    };
    let err = f.market.register(admin).await.unwrap_err();
    assert_eq!(err.fields()[0].field, "role");
}

#[tokio::test]
async fn test_concurrent_signups_for_one_email() {
    let f = fixture().await;
    let signup = |name: &str| NewUser {
        email: "jumeaux@boudoir.fr".to_string(),
        name: name.to_string(),
        password: "motdepasse".to_string(),
        role: Role::Buyer,
    };

    let (first, second) = tokio::join!(f.market.register(signup("Léa")), f.market.register(signup("Léo")));
    let conflicts = [&first, &second]
        .iter()
        .filter(|r| matches!(r, Err(Error::Conflict(_))))
        .count();
    assert_eq!(conflicts, 1);
    assert!(first.is_ok() || second.is_ok());
}

// =============================================================================
// Listing visibility and moderation
// =============================================================================

#[tokio::test]
async fn test_pending_articles_are_hidden_from_public() {
    let f = fixture().await;
    let pending = f.market.create_article(&f.seller, input(&f.category, "Robe rouge", 30)).await.unwrap();
    assert_eq!(pending.status, ArticleStatus::Pending);

    let public = f.market.list_articles(ArticleQuery::new(), None).await.unwrap();
    assert_eq!(public.total_items, 0);
    assert!(f.market.get_article(pending.id, Some(&f.buyer)).await.is_err());

    let own = f
        .market
        .list_articles(ArticleQuery::new().with_seller(f.seller.id), Some(&f.seller))
        .await
        .unwrap();
    assert_eq!(own.total_items, 1);

    let queue = f.market.pending_articles(&f.moderator, 1, 10).await.unwrap();
    assert_eq!(queue.items[0].id, pending.id);
}

#[tokio::test]
async fn test_approve_notifies_and_counts_views() {
    let f = fixture().await;
    let id = approved_article(&f, "Robe bleue", 40).await;

    let article = f.market.get_article(id, None).await.unwrap();
    assert_eq!(article.status, ArticleStatus::Approved);
    assert_eq!(article.views, 1);

    let notifications = f.market.notifications(&f.seller).await.unwrap();
    assert_eq!(notifications[0].kind, NotificationKind::ArticleApproved);
    assert_eq!(f.market.unread_count(&f.seller).await.unwrap(), 1);
}

#[tokio::test]
async fn test_moderating_twice_conflicts() {
    let f = fixture().await;
    let id = approved_article(&f, "Jupe plissée", 25).await;
    assert!(matches!(f.market.approve(&f.moderator, id).await, Err(Error::Conflict(_))));
    assert!(matches!(f.market.reject(&f.moderator, id, "Photos floues").await, Err(Error::Conflict(_))));
}

#[tokio::test]
async fn test_reject_requires_reason_and_role() {
    let f = fixture().await;
    let article = f.market.create_article(&f.seller, input(&f.category, "Manteau", 90)).await.unwrap();

    let err = f.market.reject(&f.moderator, article.id, "   ").await.unwrap_err();
    assert_eq!(err.fields()[0].field, "reason");
    assert!(matches!(f.market.reject(&f.buyer, article.id, "Non").await, Err(Error::Forbidden(_))));

    let rejected = f.market.reject(&f.moderator, article.id, "Photos floues").await.unwrap();
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Photos floues"));
}

#[tokio::test]
async fn test_seller_edit_returns_to_moderation() {
    let f = fixture().await;
    let id = approved_article(&f, "Pull en laine", 35).await;

    let edited = f
        .market
        .update_article(&f.seller, id, input(&f.category, "Pull en laine mérinos", 38))
        .await
        .unwrap();
    assert_eq!(edited.status, ArticleStatus::Pending);
    assert!(matches!(
        f.market.update_article(&f.buyer, id, input(&f.category, "Volé", 1)).await,
        Err(Error::Forbidden(_))
    ));
}

// =============================================================================
// Social
// =============================================================================

#[tokio::test]
async fn test_follow_rules_and_feed() {
    let f = fixture().await;
    assert!(f.market.toggle_follow(&f.buyer, f.buyer.id).await.is_err());
    assert!(f.market.toggle_follow(&f.buyer, f.moderator.id).await.is_err());
    assert!(matches!(
        f.market.toggle_follow(&f.buyer, Uuid::new_v4()).await,
        Err(Error::NotFound { .. })
    ));

    assert!(f.market.toggle_follow(&f.buyer, f.seller.id).await.unwrap());
    let id = approved_article(&f, "Chemisier", 20).await;

    let feed = f.market.feed(&f.buyer, 1, 10).await.unwrap();
    assert_eq!(feed.items[0].id, id);
    let kinds: Vec<_> = f.market.notifications(&f.buyer).await.unwrap().into_iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NotificationKind::NewArticleFromFollowed]);

    assert!(!f.market.toggle_follow(&f.buyer, f.seller.id).await.unwrap());
    assert!(f.market.followed_sellers(&f.buyer).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_favorites_and_read_state() {
    let f = fixture().await;
    let id = approved_article(&f, "Sac à main", 55).await;

    assert!(f.market.toggle_favorite(&f.buyer, id).await.unwrap());
    assert_eq!(f.market.favorites(&f.buyer).await.unwrap()[0].id, id);
    assert!(!f.market.toggle_favorite(&f.buyer, id).await.unwrap());

    assert_eq!(f.market.mark_all_read(&f.seller).await.unwrap(), 1);
    assert_eq!(f.market.unread_count(&f.seller).await.unwrap(), 0);
    assert!(f.market.mark_read(&f.buyer, Uuid::new_v4()).await.is_err());
}

// =============================================================================
// Orders and analytics
// =============================================================================

#[tokio::test]
async fn test_article_sells_once() {
    let f = fixture().await;
    let id = approved_article(&f, "Trench beige", 120).await;

    assert!(matches!(f.market.purchase(&f.seller, id).await, Err(Error::Forbidden(_))));

    let order = f.market.purchase(&f.buyer, id).await.unwrap();
    assert_eq!(order.amount, Decimal::new(120, 0));
    assert!(matches!(f.market.purchase(&f.admin, id).await, Err(Error::Conflict(_))));

    assert_eq!(f.market.orders(&f.buyer).await.unwrap().len(), 1);
    let article = f.market.get_article(id, Some(&f.seller)).await.unwrap();
    assert_eq!(article.status, ArticleStatus::Sold);
}

#[tokio::test]
async fn test_sold_article_cannot_be_deleted() {
    let f = fixture().await;
    let id = approved_article(&f, "Manteau en laine", 150).await;
    f.market.purchase(&f.buyer, id).await.unwrap();

    let err = f.market.delete_article(&f.seller, id).await.unwrap_err();
    assert_eq!(err.status_code(), 409);
    assert!(matches!(f.market.delete_article(&f.admin, id).await, Err(Error::Conflict(_))));

    // The order pins its article at the storage level too
    let raw = f.market.db().articles().delete(id).await;
    assert!(raw.unwrap_err().is_constraint_violation());

    assert_eq!(f.market.orders(&f.buyer).await.unwrap().len(), 1);
    assert_eq!(f.market.admin_analytics(&f.admin).await.unwrap().total_orders, 1);
}

#[tokio::test]
async fn test_stale_edit_cannot_overwrite_a_sale() {
    let f = fixture().await;
    let id = approved_article(&f, "Blouse brodée", 45).await;
    let articles = f.market.db().articles();
    let mut stale = articles.find(id).await.unwrap().unwrap();

    let order = Order {
        id: Uuid::new_v4(),
        article_id: id,
        buyer_id: f.buyer.id,
        seller_id: f.seller.id,
        amount: stale.price,
        status: OrderStatus::Paid,
        created_at: Utc::now(),
    };
    assert!(f.market.db().orders().place(&order).await.unwrap());

    stale.title = "Blouse brodée main".to_string();
    stale.status = ArticleStatus::Pending;
    assert!(!articles.update(&stale, ArticleStatus::Approved).await.unwrap());

    let stored = articles.find(id).await.unwrap().unwrap();
    assert_eq!(stored.status, ArticleStatus::Sold);
    assert_eq!(stored.title, "Blouse brodée");
}

#[tokio::test]
async fn test_analytics_reflect_sales() {
    let f = fixture().await;
    let sold = approved_article(&f, "Robe de soirée", 80).await;
    approved_article(&f, "Robe d'été", 20).await;
    f.market.purchase(&f.buyer, sold).await.unwrap();

    let admin = f.market.admin_analytics(&f.admin).await.unwrap();
    assert_eq!(admin.total_orders, 1);
    assert_eq!(admin.revenue, Decimal::new(80, 0));
    assert_eq!(admin.articles_by_status["SOLD"], 1);
    assert_eq!(admin.users_by_role["BUYER"], 1);

    let seller = f.market.seller_analytics(&f.seller).await.unwrap();
    assert_eq!(seller.sales, 1);
    assert_eq!(seller.articles_by_status["APPROVED"], 1);

    assert!(matches!(f.market.admin_analytics(&f.buyer).await, Err(Error::Forbidden(_))));
}

#[tokio::test]
async fn test_admin_cannot_remove_themselves() {
    let f = fixture().await;
    assert!(matches!(f.market.delete_user(&f.admin, f.admin.id).await, Err(Error::Forbidden(_))));
    assert!(matches!(
        f.market.set_role(&f.admin, f.admin.id, Role::Buyer).await,
        Err(Error::Forbidden(_))
    ));
    let promoted = f.market.set_role(&f.admin, f.buyer.id, Role::Seller).await.unwrap();
    assert_eq!(promoted.role, Role::Seller);
}

#[tokio::test]
async fn test_normalize_images_repairs_legacy_rows() {
    let f = fixture().await;
    let id = approved_article(&f, "Veste en cuir", 150).await;

    let raw_id = id.to_string();
    f.market
        .db()
        .client()
        .conn(move |conn| {
            conn.execute(
                "UPDATE articles SET images = 'https://img.boudoir.fr/a.jpg, https://img.boudoir.fr/b.jpg' WHERE id = ?",
                [&raw_id],
            )
        })
        .await
        .unwrap();

    assert_eq!(f.market.db().articles().normalize_images().await.unwrap(), 1);
    assert_eq!(f.market.db().articles().normalize_images().await.unwrap(), 0);

    let article = f.market.get_article(id, None).await.unwrap();
    assert_eq!(article.images.len(), 2);
}
