//! Request routing for the `/api` surface.
//!
//! Paths are matched segment by segment; each arm authenticates the caller
//! as the endpoint requires, decodes its input and hands over to
//! [`Marketplace`]. Role checks live in the service layer.

use std::time::Instant;

use boudoir_lib::Marketplace;
use boudoir_lib::client::api::CategoryRequest;
use boudoir_lib::client::api::LoginRequest;
use boudoir_lib::client::api::LoginResponse;
use boudoir_lib::client::api::MarkAllReadResponse;
use boudoir_lib::client::api::RegisterRequest;
use boudoir_lib::client::api::RejectRequest;
use boudoir_lib::client::api::RoleRequest;
use boudoir_lib::client::api::UnreadCount;
use boudoir_lib::error::Error;
use boudoir_lib::model::ArticleInput;
use boudoir_lib::model::ArticleQuery;
use boudoir_lib::model::DEFAULT_PAGE_SIZE;
use boudoir_lib::model::NewUser;
use boudoir_lib::model::Role;
use boudoir_lib::model::ToggleResult;
use boudoir_lib::model::User;
use boudoir_lib::model::UserFilter;
use hyper::HeaderMap;
use hyper::Request;
use hyper::body::Incoming;

use crate::http;
use crate::http::ApiError;
use crate::http::HttpResponse;

/// Serves one request. Never fails: errors become JSON error responses.
pub async fn handle(market: Marketplace, req: Request<Incoming>) -> HttpResponse {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = match route(&market, req).await {
        Ok(response) => response,
        Err(e) => {
            log::debug!("{} {} failed: {}", method, path, e);
            http::error(&e)
        }
    };

    log::info!(
        "{} {} -> {} ({} ms)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

/// The caller, if a valid session is presented. Unknown or expired
/// sessions count as anonymous.
async fn viewer(market: &Marketplace, headers: &HeaderMap) -> Result<Option<User>, ApiError> {
    let Some(token) = http::session_token(headers) else {
        return Ok(None);
    };
    match market.authenticate(&token).await {
        Ok(user) => Ok(Some(user)),
        Err(Error::Unauthorized(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn require_user(market: &Marketplace, headers: &HeaderMap) -> Result<User, ApiError> {
    let token = http::session_token(headers).ok_or_else(|| Error::unauthorized("authentication required"))?;
    Ok(market.authenticate(&token).await?)
}

fn paging(pairs: &[(String, String)]) -> Result<(u32, u32), ApiError> {
    Ok((
        http::query_u32(pairs, "page", 1)?,
        http::query_u32(pairs, "pageSize", DEFAULT_PAGE_SIZE)?,
    ))
}

fn user_filter(pairs: &[(String, String)]) -> Result<UserFilter, ApiError> {
    let role = match http::query_value(pairs, "role") {
        None | Some("ALL") => None,
        Some(raw) => Some(Role::parse(raw).ok_or_else(|| Error::invalid("role", format!("unknown role '{}'", raw)))?),
    };
    Ok(UserFilter {
        search: http::query_value(pairs, "search").map(str::to_string),
        role,
    })
}

async fn route(market: &Marketplace, req: Request<Incoming>) -> Result<HttpResponse, ApiError> {
    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_string();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let headers = &parts.headers;

    match (parts.method.as_str(), segments.as_slice()) {
        ("GET", ["api", "health"]) => Ok(http::ok(&serde_json::json!({ "status": "ok" }))),

        // =====================================================================
        // Auth
        // =====================================================================
        ("POST", ["api", "auth", "register"]) => {
            let request: RegisterRequest = http::read_json(body).await?;
            let user = market
                .register(NewUser {
                    email: request.email,
                    name: request.name,
                    password: request.password,
                    role: request.role,
                })
                .await?;
            Ok(http::created(&user))
        }
        ("POST", ["api", "auth", "login"]) => {
            let request: LoginRequest = http::read_json(body).await?;
            let (session, user) = market.login(&request.email, &request.password).await?;
            let mut response = http::ok(&LoginResponse {
                token: session.token.clone(),
                expires_at: session.expires_at,
                user,
            });
            http::set_session_cookie(
                &mut response,
                Some(&session.token),
                market.config().session_ttl.num_seconds(),
            );
            Ok(response)
        }
        ("POST", ["api", "auth", "logout"]) => {
            if let Some(token) = http::session_token(headers) {
                market.logout(&token).await?;
            }
            let mut response = http::no_content();
            http::set_session_cookie(&mut response, None, 0);
            Ok(response)
        }
        ("GET", ["api", "auth", "me"]) => Ok(http::ok(&require_user(market, headers).await?)),

        // =====================================================================
        // Articles
        // =====================================================================
        ("GET", ["api", "articles"]) => {
            let query = ArticleQuery::from_query_pairs(http::query_pairs(&parts.uri))?;
            let viewer = viewer(market, headers).await?;
            Ok(http::ok(&market.list_articles(query, viewer.as_ref()).await?))
        }
        ("POST", ["api", "articles"]) => {
            let user = require_user(market, headers).await?;
            let input: ArticleInput = http::read_json(body).await?;
            Ok(http::created(&market.create_article(&user, input).await?))
        }
        ("GET", ["api", "articles", id]) => {
            let id = http::path_id(id)?;
            let viewer = viewer(market, headers).await?;
            Ok(http::ok(&market.get_article(id, viewer.as_ref()).await?))
        }
        ("PUT", ["api", "articles", id]) => {
            let id = http::path_id(id)?;
            let user = require_user(market, headers).await?;
            let input: ArticleInput = http::read_json(body).await?;
            Ok(http::ok(&market.update_article(&user, id, input).await?))
        }
        ("DELETE", ["api", "articles", id]) => {
            let id = http::path_id(id)?;
            let user = require_user(market, headers).await?;
            market.delete_article(&user, id).await?;
            Ok(http::no_content())
        }
        ("POST", ["api", "articles", id, "favorite"]) => {
            let id = http::path_id(id)?;
            let user = require_user(market, headers).await?;
            let active = market.toggle_favorite(&user, id).await?;
            Ok(http::ok(&ToggleResult { active }))
        }
        ("POST", ["api", "articles", id, "purchase"]) => {
            let id = http::path_id(id)?;
            let user = require_user(market, headers).await?;
            Ok(http::created(&market.purchase(&user, id).await?))
        }
        ("GET", ["api", "favorites"]) => {
            let user = require_user(market, headers).await?;
            Ok(http::ok(&market.favorites(&user).await?))
        }
        ("GET", ["api", "orders"]) => {
            let user = require_user(market, headers).await?;
            Ok(http::ok(&market.orders(&user).await?))
        }

        // =====================================================================
        // Categories & administration
        // =====================================================================
        ("GET", ["api", "categories"]) => Ok(http::ok(&market.categories().await?)),
        ("POST", ["api", "categories"]) => {
            let user = require_user(market, headers).await?;
            let request: CategoryRequest = http::read_json(body).await?;
            Ok(http::created(&market.create_category(&user, &request.name).await?))
        }
        ("GET", ["api", "admin", "users"]) => {
            let user = require_user(market, headers).await?;
            let filter = user_filter(&http::query_pairs(&parts.uri))?;
            Ok(http::ok(&market.list_users(&user, &filter).await?))
        }
        ("POST", ["api", "admin", "users"]) => {
            let user = require_user(market, headers).await?;
            let input: NewUser = http::read_json(body).await?;
            Ok(http::created(&market.create_user(&user, input).await?))
        }
        ("PUT", ["api", "admin", "users", id, "role"]) => {
            let id = http::path_id(id)?;
            let user = require_user(market, headers).await?;
            let request: RoleRequest = http::read_json(body).await?;
            Ok(http::ok(&market.set_role(&user, id, request.role).await?))
        }
        ("DELETE", ["api", "admin", "users", id]) => {
            let id = http::path_id(id)?;
            let user = require_user(market, headers).await?;
            market.delete_user(&user, id).await?;
            Ok(http::no_content())
        }

        // =====================================================================
        // Moderation
        // =====================================================================
        ("GET", ["api", "moderation", "articles"]) => {
            let user = require_user(market, headers).await?;
            let (page, page_size) = paging(&http::query_pairs(&parts.uri))?;
            Ok(http::ok(&market.pending_articles(&user, page, page_size).await?))
        }
        ("POST", ["api", "moderation", "articles", id, "approve"]) => {
            let id = http::path_id(id)?;
            let user = require_user(market, headers).await?;
            Ok(http::ok(&market.approve(&user, id).await?))
        }
        ("POST", ["api", "moderation", "articles", id, "reject"]) => {
            let id = http::path_id(id)?;
            let user = require_user(market, headers).await?;
            let request: RejectRequest = http::read_json(body).await?;
            Ok(http::ok(&market.reject(&user, id, &request.reason).await?))
        }

        // =====================================================================
        // Social
        // =====================================================================
        ("POST", ["api", "sellers", id, "follow"]) => {
            let id = http::path_id(id)?;
            let user = require_user(market, headers).await?;
            let active = market.toggle_follow(&user, id).await?;
            Ok(http::ok(&ToggleResult { active }))
        }
        ("GET", ["api", "following"]) => {
            let user = require_user(market, headers).await?;
            Ok(http::ok(&market.followed_sellers(&user).await?))
        }
        ("GET", ["api", "feed"]) => {
            let user = require_user(market, headers).await?;
            let (page, page_size) = paging(&http::query_pairs(&parts.uri))?;
            Ok(http::ok(&market.feed(&user, page, page_size).await?))
        }
        ("GET", ["api", "notifications"]) => {
            let user = require_user(market, headers).await?;
            Ok(http::ok(&market.notifications(&user).await?))
        }
        ("GET", ["api", "notifications", "unread-count"]) => {
            let user = require_user(market, headers).await?;
            let count = market.unread_count(&user).await?;
            Ok(http::ok(&UnreadCount { count }))
        }
        ("POST", ["api", "notifications", "read-all"]) => {
            let user = require_user(market, headers).await?;
            let updated = market.mark_all_read(&user).await?;
            Ok(http::ok(&MarkAllReadResponse { updated }))
        }
        ("POST", ["api", "notifications", id, "read"]) => {
            let id = http::path_id(id)?;
            let user = require_user(market, headers).await?;
            market.mark_read(&user, id).await?;
            Ok(http::no_content())
        }

        // =====================================================================
        // Analytics
        // =====================================================================
        ("GET", ["api", "analytics", "admin"]) => {
            let user = require_user(market, headers).await?;
            Ok(http::ok(&market.admin_analytics(&user).await?))
        }
        ("GET", ["api", "analytics", "seller"]) => {
            let user = require_user(market, headers).await?;
            Ok(http::ok(&market.seller_analytics(&user).await?))
        }

        _ => Err(ApiError::RouteNotFound {
            method: parts.method.to_string(),
            path: path.clone(),
        }),
    }
}
