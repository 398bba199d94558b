//! Favorites, follows and notifications

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use super::Value;
use crate::table::TableRow;

/// Kind of a notification, used by the client to pick an icon and link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    ArticleApproved,
    ArticleRejected,
    NewFollower,
    NewArticleFromFollowed,
    ArticleSold,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ArticleApproved => "ARTICLE_APPROVED",
            NotificationKind::ArticleRejected => "ARTICLE_REJECTED",
            NotificationKind::NewFollower => "NEW_FOLLOWER",
            NotificationKind::NewArticleFromFollowed => "NEW_ARTICLE_FROM_FOLLOWED",
            NotificationKind::ArticleSold => "ARTICLE_SOLD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ARTICLE_APPROVED" => Some(NotificationKind::ArticleApproved),
            "ARTICLE_REJECTED" => Some(NotificationKind::ArticleRejected),
            "NEW_FOLLOWER" => Some(NotificationKind::NewFollower),
            "NEW_ARTICLE_FROM_FOLLOWED" => Some(NotificationKind::NewArticleFromFollowed),
            "ARTICLE_SOLD" => Some(NotificationKind::ArticleSold),
            _ => None,
        }
    }
}

/// A message delivered to a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub article_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl TableRow for Notification {
    fn field(&self, key: &str) -> Value {
        match key {
            "id" => self.id.into(),
            "kind" => self.kind.as_str().into(),
            "message" => self.message.as_str().into(),
            "read" => self.read.into(),
            "createdAt" => self.created_at.into(),
            _ => Value::Null,
        }
    }
}

/// A seller as shown in the "following" list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerSummary {
    pub id: Uuid,
    pub name: String,
    pub followed_at: DateTime<Utc>,
    pub approved_articles: i64,
}

/// Result of a favorite or follow toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResult {
    /// New state after the toggle.
    pub active: bool,
}
