//! Articles (listings) and their query types

use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use super::Value;
use crate::error::FieldValidationError;
use crate::table::TableRow;

/// Moderation lifecycle of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArticleStatus {
    /// Awaiting moderation; not publicly visible.
    Pending,
    /// Publicly visible and purchasable.
    Approved,
    /// Refused by a moderator, with a reason.
    Rejected,
    /// Purchased; no longer purchasable.
    Sold,
}

impl ArticleStatus {
    pub const ALL: [ArticleStatus; 4] = [
        ArticleStatus::Pending,
        ArticleStatus::Approved,
        ArticleStatus::Rejected,
        ArticleStatus::Sold,
    ];

    /// Convert to string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Pending => "PENDING",
            ArticleStatus::Approved => "APPROVED",
            ArticleStatus::Rejected => "REJECTED",
            ArticleStatus::Sold => "SOLD",
        }
    }

    /// Parse from database string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(ArticleStatus::Pending),
            "APPROVED" => Some(ArticleStatus::Approved),
            "REJECTED" => Some(ArticleStatus::Rejected),
            "SOLD" => Some(ArticleStatus::Sold),
            _ => None,
        }
    }
}

/// Wear condition of a garment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    New,
    VeryGood,
    Good,
    Fair,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::New => "NEW",
            Condition::VeryGood => "VERY_GOOD",
            Condition::Good => "GOOD",
            Condition::Fair => "FAIR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NEW" => Some(Condition::New),
            "VERY_GOOD" => Some(Condition::VeryGood),
            "GOOD" => Some(Condition::Good),
            "FAIR" => Some(Condition::Fair),
            _ => None,
        }
    }
}

/// A clothing item listed for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub brand: Option<String>,
    pub size: Option<String>,
    pub condition: Condition,
    pub category_id: Uuid,
    pub seller_id: Uuid,
    /// Image URLs. Stored as a JSON-encoded array, see [`crate::images`].
    #[serde(default)]
    pub images: Vec<String>,
    pub status: ArticleStatus,
    pub rejection_reason: Option<String>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TableRow for Article {
    fn field(&self, key: &str) -> Value {
        match key {
            "id" => self.id.into(),
            "title" => self.title.as_str().into(),
            "description" => self.description.as_str().into(),
            "price" => self.price.into(),
            "brand" => self.brand.clone().into(),
            "size" => self.size.clone().into(),
            "condition" => self.condition.as_str().into(),
            "categoryId" => self.category_id.into(),
            "sellerId" => self.seller_id.into(),
            "status" => self.status.as_str().into(),
            "rejectionReason" => self.rejection_reason.clone().into(),
            "views" => self.views.into(),
            "createdAt" => self.created_at.into(),
            "updatedAt" => self.updated_at.into(),
            _ => Value::Null,
        }
    }
}

/// Fields a seller submits when creating or editing an article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleInput {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    pub condition: Condition,
    pub category_id: Uuid,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Sort orders offered by the listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleSort {
    #[default]
    Newest,
    /// Moderation queue order.
    Oldest,
    PriceAsc,
    PriceDesc,
    Popular,
}

impl ArticleSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleSort::Newest => "newest",
            ArticleSort::Oldest => "oldest",
            ArticleSort::PriceAsc => "price_asc",
            ArticleSort::PriceDesc => "price_desc",
            ArticleSort::Popular => "popular",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "newest" => Some(ArticleSort::Newest),
            "oldest" => Some(ArticleSort::Oldest),
            "price_asc" => Some(ArticleSort::PriceAsc),
            "price_desc" => Some(ArticleSort::PriceDesc),
            "popular" => Some(ArticleSort::Popular),
            _ => None,
        }
    }

    pub(crate) fn order_clause(&self) -> &'static str {
        match self {
            ArticleSort::Newest => "a.created_at DESC",
            ArticleSort::Oldest => "a.created_at ASC",
            ArticleSort::PriceAsc => "CAST(a.price AS REAL) ASC, a.created_at DESC",
            ArticleSort::PriceDesc => "CAST(a.price AS REAL) DESC, a.created_at DESC",
            ArticleSort::Popular => "a.views DESC, a.created_at DESC",
        }
    }
}

/// Maximum page size the listing endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default page size of the listing endpoint.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Server-side article search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleQuery {
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    /// Restricts to these statuses; empty means any status.
    pub statuses: Vec<ArticleStatus>,
    pub size: Option<String>,
    pub condition: Option<Condition>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: ArticleSort,
    pub page: u32,
    pub page_size: u32,
}

impl Default for ArticleQuery {
    fn default() -> Self {
        Self {
            search: None,
            category_id: None,
            seller_id: None,
            statuses: Vec::new(),
            size: None,
            condition: None,
            min_price: None,
            max_price: None,
            sort: ArticleSort::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ArticleQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: ArticleStatus) -> Self {
        self.statuses = vec![status];
        self
    }

    pub fn with_seller(mut self, seller_id: Uuid) -> Self {
        self.seller_id = Some(seller_id);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_sort(mut self, sort: ArticleSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    /// Page clamped to at least 1 and page size clamped into `1..=MAX_PAGE_SIZE`.
    pub fn normalized_paging(&self) -> (u32, u32) {
        (self.page.max(1), self.page_size.clamp(1, MAX_PAGE_SIZE))
    }

    /// URL query parameters, as accepted by `GET /api/articles`. Unset
    /// fields are omitted.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(id) = self.category_id {
            pairs.push(("categoryId", id.to_string()));
        }
        if let Some(id) = self.seller_id {
            pairs.push(("sellerId", id.to_string()));
        }
        if !self.statuses.is_empty() {
            let statuses: Vec<&str> = self.statuses.iter().map(|s| s.as_str()).collect();
            pairs.push(("status", statuses.join(",")));
        }
        if let Some(size) = &self.size {
            pairs.push(("size", size.clone()));
        }
        if let Some(condition) = self.condition {
            pairs.push(("condition", condition.as_str().to_string()));
        }
        if let Some(min) = self.min_price {
            pairs.push(("minPrice", min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("maxPrice", max.to_string()));
        }
        pairs.push(("sort", self.sort.as_str().to_string()));
        pairs.push(("page", self.page.to_string()));
        pairs.push(("pageSize", self.page_size.to_string()));
        pairs
    }

    /// Parses URL query parameters. Unknown keys and empty values are
    /// ignored; the `ALL` sentinel means no constraint. Every malformed
    /// value is reported.
    pub fn from_query_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self, Vec<FieldValidationError>>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = Self::default();
        let mut errors = Vec::new();

        fn parse<T>(errors: &mut Vec<FieldValidationError>, key: &str, value: &str, parsed: Option<T>) -> Option<T> {
            if parsed.is_none() {
                errors.push(FieldValidationError::new(key, format!("invalid value '{}'", value)));
            }
            parsed
        }

        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref().trim());
            if value.is_empty() || value == crate::table::ALL {
                continue;
            }
            match key {
                "search" => query.search = Some(value.to_string()),
                "categoryId" => query.category_id = parse(&mut errors, key, value, Uuid::parse_str(value).ok()),
                "sellerId" => query.seller_id = parse(&mut errors, key, value, Uuid::parse_str(value).ok()),
                "status" => {
                    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                        if let Some(status) = parse(&mut errors, key, part, ArticleStatus::parse(part)) {
                            query.statuses.push(status);
                        }
                    }
                }
                "size" => query.size = Some(value.to_string()),
                "condition" => query.condition = parse(&mut errors, key, value, Condition::parse(value)),
                "minPrice" => query.min_price = parse(&mut errors, key, value, Decimal::from_str(value).ok()),
                "maxPrice" => query.max_price = parse(&mut errors, key, value, Decimal::from_str(value).ok()),
                "sort" => {
                    if let Some(sort) = parse(&mut errors, key, value, ArticleSort::parse(value)) {
                        query.sort = sort;
                    }
                }
                "page" => {
                    if let Some(page) = parse(&mut errors, key, value, value.parse().ok()) {
                        query.page = page;
                    }
                }
                "pageSize" => {
                    if let Some(size) = parse(&mut errors, key, value, value.parse().ok()) {
                        query.page_size = size;
                    }
                }
                _ => {}
            }
        }

        if errors.is_empty() { Ok(query) } else { Err(errors) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in ArticleStatus::ALL {
            assert_eq!(ArticleStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_paging_is_clamped() {
        let query = ArticleQuery::new().with_page(0, 500);
        assert_eq!(query.normalized_paging(), (1, MAX_PAGE_SIZE));

        let query = ArticleQuery::new().with_page(3, 0);
        assert_eq!(query.normalized_paging(), (3, 1));
    }

    #[test]
    fn test_query_pairs_round_trip() {
        let query = ArticleQuery {
            search: Some("robe".to_string()),
            statuses: vec![ArticleStatus::Pending, ArticleStatus::Rejected],
            min_price: Some(Decimal::new(1000, 2)),
            sort: ArticleSort::PriceDesc,
            page: 2,
            ..Default::default()
        };
        let pairs = query.to_query_pairs();
        assert_eq!(ArticleQuery::from_query_pairs(pairs).unwrap(), query);
    }

    #[test]
    fn test_query_pairs_report_every_bad_value() {
        let pairs = [
            ("status", "PENDING,LOST"),
            ("page", "x"),
            ("condition", "ALL"),
            ("unknown", "1"),
            ("search", ""),
        ];
        let errors = ArticleQuery::from_query_pairs(pairs).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["status", "page"]);
    }

    #[test]
    fn test_input_images_default_to_empty() {
        let json = r#"{
            "title": "Pull",
            "description": "Pull en laine",
            "price": "20.00",
            "condition": "GOOD",
            "categoryId": "12345678-1234-1234-1234-123456789012"
        }"#;
        let input: ArticleInput = serde_json::from_str(json).unwrap();
        assert!(input.images.is_empty());
    }
}
