//! Analytics payloads
//!
//! One explicit type per analytics endpoint, so dashboards never consume
//! loosely shaped JSON. Amounts are always strings on the wire, which also
//! keeps them decodable from the bincode analytics cache.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;

/// Sales aggregated over one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySales {
    pub day: NaiveDate,
    pub orders: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub revenue: Decimal,
}

/// Response of `GET /api/analytics/admin`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAnalytics {
    /// Keyed by role storage name (`BUYER`, ...).
    pub users_by_role: BTreeMap<String, i64>,
    /// Keyed by status storage name (`PENDING`, ...).
    pub articles_by_status: BTreeMap<String, i64>,
    pub total_orders: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub revenue: Decimal,
    /// Last 30 days, oldest first, days without sales omitted.
    pub sales_by_day: Vec<DailySales>,
}

/// Response of `GET /api/analytics/seller`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerAnalytics {
    pub articles_by_status: BTreeMap<String, i64>,
    pub total_views: i64,
    pub total_favorites: i64,
    pub sales: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub revenue: Decimal,
    pub followers: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bincode_round_trip_for_cache() {
        let mut analytics = SellerAnalytics {
            revenue: Decimal::new(4250, 2),
            sales: 2,
            ..Default::default()
        };
        analytics.articles_by_status.insert("APPROVED".to_string(), 3);

        let bytes = bincode::serialize(&analytics).unwrap();
        let decoded: SellerAnalytics = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, analytics);
    }

    #[test]
    fn test_revenue_is_a_json_string() {
        let json = serde_json::to_value(SellerAnalytics::default()).unwrap();
        assert_eq!(json["revenue"], "0");
    }
}
