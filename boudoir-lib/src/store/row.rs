//! Column codecs shared by the repositories.
//!
//! Ids are stored as hyphenated UUID text, timestamps as RFC 3339 text with
//! millisecond precision in UTC (so they sort lexically), and amounts as
//! decimal text.

use std::str::FromStr;

use async_sqlite::rusqlite;
use async_sqlite::rusqlite::Row;
use async_sqlite::rusqlite::types::Type;
use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

/// A stored enum value that matches no variant.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
struct UnknownVariant {
    kind: &'static str,
    value: String,
}

fn conversion_error(idx: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

pub(crate) fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn get_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn get_opt_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| Uuid::parse_str(&s).map_err(|e| conversion_error(idx, e))).transpose()
}

pub(crate) fn get_datetime(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

pub(crate) fn get_decimal(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

/// Reads a text column through an `Option`-returning parser such as
/// `ArticleStatus::parse`.
pub(crate) fn get_enum<T>(row: &Row<'_>, idx: usize, kind: &'static str, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| conversion_error(idx, UnknownVariant { kind, value: raw }))
}

/// `%term%` for a LIKE clause, with LIKE wildcards in `term` escaped by `\`.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_sort_lexically() {
        let a = DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z").unwrap().with_timezone(&Utc);
        let b = a + chrono::Duration::milliseconds(1);
        assert_eq!(ts(&a), "2024-01-02T03:04:05.000Z");
        assert!(ts(&a) < ts(&b));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("robe"), "%robe%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
