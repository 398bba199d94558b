//! Filter state and predicates.

use std::collections::BTreeMap;

use chrono::DateTime;
use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;

use crate::model::Value;

/// Sentinel meaning "no constraint" for select filters.
pub const ALL: &str = "ALL";

/// Suffix of the lower bound key of a decomposed range filter.
pub const FROM_SUFFIX: &str = "From";

/// Suffix of the upper bound key of a decomposed range filter.
pub const TO_SUFFIX: &str = "To";

/// A single filter value as held in the controlled value map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Number(f64),
    Text(String),
}

impl FilterValue {
    /// Returns `true` unless this is the `ALL` sentinel or an empty string.
    pub fn is_active(&self) -> bool {
        match self {
            FilterValue::Number(n) => !n.is_nan(),
            FilterValue::Text(s) => {
                let s = s.trim();
                !s.is_empty() && s != ALL
            }
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            FilterValue::Number(n) => Some(*n),
            FilterValue::Text(s) => s.trim().parse().ok(),
        }
    }

    fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FilterValue::Number(_) => None,
            FilterValue::Text(s) => parse_date(s.trim()),
        }
    }
}

impl std::fmt::Display for FilterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterValue::Number(n) => write!(f, "{}", n),
            FilterValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Text(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::Text(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        FilterValue::Number(v)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::Number(v as f64)
    }
}

/// The kind of control a filter renders and the predicate it applies.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterKind {
    /// Case-insensitive substring match.
    Text,
    /// Case-insensitive equality against one of the options; `ALL` disables it.
    Select { options: Vec<(String, String)> },
    /// Exact numeric match.
    Number,
    /// Inclusive numeric range stored under `{key}From` / `{key}To`.
    NumberRange,
    /// Inclusive date range stored under `{key}From` / `{key}To`.
    DateRange,
}

impl FilterKind {
    fn is_range(&self) -> bool {
        matches!(self, FilterKind::NumberRange | FilterKind::DateRange)
    }
}

/// Declares a filter control bound to a row field.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDescriptor {
    pub key: String,
    pub label: String,
    pub kind: FilterKind,
    /// Row field the predicate reads; defaults to `key`.
    pub field: String,
}

impl FilterDescriptor {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FilterKind) -> Self {
        let key = key.into();
        Self {
            field: key.clone(),
            key,
            label: label.into(),
            kind,
        }
    }

    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FilterKind::Text)
    }

    pub fn select(
        key: impl Into<String>,
        label: impl Into<String>,
        options: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self::new(
            key,
            label,
            FilterKind::Select {
                options: options.into_iter().collect(),
            },
        )
    }

    pub fn number(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FilterKind::Number)
    }

    pub fn number_range(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FilterKind::NumberRange)
    }

    pub fn date_range(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FilterKind::DateRange)
    }

    /// Reads the predicate input from a different row field.
    pub fn on_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    fn from_key(&self) -> String {
        format!("{}{}", self.key, FROM_SUFFIX)
    }

    fn to_key(&self) -> String {
        format!("{}{}", self.key, TO_SUFFIX)
    }

    /// Tests a row value against the current filter values.
    pub fn matches(&self, values: &FilterValues, cell: &Value) -> bool {
        match &self.kind {
            FilterKind::Text => match values.active(&self.key) {
                Some(needle) => cell
                    .to_display_string()
                    .to_lowercase()
                    .contains(&needle.to_string().trim().to_lowercase()),
                None => true,
            },
            FilterKind::Select { .. } => match values.active(&self.key) {
                Some(wanted) => cell
                    .to_display_string()
                    .eq_ignore_ascii_case(wanted.to_string().trim()),
                None => true,
            },
            FilterKind::Number => match values.active(&self.key) {
                Some(wanted) => match (wanted.as_number(), cell.as_f64()) {
                    (Some(w), Some(c)) => w == c,
                    _ => false,
                },
                None => true,
            },
            FilterKind::NumberRange => {
                let from = values.active(&self.from_key()).and_then(FilterValue::as_number);
                let to = values.active(&self.to_key()).and_then(FilterValue::as_number);
                in_bounds(cell.as_f64(), from, to)
            }
            FilterKind::DateRange => {
                let from = values.active(&self.from_key()).and_then(FilterValue::as_date);
                let to = values.active(&self.to_key()).and_then(FilterValue::as_date);
                in_bounds(cell_date(cell), from, to)
            }
        }
    }
}

/// Inclusive bounds check. A missing cell value fails any active bound.
fn in_bounds<T: PartialOrd>(cell: Option<T>, from: Option<T>, to: Option<T>) -> bool {
    if from.is_none() && to.is_none() {
        return true;
    }
    let Some(cell) = cell else {
        return false;
    };
    from.is_none_or(|f| cell >= f) && to.is_none_or(|t| cell <= t)
}

fn cell_date(cell: &Value) -> Option<NaiveDate> {
    match cell {
        Value::DateTime(dt) => Some(dt.date_naive()),
        Value::String(s) => parse_date(s),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

/// A removable chip summarising one active filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChip {
    /// Key to pass to [`FilterValues::clear`].
    pub key: String,
    pub label: String,
    pub display: String,
}

/// Controlled map of filter key to value.
///
/// # Example
///
/// ```
/// use boudoir_lib::table::FilterValues;
///
/// let mut values = FilterValues::new();
/// values.set("status", "ALL");
/// values.set("search", "robe");
/// values.set("createdFrom", "2024-01-01");
/// assert_eq!(values.active_count(), 2);
///
/// values.clear("created");
/// assert_eq!(values.active_count(), 1);
/// assert_eq!(values.to_query_string(), "search=robe");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterValues {
    values: BTreeMap<String, FilterValue>,
}

impl FilterValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.values.get(key)
    }

    /// Returns the value only if it constrains anything.
    pub fn active(&self, key: &str) -> Option<&FilterValue> {
        self.values.get(key).filter(|v| v.is_active())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Replaces the whole map (controlled component pattern).
    pub fn replace(&mut self, values: FilterValues) {
        *self = values;
    }

    /// Removes `key` together with its `From`/`To` siblings.
    pub fn clear(&mut self, key: &str) {
        self.values.remove(key);
        self.values.remove(&format!("{}{}", key, FROM_SUFFIX));
        self.values.remove(&format!("{}{}", key, TO_SUFFIX));
    }

    pub fn clear_all(&mut self) {
        self.values.clear();
    }

    /// Number of keys holding a constraining value.
    pub fn active_count(&self) -> usize {
        self.values.values().filter(|v| v.is_active()).count()
    }

    /// Active entries in key order.
    pub fn iter_active(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.values
            .iter()
            .filter(|(_, v)| v.is_active())
            .map(|(k, v)| (k.as_str(), v))
    }

    /// URL-encoded `key=value` pairs of the active entries, in key order.
    pub fn to_query_string(&self) -> String {
        self.iter_active()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    urlencoding::encode(k),
                    urlencoding::encode(v.to_string().trim())
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// One chip per active descriptor, range pairs merged.
    pub fn chips(&self, descriptors: &[FilterDescriptor]) -> Vec<FilterChip> {
        let mut chips = Vec::new();
        for descriptor in descriptors {
            let display = if descriptor.kind.is_range() {
                let from = self.active(&descriptor.from_key());
                let to = self.active(&descriptor.to_key());
                match (from, to) {
                    (None, None) => continue,
                    (Some(f), None) => format!("≥ {}", f),
                    (None, Some(t)) => format!("≤ {}", t),
                    (Some(f), Some(t)) => format!("{} – {}", f, t),
                }
            } else {
                let Some(value) = self.active(&descriptor.key) else {
                    continue;
                };
                match &descriptor.kind {
                    FilterKind::Select { options } => options
                        .iter()
                        .find(|(v, _)| v.eq_ignore_ascii_case(&value.to_string()))
                        .map(|(_, label)| label.clone())
                        .unwrap_or_else(|| value.to_string()),
                    _ => value.to_string(),
                }
            };
            chips.push(FilterChip {
                key: descriptor.key.clone(),
                label: descriptor.label.clone(),
                display,
            });
        }
        chips
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_sentinel_and_empty_values_are_inactive() {
        let mut values = FilterValues::new();
        values.set("status", ALL);
        values.set("brand", "  ");
        assert_eq!(values.active_count(), 0);
        assert_eq!(values.to_query_string(), "");
    }

    #[test]
    fn test_clear_one_key_and_clear_all() {
        let mut values = FilterValues::new();
        values.set("search", "lin");
        values.set("status", "APPROVED");
        values.clear("search");
        assert_eq!(values.active_count(), 1);
        assert!(values.get("search").is_none());

        values.clear_all();
        assert_eq!(values.active_count(), 0);
    }

    #[test]
    fn test_clear_removes_range_siblings() {
        let mut values = FilterValues::new();
        values.set("priceFrom", 10i64);
        values.set("priceTo", 50i64);
        values.set("price", "x");
        values.clear("price");
        assert_eq!(values.active_count(), 0);
    }

    #[test]
    fn test_query_string_is_encoded() {
        let mut values = FilterValues::new();
        values.set("search", "robe d'été");
        values.set("minPrice", 5i64);
        assert_eq!(
            values.to_query_string(),
            "minPrice=5&search=robe%20d%27%C3%A9t%C3%A9"
        );
    }

    #[test]
    fn test_text_filter_is_case_insensitive_substring() {
        let mut values = FilterValues::new();
        values.set("title", "JEAN");
        let descriptor = FilterDescriptor::text("title", "Titre");
        assert!(descriptor.matches(&values, &Value::from("Veste en jean")));
        assert!(!descriptor.matches(&values, &Value::from("Robe")));
    }

    #[test]
    fn test_number_filter_is_exact() {
        let mut values = FilterValues::new();
        values.set("views", "12");
        let descriptor = FilterDescriptor::number("views", "Vues");
        assert!(descriptor.matches(&values, &Value::Int(12)));
        assert!(!descriptor.matches(&values, &Value::Int(120)));
        assert!(!descriptor.matches(&values, &Value::Null));
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let mut values = FilterValues::new();
        values.set("createdFrom", "2024-03-01");
        values.set("createdTo", "2024-03-31");
        let descriptor = FilterDescriptor::date_range("created", "Créé").on_field("createdAt");

        let first = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let last = Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();

        assert!(descriptor.matches(&values, &Value::from(first)));
        assert!(descriptor.matches(&values, &Value::from(last)));
        assert!(!descriptor.matches(&values, &Value::from(after)));
        assert!(!descriptor.matches(&values, &Value::Null));
    }

    #[test]
    fn test_open_number_range() {
        let mut values = FilterValues::new();
        values.set("priceFrom", 20i64);
        let descriptor = FilterDescriptor::number_range("price", "Prix");
        assert!(descriptor.matches(&values, &Value::Float(20.0)));
        assert!(!descriptor.matches(&values, &Value::Float(19.99)));
    }

    #[test]
    fn test_chips_merge_ranges_and_use_option_labels() {
        let mut values = FilterValues::new();
        values.set("priceFrom", 10i64);
        values.set("priceTo", 40i64);
        values.set("status", "APPROVED");
        let descriptors = vec![
            FilterDescriptor::number_range("price", "Prix"),
            FilterDescriptor::select(
                "status",
                "Statut",
                [("APPROVED".to_string(), "Approuvé".to_string())],
            ),
            FilterDescriptor::text("search", "Recherche"),
        ];

        let chips = values.chips(&descriptors);
        assert_eq!(chips.len(), 2);
        assert_eq!(chips[0].display, "10 – 40");
        assert_eq!(chips[1].display, "Approuvé");
    }
}
