//! Single-column sort state and the row comparator.

use std::cmp::Ordering;

use serde::Deserialize;
use serde::Serialize;

use super::TableRow;
use crate::model::Value;

/// Sort direction for ordering rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// The one active sort of a table, if any.
///
/// [`handle_sort`](Self::handle_sort) cycles unset → ascending →
/// descending → unset; clicking another column starts over at ascending.
///
/// # Example
///
/// ```
/// use boudoir_lib::table::{SortDirection, SortState};
///
/// let mut sort = SortState::default();
/// sort.handle_sort("price");
/// assert_eq!(sort.direction_of("price"), Some(SortDirection::Asc));
/// sort.handle_sort("title");
/// assert_eq!(sort.direction_of("price"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    active: Option<(String, SortDirection)>,
}

impl SortState {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            active: Some((key.into(), direction)),
        }
    }

    /// Advances the sort cycle for `key` and returns the new state.
    pub fn handle_sort(&mut self, key: &str) -> Option<(&str, SortDirection)> {
        self.active = match self.active.take() {
            Some((current, SortDirection::Asc)) if current == key => {
                Some((current, SortDirection::Desc))
            }
            Some((current, SortDirection::Desc)) if current == key => None,
            _ => Some((key.to_string(), SortDirection::Asc)),
        };
        self.get()
    }

    pub fn get(&self) -> Option<(&str, SortDirection)> {
        self.active.as_ref().map(|(k, d)| (k.as_str(), *d))
    }

    pub fn key(&self) -> Option<&str> {
        self.active.as_ref().map(|(k, _)| k.as_str())
    }

    /// Direction if `key` is the active sort column.
    pub fn direction_of(&self, key: &str) -> Option<SortDirection> {
        match &self.active {
            Some((k, d)) if k == key => Some(*d),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    pub fn is_sorted(&self) -> bool {
        self.active.is_some()
    }

    /// Stable sort of `rows` by the active key. No-op when unset.
    pub fn sort_rows<R: TableRow>(&self, rows: &mut [R]) {
        if let Some((key, direction)) = self.get() {
            rows.sort_by(|a, b| compare_values(&a.field(key), &b.field(key), direction));
        }
    }
}

/// Compares two cell values.
///
/// Numbers compare numerically, dates by timestamp, everything else as a
/// case-insensitive string. A mixed column groups numbers before dates
/// before text, which keeps the order total. Nulls sort last in both
/// directions.
pub fn compare_values(a: &Value, b: &Value, direction: SortDirection) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ordering = compare_present(a, b);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
    }
}

/// Comparison class of a non-null value.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Number(OrderedNumber),
    Date(chrono::DateTime<chrono::Utc>),
    Text(String),
}

/// `f64` ordered with `total_cmp`, so NaN has a fixed place.
struct OrderedNumber(f64);

impl PartialEq for OrderedNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderedNumber {}

impl PartialOrd for OrderedNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

fn sort_key(value: &Value) -> SortKey {
    if let Some(n) = value.as_f64() {
        SortKey::Number(OrderedNumber(n))
    } else if let Some(dt) = value.as_datetime() {
        SortKey::Date(dt)
    } else {
        SortKey::Text(value.to_display_string().to_lowercase())
    }
}

fn compare_present(a: &Value, b: &Value) -> Ordering {
    sort_key(a).cmp(&sort_key(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;

    fn rows(values: &[Option<&str>]) -> Vec<Record> {
        values
            .iter()
            .map(|v| Record::new().set("name", Value::from(*v)))
            .collect()
    }

    fn names(rows: &[Record]) -> Vec<Option<&str>> {
        rows.iter().map(|r| r.get_str("name")).collect()
    }

    #[test]
    fn test_three_clicks_return_to_unsorted() {
        let mut sort = SortState::default();
        assert_eq!(sort.handle_sort("price"), Some(("price", SortDirection::Asc)));
        assert_eq!(sort.handle_sort("price"), Some(("price", SortDirection::Desc)));
        assert_eq!(sort.handle_sort("price"), None);
        assert!(!sort.is_sorted());
    }

    #[test]
    fn test_other_key_resets_direction() {
        let mut sort = SortState::default();
        sort.handle_sort("price");
        sort.handle_sort("price");
        assert_eq!(sort.handle_sort("title"), Some(("title", SortDirection::Asc)));
        assert_eq!(sort.handle_sort("price"), Some(("price", SortDirection::Asc)));
    }

    #[test]
    fn test_strings_are_case_insensitive() {
        let mut data = rows(&[Some("banane"), Some("Abricot"), Some("cerise")]);
        SortState::new("name", SortDirection::Asc).sort_rows(&mut data);
        assert_eq!(names(&data), vec![Some("Abricot"), Some("banane"), Some("cerise")]);
    }

    #[test]
    fn test_nulls_last_in_both_directions() {
        let mut data = rows(&[None, Some("b"), Some("a")]);
        SortState::new("name", SortDirection::Asc).sort_rows(&mut data);
        assert_eq!(names(&data), vec![Some("a"), Some("b"), None]);

        SortState::new("name", SortDirection::Desc).sort_rows(&mut data);
        assert_eq!(names(&data), vec![Some("b"), Some("a"), None]);
    }

    #[test]
    fn test_numbers_compare_numerically() {
        assert_eq!(
            compare_values(&Value::Int(9), &Value::Int(10), SortDirection::Asc),
            Ordering::Less
        );
        assert_eq!(
            compare_values(&Value::Float(2.5), &Value::Int(2), SortDirection::Desc),
            Ordering::Less
        );
    }

    #[test]
    fn test_mixed_column_is_totally_ordered() {
        let mut data = vec![
            Value::from("9"),
            Value::Int(10),
            Value::from("1x"),
            Value::Int(9),
            Value::Float(f64::NAN),
            Value::from("10"),
        ];
        data.sort_by(|a, b| compare_values(a, b, SortDirection::Asc));

        assert_eq!(&data[..2], &[Value::Int(9), Value::Int(10)]);
        assert!(data[2].as_f64().is_some_and(f64::is_nan));
        assert_eq!(&data[3..], &[Value::from("10"), Value::from("1x"), Value::from("9")]);

        for a in &data {
            for b in &data {
                let ab = compare_values(a, b, SortDirection::Asc);
                assert_eq!(ab.reverse(), compare_values(b, a, SortDirection::Asc));
            }
        }
    }
}
