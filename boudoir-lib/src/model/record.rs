//! Untyped rows

use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

use super::Value;
use crate::table::TableRow;

/// A row without a typed entity behind it, such as an ad-hoc admin listing
/// decoded straight from JSON. Missing fields read as [`Value::Null`].
///
/// ```
/// use boudoir_lib::model::Record;
///
/// let record = Record::new().set("id", "a1").set("title", "Veste en jean");
/// assert_eq!(record.get_str("title"), Some("Veste en jean"));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "HashMap<String, Value>")]
pub struct Record(HashMap<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }
}

/// Objects map field by field; anything else yields an empty row.
impl From<serde_json::Value> for Record {
    fn from(json: serde_json::Value) -> Self {
        let serde_json::Value::Object(map) = json else {
            return Self::default();
        };
        Self(map.into_iter().map(|(k, v)| (k, Value::from_json(v))).collect())
    }
}

impl From<Record> for HashMap<String, Value> {
    fn from(record: Record) -> Self {
        record.0
    }
}

impl TableRow for Record {
    fn field(&self, key: &str) -> Value {
        self.get(key).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_api_object() {
        let json = r#"{"id": "a1", "price": 25, "createdAt": "2024-05-01T08:00:00Z"}"#;
        let record: Record = serde_json::from_str(json).unwrap();

        assert_eq!(record.get_str("id"), Some("a1"));
        assert_eq!(record.get("price"), Some(&Value::Int(25)));
        assert!(record.field("createdAt").as_datetime().is_some());
        assert!(record.field("brand").is_null());
    }

    #[test]
    fn test_non_object_is_empty() {
        let record: Record = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(record, Record::new());
    }
}
