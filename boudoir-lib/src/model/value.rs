//! Cell values

use chrono::DateTime;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// One cell of a table row.
///
/// Typed entities convert their fields into `Value` through `Into`; rows
/// fetched as raw JSON go through [`Value::from_json`], which turns RFC 3339
/// strings into `DateTime` so dates sort chronologically instead of
/// lexically. Prices stay `Decimal` until they are compared.
///
/// ```
/// use boudoir_lib::model::Value;
///
/// let views = Value::from(42i64);
/// assert_eq!(views.as_f64(), Some(42.0));
/// assert_eq!(Value::from(None::<String>), Value::Null);
/// assert_eq!(Value::from("Robe en lin").to_display_string(), "Robe en lin");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    /// Arrays and objects, kept as-is.
    Json(serde_json::Value),
}

impl Value {
    pub fn from_json(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or_default(),
            Json::String(s) => DateTime::parse_from_rfc3339(&s)
                .map(|dt| Self::DateTime(dt.with_timezone(&Utc)))
                .unwrap_or(Self::String(s)),
            nested => Self::Json(nested),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numbers of any representation, as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Int(i) => Some(i as f64),
            Self::Float(f) => Some(f),
            Self::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Default cell text; `Null` renders empty.
    pub fn to_display_string(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Decimal(d) => write!(f, "{}", d),
            Self::String(s) => f.write_str(s),
            Self::Uuid(u) => write!(f, "{}", u),
            Self::DateTime(dt) => f.write_str(&dt.to_rfc3339()),
            Self::Json(j) => write!(f, "{}", j),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident $(as $cast:ty)?),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v $(as $cast)?)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i32 => Int as i64,
    i64 => Int,
    u32 => Int as i64,
    f64 => Float,
    Decimal => Decimal,
    String => String,
    Uuid => Uuid,
    DateTime<Utc> => DateTime,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
