//! Record model for raw input data.
//!
//! Raw records arrive as loosely structured nested key/value data (an API
//! response, a decoded NDJSON line, ...). They are modelled as a tagged
//! variant so every traversal and parser step works on a closed set of shapes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw record: string keys to heterogeneous values, in source order.
pub type Record = IndexMap<String, RecordValue>;

/// Represents a single value inside a raw record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(untagged)]
pub enum RecordValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<RecordValue>),
    Map(IndexMap<String, RecordValue>),
}

impl RecordValue {
    /// Build a string value
    pub fn string(s: impl Into<String>) -> Self {
        RecordValue::String(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RecordValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RecordValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RecordValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RecordValue::Int(i) => Some(*i as f64),
            RecordValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RecordValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[RecordValue]> {
        match self {
            RecordValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, RecordValue>> {
        match self {
            RecordValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            RecordValue::Null => "null",
            RecordValue::Bool(_) => "boolean",
            RecordValue::Int(_) => "integer",
            RecordValue::Float(_) => "float",
            RecordValue::String(_) => "string",
            RecordValue::List(_) => "list",
            RecordValue::Map(_) => "map",
        }
    }

    /// Convert to a `serde_json::Value`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(self.clone())
    }
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordValue::Null => write!(f, "null"),
            RecordValue::Bool(b) => write!(f, "{}", b),
            RecordValue::Int(i) => write!(f, "{}", i),
            RecordValue::Float(fl) => write!(f, "{}", fl),
            RecordValue::String(s) => write!(f, "{}", s),
            RecordValue::List(_) | RecordValue::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<serde_json::Value> for RecordValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RecordValue::Null,
            serde_json::Value::Bool(b) => RecordValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    RecordValue::Int(i)
                } else if let Some(f) = n.as_f64() {
                    RecordValue::Float(f)
                } else {
                    RecordValue::Null
                }
            }
            serde_json::Value::String(s) => RecordValue::String(s),
            serde_json::Value::Array(arr) => {
                RecordValue::List(arr.into_iter().map(RecordValue::from).collect())
            }
            serde_json::Value::Object(map) => RecordValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, RecordValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<RecordValue> for serde_json::Value {
    fn from(value: RecordValue) -> Self {
        match value {
            RecordValue::Null => serde_json::Value::Null,
            RecordValue::Bool(b) => serde_json::Value::Bool(b),
            RecordValue::Int(i) => serde_json::Value::from(i),
            // Non-finite floats have no JSON form
            RecordValue::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            RecordValue::String(s) => serde_json::Value::String(s),
            RecordValue::List(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            RecordValue::Map(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for RecordValue {
    fn from(s: &str) -> Self {
        RecordValue::String(s.to_string())
    }
}

impl From<String> for RecordValue {
    fn from(s: String) -> Self {
        RecordValue::String(s)
    }
}

impl From<i64> for RecordValue {
    fn from(i: i64) -> Self {
        RecordValue::Int(i)
    }
}

impl From<f64> for RecordValue {
    fn from(f: f64) -> Self {
        RecordValue::Float(f)
    }
}

impl From<bool> for RecordValue {
    fn from(b: bool) -> Self {
        RecordValue::Bool(b)
    }
}

impl<T: Into<RecordValue>> From<Option<T>> for RecordValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RecordValue::Null)
    }
}

/// Convert a JSON document into a record.
///
/// Returns `None` when the document is not a JSON object.
pub fn record_from_json(value: serde_json::Value) -> Option<Record> {
    match RecordValue::from(value) {
        RecordValue::Map(map) => Some(map),
        _ => None,
    }
}
