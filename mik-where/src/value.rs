//! Filter values and the ordered filter map.
//!
//! A [`Filters`] map is the untyped input of the compiler: filter names
//! mapped to scalars, `null`, or arrays of scalars. Insertion order is kept
//! so the generated conditions follow the caller's order.
//!
//! # Runtime JSON
//!
//! ```
//! use mik_where::{Filters, Value};
//!
//! let filters = Filters::from_json_str(r#"{"status": "active", "id": [1, 2]}"#).unwrap();
//! assert_eq!(filters.get("status"), Some(&Value::from("active")));
//! ```

use miniserde::json::{Number, Value as JsonValue};
use thiserror::Error;

/// SQL parameter values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL `NULL`; compiles to `IS NULL` / `IS NOT NULL`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point.
    Float(f64),
    /// Text.
    String(String),
    /// List; compiles to `IN` / `NOT IN`.
    Array(Vec<Value>),
}

impl Value {
    /// `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the string payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert from miniserde JSON value.
    ///
    /// Objects are not valid filter values and yield `None`.
    ///
    /// ```
    /// use mik_where::Value;
    /// use miniserde::json::{Number, Value as JsonValue};
    ///
    /// let json = JsonValue::Number(Number::I64(42));
    /// assert_eq!(Value::from_json(&json), Some(Value::Int(42)));
    /// ```
    #[must_use]
    pub fn from_json(json: &JsonValue) -> Option<Self> {
        match json {
            JsonValue::Null => Some(Self::Null),
            JsonValue::Bool(b) => Some(Self::Bool(*b)),
            JsonValue::Number(n) => match n {
                Number::I64(i) => Some(Self::Int(*i)),
                Number::U64(u) => i64::try_from(*u).ok().map(Self::Int),
                Number::F64(f) => Some(Self::Float(*f)),
            },
            JsonValue::String(s) => Some(Self::String(s.clone())),
            JsonValue::Array(arr) => {
                let values: Option<Vec<Self>> = arr.iter().map(Self::from_json).collect();
                values.map(Self::Array)
            },
            JsonValue::Object(_) => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Error type for JSON filter parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Invalid JSON syntax or encoding.
    #[error("Invalid JSON syntax or encoding")]
    InvalidJson,
    /// The top-level document is not an object.
    #[error("Expected JSON object")]
    ExpectedObject,
    /// A filter value is a nested object.
    #[error("Filter '{0}' must be a scalar, null or an array of scalars")]
    UnsupportedValue(String),
}

/// Ordered map of filter names to values.
///
/// Keys are unique; inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    entries: Vec<(String, Value)>,
}

impl Filters {
    /// Create an empty filter map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a filter, replacing the value of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up a filter value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// `true` if the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if there are no filters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keep only the entries matching the predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &Value) -> bool) {
        self.entries.retain(|(k, v)| keep(k, v));
    }

    /// Merge `other` over `self`; keys of `other` win.
    #[must_use]
    pub fn merged(mut self, other: &Self) -> Self {
        for (key, value) in other.iter() {
            self.insert(key, value.clone());
        }
        self
    }

    /// Parse a JSON object into a filter map.
    ///
    /// JSON objects are parsed into a sorted map, so the resulting filters
    /// are ordered by key rather than by document order.
    pub fn from_json_str(json_str: &str) -> Result<Self, ParseError> {
        let json: JsonValue =
            miniserde::json::from_str(json_str).map_err(|_| ParseError::InvalidJson)?;
        Self::from_json(&json)
    }

    /// Parse raw JSON bytes (e.g. a request body) into a filter map.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        let json_str = std::str::from_utf8(bytes).map_err(|_| ParseError::InvalidJson)?;
        Self::from_json_str(json_str)
    }

    /// Convert a miniserde JSON object into a filter map.
    pub fn from_json(json: &JsonValue) -> Result<Self, ParseError> {
        let JsonValue::Object(obj) = json else {
            return Err(ParseError::ExpectedObject);
        };

        let mut filters = Self::new();
        for (key, value) in obj.iter() {
            let value =
                Value::from_json(value).ok_or_else(|| ParseError::UnsupportedValue(key.clone()))?;
            filters.insert(key.clone(), value);
        }
        Ok(filters)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Filters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut filters = Self::new();
        for (key, value) in iter {
            filters.insert(key, value);
        }
        filters
    }
}

impl<'a> IntoIterator for &'a Filters {
    type Item = (&'a str, &'a Value);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (String, Value)>,
        fn(&'a (String, Value)) -> (&'a str, &'a Value),
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Parse a filter map from a JSON string.
///
/// Convenience function for [`Filters::from_json_str`].
pub fn parse_filters(json_str: &str) -> Result<Filters, ParseError> {
    Filters::from_json_str(json_str)
}
