//! SQL value types and row-shaped records.
//!
//! [`SqlValue`] is the database-agnostic value representation moved through
//! the engine. Values are owned: rows cross await points and channel
//! boundaries, so borrowing from source buffers is not an option here.
//! [`KeyValue`] is the normalized form used to key id maps, so that an
//! `int` read back from one engine matches a `bigint` read from another.

use std::collections::HashMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// SQL value enum for type-safe row handling.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,

    /// Boolean value.
    Bool(bool),

    /// 32-bit signed integer (int).
    I32(i32),

    /// 64-bit signed integer (bigint).
    I64(i64),

    /// 64-bit floating point (double precision).
    F64(f64),

    /// Text/string data.
    Text(String),

    /// Binary data.
    Bytes(Vec<u8>),

    /// UUID/GUID value.
    Uuid(Uuid),

    /// Decimal value with arbitrary precision.
    Decimal(Decimal),

    /// Timestamp without timezone.
    DateTime(NaiveDateTime),

    /// Date without time component.
    Date(NaiveDate),
}

impl SqlValue {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Normalize this value into an id-map key, if it is a key-shaped value.
    ///
    /// Integer widths collapse to `i64` so identity values read back from
    /// the store match the source representation. NULL and non-key types
    /// (floats, binary, temporal) return `None`.
    #[must_use]
    pub fn as_key(&self) -> Option<KeyValue> {
        match self {
            SqlValue::I32(v) => Some(KeyValue::Int(*v as i64)),
            SqlValue::I64(v) => Some(KeyValue::Int(*v)),
            SqlValue::Text(v) => Some(KeyValue::Text(v.clone())),
            SqlValue::Uuid(v) => Some(KeyValue::Uuid(*v)),
            _ => None,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Bool(v) => write!(f, "{}", v),
            SqlValue::I32(v) => write!(f, "{}", v),
            SqlValue::I64(v) => write!(f, "{}", v),
            SqlValue::F64(v) => write!(f, "{}", v),
            SqlValue::Text(v) => write!(f, "{}", v),
            SqlValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            SqlValue::Uuid(v) => write!(f, "{}", v),
            SqlValue::Decimal(v) => write!(f, "{}", v),
            SqlValue::DateTime(v) => write!(f, "{}", v),
            SqlValue::Date(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::I32(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::I64(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::F64(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

/// Normalized key value used to index id maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyValue {
    /// Integer key (covers int and bigint).
    Int(i64),
    /// UUID/GUID key.
    Uuid(Uuid),
    /// String key.
    Text(String),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Int(v) => write!(f, "{}", v),
            KeyValue::Uuid(v) => write!(f, "{}", v),
            KeyValue::Text(v) => write!(f, "{}", v),
        }
    }
}

/// One row-shaped record: named columns with SQL values.
///
/// Records carry whatever the source produced; payload construction
/// restricts them to the destination table's known columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: HashMap<String, SqlValue>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a column value, if present.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.values.get(column)
    }

    /// Set a column value, returning the record for chaining.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    /// Set a column value in place.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) {
        self.values.insert(column.into(), value.into());
    }

    /// Number of columns in this record.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the record has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, SqlValue)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, SqlValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_value_is_null() {
        assert!(SqlValue::Null.is_null());
        assert!(!SqlValue::I32(42).is_null());
    }

    #[test]
    fn test_as_key_normalizes_integer_widths() {
        assert_eq!(SqlValue::I32(7).as_key(), Some(KeyValue::Int(7)));
        assert_eq!(SqlValue::I64(7).as_key(), Some(KeyValue::Int(7)));
    }

    #[test]
    fn test_as_key_rejects_non_key_values() {
        assert_eq!(SqlValue::Null.as_key(), None);
        assert_eq!(SqlValue::F64(1.5).as_key(), None);
        assert_eq!(SqlValue::Bytes(vec![1, 2]).as_key(), None);
    }

    #[test]
    fn test_record_builder() {
        let record = Record::new().with("id", 1i64).with("name", "first");
        assert_eq!(record.get("id"), Some(&SqlValue::I64(1)));
        assert_eq!(record.get("name"), Some(&SqlValue::Text("first".into())));
        assert_eq!(record.get("missing"), None);
        assert_eq!(record.len(), 2);
    }
}
