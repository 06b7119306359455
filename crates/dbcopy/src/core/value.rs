//! SQL value types for the row copy.
//!
//! [`SqlValue`] is what a source reader produces for one cell. Before a value
//! is handed to the destination it is marshalled into a [`BoundValue`]
//! according to the [`BindingType`] of its insert parameter.

use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Text layout used for date-times written to the destination.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A single source value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL.
    Null,

    /// Boolean value.
    Bool(bool),

    /// Any integer width, widened to 64 bits.
    I64(i64),

    /// Floating point (float/double).
    F64(f64),

    /// Exact decimal value.
    Decimal(Decimal),

    /// Text data (char, varchar, text, enum, set, json), plus values the
    /// source renders as exact text: decimals, dates, times and unsigned
    /// integers beyond `i64::MAX`.
    Text(String),

    /// Binary data (binary, varbinary, blob, bit, geometry).
    Bytes(Vec<u8>),

    /// Timestamp without timezone.
    DateTime(NaiveDateTime),
}

/// A row of values addressed by ordinal position.
pub type Row = Vec<SqlValue>;

/// How an insert parameter marshals its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingType {
    /// 64-bit integer (integers and booleans).
    Integer,
    /// Numeric with scale (decimals).
    Numeric,
    /// Date / time.
    Temporal,
    /// Character data.
    Text,
    /// Binary large object.
    Binary,
}

impl fmt::Display for BindingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BindingType::Integer => "integer",
            BindingType::Numeric => "numeric",
            BindingType::Temporal => "temporal",
            BindingType::Text => "text",
            BindingType::Binary => "binary",
        };
        f.write_str(name)
    }
}

/// A value in the destination's storage classes, ready to bind.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Render the value as text. Returns `None` for NULL and binary data.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            SqlValue::Null | SqlValue::Bytes(_) => None,
            SqlValue::Bool(v) => Some(if *v { "1" } else { "0" }.to_string()),
            SqlValue::I64(v) => Some(v.to_string()),
            SqlValue::F64(v) => Some(v.to_string()),
            SqlValue::Decimal(v) => Some(v.to_string()),
            SqlValue::Text(v) => Some(v.clone()),
            SqlValue::DateTime(v) => Some(v.format(DATETIME_FORMAT).to_string()),
        }
    }

    /// Marshal the value into its natural destination storage class.
    #[must_use]
    pub fn into_bound(self) -> BoundValue {
        match self {
            SqlValue::Null => BoundValue::Null,
            SqlValue::Bool(v) => BoundValue::Integer(i64::from(v)),
            SqlValue::I64(v) => BoundValue::Integer(v),
            SqlValue::F64(v) => BoundValue::Real(v),
            SqlValue::Bytes(v) => BoundValue::Blob(v),
            SqlValue::Text(v) => BoundValue::Text(v),
            other => match other.to_text() {
                Some(text) => BoundValue::Text(text),
                None => BoundValue::Null,
            },
        }
    }

    /// Marshal the value for a parameter of the given binding type.
    ///
    /// NULL always binds as NULL. Values that do not fit the binding type
    /// fall back to their natural storage class rather than being dropped.
    #[must_use]
    pub fn bind_as(self, binding: BindingType) -> BoundValue {
        match (binding, self) {
            (_, value) if value.is_null() => BoundValue::Null,

            (BindingType::Integer, SqlValue::Text(s)) => match s.trim().parse::<i64>() {
                Ok(v) => BoundValue::Integer(v),
                Err(_) => BoundValue::Text(s),
            },

            (BindingType::Numeric, SqlValue::Decimal(d)) => BoundValue::Text(d.to_string()),

            (BindingType::Binary, SqlValue::Text(s)) => BoundValue::Blob(s.into_bytes()),

            (BindingType::Text, SqlValue::Bytes(b)) => BoundValue::Blob(b),
            (BindingType::Text, value) => match value.to_text() {
                Some(text) => BoundValue::Text(text),
                None => BoundValue::Null,
            },

            (_, value) => value.into_bound(),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
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

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
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

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}
