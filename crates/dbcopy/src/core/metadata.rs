//! Typed introspection rows.
//!
//! Drivers decode their metadata queries into these records once, at the
//! boundary, so the loader never deals with untyped result sets.

use serde::{Deserialize, Serialize};

/// One row of column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRow {
    pub table_name: String,
    pub column_name: String,
    /// Full type descriptor, e.g. "int(11) unsigned".
    pub column_type: String,
    /// "YES" or "NO".
    pub is_nullable: String,
    /// Extra flags, e.g. "auto_increment".
    pub extra: String,
}

/// One row of index-column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColumnRow {
    pub table_name: String,
    pub index_name: String,
    pub column_name: String,
    /// 1-based position of the column inside the index.
    pub ordinal_position: i64,
}

/// One row of foreign-key-column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyColumnRow {
    pub constraint_name: String,
    pub table_name: String,
    pub column_name: String,
    pub referenced_table_name: String,
    pub referenced_column_name: String,
    /// 1-based position of the pair inside the constraint.
    pub ordinal_position: i64,
}

impl ColumnRow {
    /// Convenience constructor, mostly for fixtures.
    pub fn new(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        column_type: impl Into<String>,
        is_nullable: impl Into<String>,
        extra: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            column_type: column_type.into(),
            is_nullable: is_nullable.into(),
            extra: extra.into(),
        }
    }
}

impl IndexColumnRow {
    /// Convenience constructor, mostly for fixtures.
    pub fn new(
        table_name: impl Into<String>,
        index_name: impl Into<String>,
        column_name: impl Into<String>,
        ordinal_position: i64,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            index_name: index_name.into(),
            column_name: column_name.into(),
            ordinal_position,
        }
    }
}

impl ForeignKeyColumnRow {
    /// Convenience constructor, mostly for fixtures.
    pub fn new(
        constraint_name: impl Into<String>,
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        referenced_table_name: impl Into<String>,
        referenced_column_name: impl Into<String>,
        ordinal_position: i64,
    ) -> Self {
        Self {
            constraint_name: constraint_name.into(),
            table_name: table_name.into(),
            column_name: column_name.into(),
            referenced_table_name: referenced_table_name.into(),
            referenced_column_name: referenced_column_name.into(),
            ordinal_position,
        }
    }
}
