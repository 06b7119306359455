//! Core traits for the copy engine.
//!
//! This module defines the abstractions the engine is written against:
//!
//! - [`SourceReader`]: Reads metadata collections and row streams from the source
//! - [`TargetWriter`]: Executes DDL and parameterized inserts on the destination
//! - [`Dialect`]: SQL syntax strategy for a database engine
//! - [`TypeMapper`]: Maps source column types to destination types
//!
//! The engine never touches a connection directly; drivers implement these
//! traits and tests substitute in-memory fakes.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;

use super::metadata::{ColumnRow, ForeignKeyColumnRow, IndexColumnRow};
use super::schema::Column;
use super::value::{BindingType, BoundValue, Row};

/// Read metadata and data from a source database.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Column metadata for every base table, ordered by table then ordinal.
    async fn column_rows(&self) -> Result<Vec<ColumnRow>>;

    /// Index-column metadata, ordinal-ordered within each index.
    async fn index_column_rows(&self) -> Result<Vec<IndexColumnRow>>;

    /// Foreign-key-column metadata, ordinal-ordered within each constraint.
    async fn foreign_key_column_rows(&self) -> Result<Vec<ForeignKeyColumnRow>>;

    /// Stream the rows of a projection query.
    ///
    /// `columns` describes the projected columns in order; values in each
    /// yielded row are addressed by the same ordinal position. The stream
    /// is pulled one row at a time, so the caller controls the pace.
    fn read_rows<'a>(&'a self, sql: &'a str, columns: &'a [Column])
        -> BoxStream<'a, Result<Row>>;

    /// Get the database type identifier (e.g., "mysql").
    fn db_type(&self) -> &str;

    /// Close the connection pool.
    async fn close(&self);
}

/// Write schema and data to a destination database.
#[async_trait]
pub trait TargetWriter: Send + Sync {
    /// Execute a statement that returns no rows. Returns rows affected.
    async fn execute(&self, sql: &str) -> Result<u64>;

    /// Execute a parameterized insert with positionally bound values.
    async fn insert_row(&self, sql: &str, values: Vec<BoundValue>) -> Result<u64>;

    /// Get the database type identifier (e.g., "sqlite").
    fn db_type(&self) -> &str;

    /// Close the connection pool.
    async fn close(&self);
}

/// SQL syntax strategy for different database engines.
pub trait Dialect: Send + Sync {
    /// Get the dialect identifier (e.g., "mysql", "sqlite").
    fn name(&self) -> &str;

    /// Quote an identifier (table name, column name, etc.).
    fn quote_ident(&self, name: &str) -> String;

    /// Get a parameter placeholder for the given 1-based index.
    fn param_placeholder(&self, index: usize) -> String;

    /// Build a positional INSERT with one placeholder per column.
    fn build_insert_query(&self, table: &str, column_count: usize) -> String {
        let params = (1..=column_count)
            .map(|i| self.param_placeholder(i))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} VALUES ({})",
            self.quote_ident(table),
            params
        )
    }
}

/// Maps column types from a source dialect to a target dialect.
pub trait TypeMapper: Send + Sync {
    /// Get the source dialect name.
    fn source_dialect(&self) -> &str;

    /// Get the target dialect name.
    fn target_dialect(&self) -> &str;

    /// Map a column definition from source to target.
    fn map_column(&self, col: &Column) -> ColumnMapping {
        let mapping = self.map_type(&col.source_type);
        ColumnMapping {
            name: col.name.clone(),
            target_type: mapping.target_type,
            is_nullable: col.is_nullable,
            passthrough: mapping.passthrough,
        }
    }

    /// Map a source type descriptor to a target type keyword.
    fn map_type(&self, source_type: &str) -> TypeMapping;

    /// Choose how values of a source type are bound on insert.
    fn binding_type(&self, source_type: &str) -> BindingType;
}

/// Result of mapping a column from source to target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Target column name (same as source).
    pub name: String,
    /// Target data type string.
    pub target_type: String,
    /// Whether the column is nullable.
    pub is_nullable: bool,
    /// Whether the source type was passed through untranslated.
    pub passthrough: bool,
}

/// Result of mapping a type from source to target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMapping {
    /// Target type string (e.g., "INTEGER", "decimal(18,2)").
    pub target_type: String,
    /// Whether the source type was passed through untranslated.
    pub passthrough: bool,
}

impl TypeMapping {
    /// A mapping onto a destination storage class.
    pub fn translated(target_type: impl Into<String>) -> Self {
        Self {
            target_type: target_type.into(),
            passthrough: false,
        }
    }

    /// A source type handed to the destination as-is.
    pub fn passthrough(target_type: impl Into<String>) -> Self {
        Self {
            target_type: target_type.into(),
            passthrough: true,
        }
    }
}
