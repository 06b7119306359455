//! Schema and metadata types for tables, columns, indexes, and foreign keys.
//!
//! These types form the relational model the copy works on. The model is
//! built once by the [`loader`](crate::loader) and is read-only afterwards.
//! All maps preserve first-seen order, which is the order DDL is emitted in.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Name of the index the source reports for a table's primary key.
pub const PRIMARY_INDEX_NAME: &str = "PRIMARY";

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Raw source type descriptor (e.g. "decimal(18,2)", "int(11) unsigned").
    pub source_type: String,

    /// Whether the column allows NULL.
    pub is_nullable: bool,

    /// Whether the source assigns values automatically on insert.
    pub is_auto_increment: bool,
}

/// Index metadata. Also used for the primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name.
    pub name: String,

    /// Indexed column names in key order.
    pub columns: Vec<String>,
}

impl Index {
    /// Create an empty index.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Check whether the index covers a column.
    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// Foreign key metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name.
    pub name: String,

    /// Referenced table name.
    pub ref_table: String,

    /// Local column names.
    pub columns: Vec<String>,

    /// Referenced column names, paired by position with `columns`.
    pub ref_columns: Vec<String>,
}

impl ForeignKey {
    /// Create a foreign key with no column pairs yet.
    pub fn new(name: impl Into<String>, ref_table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ref_table: ref_table.into(),
            columns: Vec::new(),
            ref_columns: Vec::new(),
        }
    }

    /// Append one (local, referenced) column pair.
    pub fn push_pair(&mut self, column: impl Into<String>, ref_column: impl Into<String>) {
        self.columns.push(column.into());
        self.ref_columns.push(ref_column.into());
    }
}

/// Table metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Column definitions keyed by name, in source ordinal order.
    pub columns: IndexMap<String, Column>,

    /// Secondary indexes keyed by name. Never contains the primary key.
    pub indexes: IndexMap<String, Index>,

    /// Primary key, if the table has one.
    pub primary_key: Option<Index>,

    /// Foreign key constraints keyed by constraint name.
    pub foreign_keys: IndexMap<String, ForeignKey>,
}

impl Table {
    /// Create a table with no columns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: IndexMap::new(),
            indexes: IndexMap::new(),
            primary_key: None,
            foreign_keys: IndexMap::new(),
        }
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    /// Primary key column names, empty when the table has no key.
    pub fn pk_columns(&self) -> &[String] {
        self.primary_key
            .as_ref()
            .map(|pk| pk.columns.as_slice())
            .unwrap_or(&[])
    }

    /// Check if the table has a primary key.
    pub fn has_pk(&self) -> bool {
        !self.pk_columns().is_empty()
    }

    /// Check if a column belongs to the primary key.
    pub fn is_pk_column(&self, column: &str) -> bool {
        self.pk_columns().iter().any(|c| c == column)
    }

    /// Names of the tables this table references through foreign keys.
    pub fn referenced_tables(&self) -> impl Iterator<Item = &str> {
        self.foreign_keys.values().map(|fk| fk.ref_table.as_str())
    }
}

/// The set of tables being copied, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    tables: IndexMap<String, Table>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a table.
    pub fn insert(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Look up a table by name.
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Check whether a table is part of the schema.
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Iterate tables in model order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Position of a table in model order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.tables.get_index_of(name)
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check whether the schema has no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Total number of secondary indexes across all tables.
    pub fn index_count(&self) -> usize {
        self.tables.values().map(|t| t.indexes.len()).sum()
    }

    /// Total number of foreign keys across all tables.
    pub fn foreign_key_count(&self) -> usize {
        self.tables.values().map(|t| t.foreign_keys.len()).sum()
    }
}

impl FromIterator<Table> for Schema {
    fn from_iter<I: IntoIterator<Item = Table>>(iter: I) -> Self {
        let mut schema = Schema::new();
        for table in iter {
            schema.insert(table);
        }
        schema
    }
}
