//! In-memory source and destination doubles for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

use crate::core::metadata::{ColumnRow, ForeignKeyColumnRow, IndexColumnRow};
use crate::core::schema::Column;
use crate::core::traits::{SourceReader, TargetWriter};
use crate::core::value::{BoundValue, Row};
use crate::error::{CopyError, Result};

/// A source whose metadata and rows are fixed up front.
#[derive(Default)]
pub struct FakeSource {
    pub columns: Vec<ColumnRow>,
    pub index_columns: Vec<IndexColumnRow>,
    pub foreign_key_columns: Vec<ForeignKeyColumnRow>,
    /// Rows per table name.
    pub rows: HashMap<String, Vec<Row>>,
    /// Fail the stream of this table after yielding this many rows.
    pub fail_after: Option<(String, usize)>,
    /// Every projection query received, in order.
    pub queries: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

fn table_of(sql: &str) -> String {
    sql.rsplit("FROM ")
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches('`')
        .to_string()
}

#[async_trait]
impl SourceReader for FakeSource {
    async fn column_rows(&self) -> Result<Vec<ColumnRow>> {
        Ok(self.columns.clone())
    }

    async fn index_column_rows(&self) -> Result<Vec<IndexColumnRow>> {
        Ok(self.index_columns.clone())
    }

    async fn foreign_key_column_rows(&self) -> Result<Vec<ForeignKeyColumnRow>> {
        Ok(self.foreign_key_columns.clone())
    }

    fn read_rows<'a>(&'a self, sql: &'a str, _columns: &'a [Column]) -> BoxStream<'a, Result<Row>> {
        self.queries.lock().unwrap().push(sql.to_string());
        let table = table_of(sql);
        let rows = self.rows.get(&table).cloned().unwrap_or_default();

        let mut items: Vec<Result<Row>> = Vec::new();
        for (i, row) in rows.into_iter().enumerate() {
            if let Some((failing, after)) = &self.fail_after {
                if *failing == table && i == *after {
                    items.push(Err(CopyError::Config("connection reset".into())));
                    break;
                }
            }
            items.push(Ok(row));
        }
        stream::iter(items).boxed()
    }

    fn db_type(&self) -> &str {
        "fake"
    }

    async fn close(&self) {}
}

/// A destination that records what it was asked to do.
#[derive(Default)]
pub struct FakeTarget {
    /// Reject any statement containing this text.
    pub fail_on: Option<String>,
    pub executed: Mutex<Vec<String>>,
    pub inserts: Mutex<Vec<(String, Vec<BoundValue>)>>,
}

impl FakeTarget {
    pub fn failing_on(needle: impl Into<String>) -> Self {
        Self {
            fail_on: Some(needle.into()),
            ..Default::default()
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn inserts(&self) -> Vec<(String, Vec<BoundValue>)> {
        self.inserts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TargetWriter for FakeTarget {
    async fn execute(&self, sql: &str) -> Result<u64> {
        if let Some(needle) = &self.fail_on {
            if sql.contains(needle.as_str()) {
                return Err(CopyError::execution(
                    sql,
                    sqlx::Error::Protocol("table already exists".into()),
                ));
            }
        }
        self.executed.lock().unwrap().push(sql.to_string());
        Ok(0)
    }

    async fn insert_row(&self, sql: &str, values: Vec<BoundValue>) -> Result<u64> {
        self.inserts.lock().unwrap().push((sql.to_string(), values));
        Ok(1)
    }

    fn db_type(&self) -> &str {
        "fake"
    }

    async fn close(&self) {}
}
