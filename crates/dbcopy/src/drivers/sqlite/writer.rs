//! SQLite destination writer implementation.
//!
//! Implements the `TargetWriter` trait on top of an SQLx SQLite pool capped
//! at one connection. When `relax_constraints` is set the connection is
//! opened with foreign keys off, `synchronous = OFF` and an in-memory
//! journal, which makes row-at-a-time inserts fast and lets child rows land
//! before their parents.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use tracing::info;

use crate::core::traits::TargetWriter;
use crate::core::value::BoundValue;
use crate::error::{CopyError, Result};

/// Connection pool timeout.
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// SQLite destination writer.
pub struct SqliteWriter {
    pool: SqlitePool,
}

impl SqliteWriter {
    /// Open (creating if missing) the destination database.
    ///
    /// `destination` is either a file path or a `sqlite:` URL.
    pub async fn new(destination: &str, relax_constraints: bool) -> Result<Self> {
        let mut options = connect_options(destination)?.create_if_missing(true);

        if relax_constraints {
            options = options
                .foreign_keys(false)
                .synchronous(SqliteSynchronous::Off)
                .journal_mode(SqliteJournalMode::Memory);
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(POOL_CONNECTION_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| CopyError::pool(e, "opening SQLite destination"))?;

        let writer = Self { pool };
        writer.test_connection().await?;

        info!("Opened SQLite destination: {}", destination);
        Ok(writer)
    }

    /// Test the database connection.
    pub async fn test_connection(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CopyError::pool(e, "testing SQLite destination connection"))?;
        Ok(())
    }

    /// The underlying pool, for callers that want to inspect the result.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn connect_options(destination: &str) -> Result<SqliteConnectOptions> {
    if destination.starts_with("sqlite:") {
        SqliteConnectOptions::from_str(destination)
            .map_err(|e| CopyError::Config(format!("invalid SQLite url: {}", e)))
    } else {
        Ok(SqliteConnectOptions::new().filename(destination))
    }
}

#[async_trait]
impl TargetWriter for SqliteWriter {
    async fn execute(&self, sql: &str) -> Result<u64> {
        let result = sqlx::query(sql)
            .execute(&self.pool)
            .await
            .map_err(|e| CopyError::execution(sql, e))?;
        Ok(result.rows_affected())
    }

    async fn insert_row(&self, sql: &str, values: Vec<BoundValue>) -> Result<u64> {
        let mut query = sqlx::query(sql);
        for value in values {
            query = match value {
                BoundValue::Null => query.bind(None::<String>),
                BoundValue::Integer(v) => query.bind(v),
                BoundValue::Real(v) => query.bind(v),
                BoundValue::Text(v) => query.bind(v),
                BoundValue::Blob(v) => query.bind(v),
            };
        }

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| CopyError::execution(sql, e))?;
        Ok(result.rows_affected())
    }

    fn db_type(&self) -> &str {
        "sqlite"
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
