//! Copy orchestrator - main workflow coordinator.
//!
//! Wires the MySQL reader and the SQLite writer to the copy phases:
//! metadata load, DDL emission, and (optionally) the row copy.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::core::events::{EventSink, JsonProgressSink, TracingSink};
use crate::core::schema::Schema;
use crate::core::traits::{SourceReader, TargetWriter, TypeMapper};
use crate::ddl::{emit_schema, plan_schema, DdlPlan};
use crate::dialect::MysqlToSqliteMapper;
use crate::drivers::{MysqlReader, SqliteWriter};
use crate::error::{CopyError, Result};
use crate::loader::load_schema;
use crate::transfer::{copy_data, TableStats};

/// Load the source schema and recreate it in the destination.
///
/// Returns the loaded model so the caller can go on to copy data.
pub async fn copy_schema(
    source: &dyn SourceReader,
    target: &dyn TargetWriter,
    mapper: &dyn TypeMapper,
    sink: &dyn EventSink,
) -> Result<Schema> {
    let schema = load_schema(source, sink).await?;
    let plan = plan_schema(&schema, mapper, sink);
    emit_schema(&plan, target, sink).await?;
    Ok(schema)
}

/// Copy orchestrator.
pub struct Orchestrator {
    config: Config,
    source: MysqlReader,
    target: Option<SqliteWriter>,
    mapper: MysqlToSqliteMapper,
    sink: Box<dyn EventSink>,
}

/// Result of a copy run.
#[derive(Debug, Clone, Serialize)]
pub struct CopyResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status.
    pub status: String,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Tables created in the destination.
    pub tables: usize,

    /// Secondary indexes created in the destination.
    pub indexes: usize,

    /// Foreign keys declared in the destination.
    pub foreign_keys: usize,

    /// Whether row data was copied.
    pub data_loaded: bool,

    /// Total rows copied.
    pub rows_copied: u64,

    /// Per-table row counts, empty unless data was copied.
    pub table_stats: Vec<TableStats>,
}

impl CopyResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Result of a connection check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub healthy: bool,
    pub source_connected: bool,
    pub source_latency_ms: u64,
    pub source_error: Option<String>,
    pub target_connected: bool,
    pub target_latency_ms: u64,
    pub target_error: Option<String>,
}

impl Orchestrator {
    /// Connect to both the source and the destination.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let source = MysqlReader::new(&config.source.url).await?;
        let target =
            SqliteWriter::new(&config.target.path, config.copy.relax_constraints).await?;
        Ok(Self::assemble(config, source, Some(target)))
    }

    /// Connect to the source only. The destination is never opened, so
    /// only [`plan`](Self::plan) is available.
    pub async fn source_only(config: Config) -> Result<Self> {
        config.validate_source()?;
        let source = MysqlReader::new(&config.source.url).await?;
        Ok(Self::assemble(config, source, None))
    }

    fn assemble(config: Config, source: MysqlReader, target: Option<SqliteWriter>) -> Self {
        Self {
            config,
            source,
            target,
            mapper: MysqlToSqliteMapper::new(),
            sink: Box::new(TracingSink),
        }
    }

    /// Route events to a custom sink instead of the log.
    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Print progress events as JSON lines on stderr, in addition to logging.
    pub fn with_progress(self, enabled: bool) -> Self {
        if enabled {
            self.with_sink(JsonProgressSink)
        } else {
            self
        }
    }

    fn target(&self) -> Result<&SqliteWriter> {
        self.target
            .as_ref()
            .ok_or_else(|| CopyError::Config("destination is not connected".into()))
    }

    /// Load the source schema and return the statements a copy would run.
    pub async fn plan(&self) -> Result<DdlPlan> {
        let schema = load_schema(&self.source, self.sink.as_ref()).await?;
        Ok(plan_schema(&schema, &self.mapper, self.sink.as_ref()))
    }

    /// Recreate the source schema in the destination.
    pub async fn copy_schema(&self) -> Result<Schema> {
        copy_schema(&self.source, self.target()?, &self.mapper, self.sink.as_ref()).await
    }

    /// Run the copy: schema first, then data when `copy.load_data` is set.
    pub async fn run(&self) -> Result<CopyResult> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let target = self.target()?;
        let sink = self.sink.as_ref();

        info!("Starting copy run: {}", run_id);

        info!("Phase 1: Copying schema");
        let schema = copy_schema(&self.source, target, &self.mapper, sink).await?;

        let stats = if self.config.copy.load_data {
            info!("Phase 2: Copying data");
            let transfer = self.config.copy.transfer_config();
            Some(copy_data(&schema, &self.source, target, &self.mapper, &transfer, sink).await?)
        } else {
            None
        };

        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;
        let (rows_copied, table_stats) = stats
            .map(|s| (s.rows, s.tables))
            .unwrap_or_default();

        info!(
            "Copy run {} completed in {:.2}s: {} tables, {} rows",
            run_id,
            duration,
            schema.len(),
            rows_copied
        );

        Ok(CopyResult {
            run_id,
            status: "completed".to_string(),
            duration_seconds: duration,
            started_at,
            completed_at,
            tables: schema.len(),
            indexes: schema.index_count(),
            foreign_keys: schema.foreign_key_count(),
            data_loaded: self.config.copy.load_data,
            rows_copied,
            table_stats,
        })
    }

    /// Ping both connections and report latency.
    pub async fn health_check(&self) -> HealthCheckResult {
        let started = Instant::now();
        let source = self.source.test_connection().await;
        let source_latency_ms = started.elapsed().as_millis() as u64;

        let started = Instant::now();
        let target = match self.target() {
            Ok(target) => target.test_connection().await,
            Err(e) => Err(e),
        };
        let target_latency_ms = started.elapsed().as_millis() as u64;

        HealthCheckResult {
            healthy: source.is_ok() && target.is_ok(),
            source_connected: source.is_ok(),
            source_latency_ms,
            source_error: source.err().map(|e| e.to_string()),
            target_connected: target.is_ok(),
            target_latency_ms,
            target_error: target.err().map(|e| e.to_string()),
        }
    }

    /// Close both connection pools.
    pub async fn close(self) {
        self.source.close().await;
        if let Some(target) = self.target {
            target.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::{CopyEvent, RecordingSink};
    use crate::core::metadata::{ColumnRow, IndexColumnRow};
    use crate::testing::{FakeSource, FakeTarget};

    #[tokio::test]
    async fn test_copy_schema_runs_tables_then_indexes() {
        let source = FakeSource {
            columns: vec![
                ColumnRow::new("users", "id", "int(11)", "NO", "auto_increment"),
                ColumnRow::new("users", "email", "varchar(255)", "NO", ""),
            ],
            index_columns: vec![
                IndexColumnRow::new("users", "PRIMARY", "id", 1),
                IndexColumnRow::new("users", "ix_email", "email", 1),
            ],
            ..Default::default()
        };
        let target = FakeTarget::default();
        let sink = RecordingSink::new();

        let schema = copy_schema(&source, &target, &MysqlToSqliteMapper::new(), &sink)
            .await
            .unwrap();

        assert_eq!(schema.len(), 1);
        assert_eq!(
            target.executed(),
            vec![
                "CREATE TABLE `users` (`id` INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT, `email` varchar(255) NOT NULL)".to_string(),
                "CREATE INDEX `ix_email_users` ON `users` (`email`)".to_string(),
            ]
        );

        let executed: Vec<_> = sink
            .events()
            .into_iter()
            .filter(|e| matches!(e, CopyEvent::StatementExecuted { .. }))
            .collect();
        assert_eq!(executed.len(), 2);
    }

    #[tokio::test]
    async fn test_copy_schema_stops_on_lookup_failure() {
        let source = FakeSource {
            columns: vec![ColumnRow::new("users", "id", "int", "NO", "")],
            index_columns: vec![IndexColumnRow::new("ghost", "PRIMARY", "id", 1)],
            ..Default::default()
        };
        let target = FakeTarget::default();

        let err = copy_schema(&source, &target, &MysqlToSqliteMapper::new(), &RecordingSink::new())
            .await
            .unwrap_err();

        assert!(matches!(err, CopyError::Lookup { .. }));
        assert!(target.executed().is_empty());
    }

    #[test]
    fn test_copy_result_json() {
        let now = Utc::now();
        let result = CopyResult {
            run_id: "run".into(),
            status: "completed".into(),
            duration_seconds: 0.5,
            started_at: now,
            completed_at: now,
            tables: 2,
            indexes: 1,
            foreign_keys: 1,
            data_loaded: true,
            rows_copied: 10,
            table_stats: vec![],
        };
        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(json["tables"], 2);
        assert_eq!(json["rows_copied"], 10);
        assert_eq!(json["status"], "completed");
    }
}
