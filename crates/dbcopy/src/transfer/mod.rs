//! Data copy engine.
//!
//! Copies every table of a loaded [`Schema`] row by row: one projection
//! query against the source, one positional insert per row against the
//! destination. Reads and writes are strictly alternating; the next row is
//! pulled only after the previous insert completed.

use std::collections::{BTreeSet, HashSet};
use std::time::{Duration, Instant};

use futures::StreamExt;
use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::core::events::{CopyEvent, EventSink};
use crate::core::schema::{Column, Schema, Table};
use crate::core::traits::{Dialect, SourceReader, TargetWriter, TypeMapper};
use crate::core::value::{BindingType, BoundValue};
use crate::drivers::mysql::MysqlDialect;
use crate::drivers::sqlite::SqliteDialect;
use crate::error::{CopyError, Result};

/// Default number of rows between progress events.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10_000;

/// Knobs for [`copy_data`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    /// Visit parent tables before the tables that reference them.
    pub order_by_dependencies: bool,
    /// Emit a `RowsCopied` event every this many rows.
    pub progress_interval: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            order_by_dependencies: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Per-table result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableStats {
    pub table: String,
    pub rows: u64,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

/// Result of a data copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransferStats {
    /// Tables in the order they were copied.
    pub tables: Vec<TableStats>,
    /// Total rows across all tables.
    pub rows: u64,
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Copy the rows of every table in the schema.
///
/// Fails fast: the first source or destination error aborts the copy and
/// rows already inserted stay in the destination.
pub async fn copy_data(
    schema: &Schema,
    source: &dyn SourceReader,
    target: &dyn TargetWriter,
    mapper: &dyn TypeMapper,
    config: &TransferConfig,
    sink: &dyn EventSink,
) -> Result<TransferStats> {
    let tables = if config.order_by_dependencies {
        dependency_order(schema, sink)
    } else {
        schema.tables().collect()
    };

    info!("Copying data for {} tables", tables.len());

    let mut stats = TransferStats::default();
    for table in tables {
        let table_stats = copy_table(table, source, target, mapper, config, sink).await?;
        stats.rows += table_stats.rows;
        stats.tables.push(table_stats);
    }

    Ok(stats)
}

async fn copy_table(
    table: &Table,
    source: &dyn SourceReader,
    target: &dyn TargetWriter,
    mapper: &dyn TypeMapper,
    config: &TransferConfig,
    sink: &dyn EventSink,
) -> Result<TableStats> {
    let columns: Vec<Column> = table.columns.values().cloned().collect();
    let bindings: Vec<BindingType> = columns
        .iter()
        .map(|c| mapper.binding_type(&c.source_type))
        .collect();

    let select = MysqlDialect::new().build_projection(&table.name, &columns);
    let insert = SqliteDialect::new().build_insert_query(&table.name, columns.len());
    debug!("{}", select);
    debug!("{}", insert);

    let started = Instant::now();
    let interval = config.progress_interval.max(1);
    let mut rows = source.read_rows(&select, &columns);
    let mut count: u64 = 0;

    while let Some(row) = rows.next().await {
        let row = row.map_err(|e| match e {
            CopyError::Stream { .. } => e,
            other => CopyError::stream(&table.name, other),
        })?;

        if row.len() != bindings.len() {
            return Err(CopyError::stream(
                &table.name,
                format!("expected {} values, got {}", bindings.len(), row.len()),
            ));
        }

        let values: Vec<BoundValue> = row
            .into_iter()
            .zip(&bindings)
            .map(|(value, binding)| value.bind_as(*binding))
            .collect();

        target.insert_row(&insert, values).await?;
        count += 1;

        if count % interval == 0 {
            sink.emit(CopyEvent::RowsCopied {
                table: table.name.clone(),
                rows: count,
            });
        }
    }

    let duration = started.elapsed();
    sink.emit(CopyEvent::TableCopied {
        table: table.name.clone(),
        rows: count,
        duration_ms: duration.as_millis() as u64,
    });

    Ok(TableStats {
        table: table.name.clone(),
        rows: count,
        duration,
    })
}

/// Order tables so that referenced tables come before referencing ones.
///
/// Kahn's algorithm over foreign-key edges, ties broken by model order.
/// Self references are ignored, as are references to tables outside the
/// schema. Tables left over because of a cycle are appended in model order
/// and reported with a [`CopyEvent::DependencyCycle`] event.
pub fn dependency_order<'a>(schema: &'a Schema, sink: &dyn EventSink) -> Vec<&'a Table> {
    let tables: Vec<&Table> = schema.tables().collect();
    let n = tables.len();

    let mut indegree = vec![0usize; n];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];

    for (i, table) in tables.iter().enumerate() {
        let mut parents: Vec<usize> = table
            .referenced_tables()
            .filter_map(|name| schema.position(name))
            .filter(|&p| p != i)
            .collect();
        parents.sort_unstable();
        parents.dedup();

        for p in parents {
            indegree[i] += 1;
            children[p].push(i);
        }
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);

    while let Some(i) = ready.pop_first() {
        order.push(i);
        for &child in &children[i] {
            indegree[child] -= 1;
            if indegree[child] == 0 {
                ready.insert(child);
            }
        }
    }

    if order.len() < n {
        let placed: HashSet<usize> = order.iter().copied().collect();
        let rest: Vec<usize> = (0..n).filter(|i| !placed.contains(i)).collect();
        sink.emit(CopyEvent::DependencyCycle {
            tables: rest.iter().map(|&i| tables[i].name.clone()).collect(),
        });
        order.extend(rest);
    }

    order.into_iter().map(|i| tables[i]).collect()
}
