//! Structured observability events.
//!
//! Components never decide where diagnostics go. They receive an
//! [`EventSink`] and emit [`CopyEvent`]s; the caller picks the sink.

use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, error, info, warn};

/// Something worth reporting during a copy run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CopyEvent {
    /// The metadata loader finished building the model.
    MetadataLoaded {
        tables: usize,
        indexes: usize,
        foreign_keys: usize,
    },

    /// Rows of one foreign key disagreed on the referenced table.
    ForeignKeyRetargeted {
        table: String,
        constraint: String,
        previous: String,
        current: String,
    },

    /// A composite primary key with an auto-increment member was reduced
    /// to that single column.
    PrimaryKeyCollapsed {
        table: String,
        kept: String,
        discarded: Vec<String>,
    },

    /// An auto-increment column could not carry AUTOINCREMENT in the
    /// destination and was created as a plain column.
    AutoIncrementIgnored { table: String, column: String },

    /// A column type was passed through untranslated.
    TypePassthrough {
        table: String,
        column: String,
        source_type: String,
    },

    /// A statement was executed against the destination.
    StatementExecuted { sql: String },

    /// Foreign keys form a cycle; these tables keep model order.
    DependencyCycle { tables: Vec<String> },

    /// Periodic progress while copying a table.
    RowsCopied { table: String, rows: u64 },

    /// A table finished copying.
    TableCopied {
        table: String,
        rows: u64,
        duration_ms: u64,
    },
}

impl CopyEvent {
    /// Whether this event reports copy progress.
    pub fn is_progress(&self) -> bool {
        matches!(
            self,
            CopyEvent::RowsCopied { .. } | CopyEvent::TableCopied { .. }
        )
    }
}

/// Receiver for [`CopyEvent`]s.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: CopyEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: CopyEvent) {
        log_event(&event);
    }
}

/// Log an event at the level it deserves.
pub fn log_event(event: &CopyEvent) {
    match event {
        CopyEvent::MetadataLoaded {
            tables,
            indexes,
            foreign_keys,
        } => info!(
            "Loaded {} tables, {} indexes, {} foreign keys",
            tables, indexes, foreign_keys
        ),
        CopyEvent::ForeignKeyRetargeted {
            table,
            constraint,
            previous,
            current,
        } => warn!(
            "Foreign key {}.{} references both {} and {}; using {}",
            table, constraint, previous, current, current
        ),
        CopyEvent::PrimaryKeyCollapsed {
            table,
            kept,
            discarded,
        } => error!(
            "MULTIPLE PK WITH AUTOINCREMENT in {}: keeping {} and dropping {:?} from the key",
            table, kept, discarded
        ),
        CopyEvent::AutoIncrementIgnored { table, column } => warn!(
            "{}.{} is auto_increment but not the primary key; AUTOINCREMENT omitted",
            table, column
        ),
        CopyEvent::TypePassthrough {
            table,
            column,
            source_type,
        } => debug!(
            "{}.{}: type '{}' passed through untranslated",
            table, column, source_type
        ),
        CopyEvent::StatementExecuted { sql } => debug!("{}", sql),
        CopyEvent::DependencyCycle { tables } => warn!(
            "Foreign key cycle between {:?}; copying them in model order",
            tables
        ),
        CopyEvent::RowsCopied { table, rows } => debug!("{} - {} rows so far", table, rows),
        CopyEvent::TableCopied { table, rows, .. } => info!("{} - {} rows inserted.", table, rows),
    }
}

/// Collects events in memory. Useful for tests and UIs that poll.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<CopyEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<CopyEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: CopyEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Prints progress events as JSON lines on stderr and logs everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonProgressSink;

impl EventSink for JsonProgressSink {
    fn emit(&self, event: CopyEvent) {
        if event.is_progress() {
            if let Ok(line) = serde_json::to_string(&event) {
                eprintln!("{}", line);
            }
        }
        log_event(&event);
    }
}

impl<F> EventSink for F
where
    F: Fn(CopyEvent) + Send + Sync,
{
    fn emit(&self, event: CopyEvent) {
        self(event)
    }
}
