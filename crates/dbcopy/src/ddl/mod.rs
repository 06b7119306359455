//! DDL emitter.
//!
//! Turns a loaded [`Schema`] into SQLite `CREATE TABLE` / `CREATE INDEX`
//! statements and runs them against the destination. Planning is pure so the
//! same statements can be printed (`dbcopy plan`) or executed.
//!
//! SQLite only allows `AUTOINCREMENT` on a single-column `INTEGER PRIMARY
//! KEY`, so a composite key with an auto-increment member is collapsed to
//! that member and the loss is reported as a
//! [`CopyEvent::PrimaryKeyCollapsed`] event.

use serde::Serialize;
use tracing::info;

use crate::core::events::{CopyEvent, EventSink};
use crate::core::schema::{Schema, Table};
use crate::core::traits::{Dialect, TargetWriter, TypeMapper};
use crate::drivers::sqlite::SqliteDialect;
use crate::error::Result;

/// Statements needed to recreate a schema, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DdlPlan {
    /// One `CREATE TABLE` per table, in model order.
    pub tables: Vec<String>,
    /// One `CREATE INDEX` per secondary index, after all tables.
    pub indexes: Vec<String>,
}

impl DdlPlan {
    /// All statements: tables first, then indexes.
    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.tables
            .iter()
            .chain(self.indexes.iter())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len() + self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build every destination statement for the schema.
pub fn plan_schema(schema: &Schema, mapper: &dyn TypeMapper, sink: &dyn EventSink) -> DdlPlan {
    let dialect = SqliteDialect::new();
    let mut plan = DdlPlan::default();

    for table in schema.tables() {
        plan.tables
            .push(create_table_sql(&dialect, table, mapper, sink));
    }

    for table in schema.tables() {
        for index in table.indexes.values() {
            let name = format!("{}_{}", index.name, table.name);
            plan.indexes.push(format!(
                "CREATE INDEX {} ON {} ({})",
                dialect.quote_ident(&name),
                dialect.quote_ident(&table.name),
                quote_list(&dialect, &index.columns)
            ));
        }
    }

    plan
}

/// Execute a plan against the destination, one statement at a time.
pub async fn emit_schema(
    plan: &DdlPlan,
    target: &dyn TargetWriter,
    sink: &dyn EventSink,
) -> Result<()> {
    info!("Creating tables in destination");
    for sql in &plan.tables {
        execute(target, sql, sink).await?;
    }

    if !plan.indexes.is_empty() {
        info!("Creating {} indexes", plan.indexes.len());
    }
    for sql in &plan.indexes {
        execute(target, sql, sink).await?;
    }

    info!("Done");
    Ok(())
}

async fn execute(target: &dyn TargetWriter, sql: &str, sink: &dyn EventSink) -> Result<()> {
    sink.emit(CopyEvent::StatementExecuted {
        sql: sql.to_string(),
    });
    target.execute(sql).await?;
    Ok(())
}

/// The primary key as it will exist in the destination.
struct EffectiveKey {
    columns: Vec<String>,
    /// Column carrying `PRIMARY KEY AUTOINCREMENT` inline, if any.
    inline: Option<String>,
}

fn effective_key(table: &Table, mapper: &dyn TypeMapper, sink: &dyn EventSink) -> EffectiveKey {
    let pk = table.pk_columns();

    // First auto-increment member in key order that maps onto INTEGER.
    let auto = pk.iter().find(|name| {
        table.column(name).is_some_and(|col| {
            col.is_auto_increment && !mapper.map_type(&col.source_type).passthrough
        })
    });

    match auto {
        Some(kept) => {
            if pk.len() > 1 {
                sink.emit(CopyEvent::PrimaryKeyCollapsed {
                    table: table.name.clone(),
                    kept: kept.clone(),
                    discarded: pk.iter().filter(|c| *c != kept).cloned().collect(),
                });
            }
            EffectiveKey {
                columns: vec![kept.clone()],
                inline: Some(kept.clone()),
            }
        }
        None => EffectiveKey {
            columns: pk.to_vec(),
            inline: None,
        },
    }
}

fn create_table_sql(
    dialect: &dyn Dialect,
    table: &Table,
    mapper: &dyn TypeMapper,
    sink: &dyn EventSink,
) -> String {
    let key = effective_key(table, mapper, sink);
    let mut parts = Vec::with_capacity(table.columns.len() + table.foreign_keys.len() + 1);

    for col in table.columns.values() {
        let mapping = mapper.map_column(col);
        if mapping.passthrough {
            sink.emit(CopyEvent::TypePassthrough {
                table: table.name.clone(),
                column: col.name.clone(),
                source_type: col.source_type.clone(),
            });
        }

        let mut def = format!(
            "{} {} {}",
            dialect.quote_ident(&col.name),
            mapping.target_type,
            if mapping.is_nullable { "NULL" } else { "NOT NULL" }
        );

        if key.inline.as_deref() == Some(col.name.as_str()) {
            def.push_str(" PRIMARY KEY AUTOINCREMENT");
        } else if col.is_auto_increment {
            sink.emit(CopyEvent::AutoIncrementIgnored {
                table: table.name.clone(),
                column: col.name.clone(),
            });
        }

        parts.push(def);
    }

    if key.inline.is_none() && !key.columns.is_empty() {
        parts.push(format!("PRIMARY KEY ({})", quote_list(dialect, &key.columns)));
    }

    for fk in table.foreign_keys.values() {
        parts.push(format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            dialect.quote_ident(&fk.name),
            quote_list(dialect, &fk.columns),
            dialect.quote_ident(&fk.ref_table),
            quote_list(dialect, &fk.ref_columns)
        ));
    }

    format!(
        "CREATE TABLE {} ({})",
        dialect.quote_ident(&table.name),
        parts.join(", ")
    )
}

fn quote_list(dialect: &dyn Dialect, names: &[String]) -> String {
    names
        .iter()
        .map(|n| dialect.quote_ident(n))
        .collect::<Vec<_>>()
        .join(", ")
}
