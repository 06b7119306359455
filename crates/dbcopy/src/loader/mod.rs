//! Metadata loader.
//!
//! Reconciles the three introspection collections (columns, index columns,
//! foreign-key columns) into one [`Schema`]. Rows are accumulated into
//! private per-table builders and frozen into the read-only model once all
//! three passes are done.

use indexmap::IndexMap;
use tracing::info;

use crate::core::events::{CopyEvent, EventSink};
use crate::core::metadata::{ColumnRow, ForeignKeyColumnRow, IndexColumnRow};
use crate::core::schema::{Column, ForeignKey, Index, Schema, Table, PRIMARY_INDEX_NAME};
use crate::core::traits::SourceReader;
use crate::error::{CopyError, Result};

/// `extra` value that marks an auto-increment column. Matched exactly.
const AUTO_INCREMENT: &str = "auto_increment";

/// Fetch the three metadata collections from the source and build the model.
pub async fn load_schema(source: &dyn SourceReader, sink: &dyn EventSink) -> Result<Schema> {
    info!("Loading tables definition");
    let columns = source.column_rows().await?;

    info!("Loading indexes information");
    let index_columns = source.index_column_rows().await?;

    info!("Loading foreign key information");
    let foreign_key_columns = source.foreign_key_column_rows().await?;

    build_schema(&columns, &index_columns, &foreign_key_columns, sink)
}

/// Build the model from already-fetched metadata rows.
pub fn build_schema(
    columns: &[ColumnRow],
    index_columns: &[IndexColumnRow],
    foreign_key_columns: &[ForeignKeyColumnRow],
    sink: &dyn EventSink,
) -> Result<Schema> {
    let mut builder = SchemaBuilder::default();

    for row in columns {
        builder.add_column(row)?;
    }
    for row in index_columns {
        builder.add_index_column(row)?;
    }
    for row in foreign_key_columns {
        builder.add_foreign_key_column(row, sink)?;
    }

    let schema = builder.finish()?;

    sink.emit(CopyEvent::MetadataLoaded {
        tables: schema.len(),
        indexes: schema.index_count(),
        foreign_keys: schema.foreign_key_count(),
    });

    Ok(schema)
}

#[derive(Default)]
struct SchemaBuilder {
    tables: IndexMap<String, TableBuilder>,
}

struct TableBuilder {
    name: String,
    columns: IndexMap<String, Column>,
    indexes: IndexMap<String, Index>,
    primary_key: Option<Index>,
    foreign_keys: IndexMap<String, ForeignKey>,
}

impl SchemaBuilder {
    fn table_mut(&mut self, name: &str) -> Result<&mut TableBuilder> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| CopyError::missing_table(name))
    }

    fn add_column(&mut self, row: &ColumnRow) -> Result<()> {
        let table = self
            .tables
            .entry(row.table_name.clone())
            .or_insert_with(|| TableBuilder::new(&row.table_name));

        if table.columns.contains_key(&row.column_name) {
            return Err(CopyError::conflict(
                &row.table_name,
                format!("column '{}' reported twice", row.column_name),
            ));
        }

        table.columns.insert(
            row.column_name.clone(),
            Column {
                name: row.column_name.clone(),
                source_type: row.column_type.clone(),
                is_nullable: row.is_nullable != "NO",
                is_auto_increment: row.extra == AUTO_INCREMENT,
            },
        );
        Ok(())
    }

    fn add_index_column(&mut self, row: &IndexColumnRow) -> Result<()> {
        let table = self.table_mut(&row.table_name)?;

        let index = if row.index_name == PRIMARY_INDEX_NAME {
            table
                .primary_key
                .get_or_insert_with(|| Index::new(PRIMARY_INDEX_NAME))
        } else {
            table
                .indexes
                .entry(row.index_name.clone())
                .or_insert_with(|| Index::new(&row.index_name))
        };

        if index.contains(&row.column_name) {
            return Err(CopyError::conflict(
                &row.table_name,
                format!(
                    "column '{}' listed twice in index '{}'",
                    row.column_name, row.index_name
                ),
            ));
        }

        index.columns.push(row.column_name.clone());
        Ok(())
    }

    fn add_foreign_key_column(
        &mut self,
        row: &ForeignKeyColumnRow,
        sink: &dyn EventSink,
    ) -> Result<()> {
        let table = self.table_mut(&row.table_name)?;

        let fk = table
            .foreign_keys
            .entry(row.constraint_name.clone())
            .or_insert_with(|| {
                ForeignKey::new(&row.constraint_name, &row.referenced_table_name)
            });

        if fk.ref_table != row.referenced_table_name {
            sink.emit(CopyEvent::ForeignKeyRetargeted {
                table: row.table_name.clone(),
                constraint: row.constraint_name.clone(),
                previous: fk.ref_table.clone(),
                current: row.referenced_table_name.clone(),
            });
            fk.ref_table = row.referenced_table_name.clone();
        }

        fk.push_pair(&row.column_name, &row.referenced_column_name);
        Ok(())
    }

    fn finish(self) -> Result<Schema> {
        let mut schema = Schema::new();
        for (_, table) in self.tables {
            schema.insert(table.freeze()?);
        }
        Ok(schema)
    }
}

impl TableBuilder {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: IndexMap::new(),
            indexes: IndexMap::new(),
            primary_key: None,
            foreign_keys: IndexMap::new(),
        }
    }

    fn require_columns<'a>(&self, names: impl IntoIterator<Item = &'a String>) -> Result<()> {
        for name in names {
            if !self.columns.contains_key(name) {
                return Err(CopyError::missing_column(&self.name, name));
            }
        }
        Ok(())
    }

    /// Check every key reference and turn the builder into a [`Table`].
    fn freeze(self) -> Result<Table> {
        if let Some(pk) = &self.primary_key {
            self.require_columns(&pk.columns)?;
        }
        for index in self.indexes.values() {
            self.require_columns(&index.columns)?;
        }
        for fk in self.foreign_keys.values() {
            self.require_columns(&fk.columns)?;
        }

        Ok(Table {
            name: self.name,
            columns: self.columns,
            indexes: self.indexes,
            primary_key: self.primary_key,
            foreign_keys: self.foreign_keys,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::RecordingSink;
    use crate::error::LookupKind;

    fn col(table: &str, name: &str, ty: &str, nullable: &str, extra: &str) -> ColumnRow {
        ColumnRow::new(table, name, ty, nullable, extra)
    }

    fn orders_columns() -> Vec<ColumnRow> {
        vec![
            col("customers", "id", "int(11)", "NO", "auto_increment"),
            col("customers", "name", "varchar(100)", "YES", ""),
            col("orders", "id", "int(11) unsigned", "NO", "auto_increment"),
            col("orders", "customer_id", "int(11)", "NO", ""),
            col("orders", "region", "char(2)", "NO", ""),
            col("orders", "note", "text", "YES", ""),
        ]
    }

    #[test]
    fn test_columns_grouped_by_table_in_order() {
        let sink = RecordingSink::new();
        let schema = build_schema(&orders_columns(), &[], &[], &sink).unwrap();

        let tables: Vec<_> = schema.tables().map(|t| t.name.as_str()).collect();
        assert_eq!(tables, vec!["customers", "orders"]);

        let orders = schema.get("orders").unwrap();
        assert_eq!(
            orders.column_names(),
            vec!["id", "customer_id", "region", "note"]
        );
        let id = orders.column("id").unwrap();
        assert!(id.is_auto_increment);
        assert!(!id.is_nullable);
        assert_eq!(id.source_type, "int(11) unsigned");
        assert!(orders.column("note").unwrap().is_nullable);
    }

    #[test]
    fn test_auto_increment_is_an_exact_match() {
        let rows = vec![
            col("t", "a", "int", "NO", "auto_increment"),
            col("t", "b", "int", "NO", "AUTO_INCREMENT"),
            col("t", "c", "int", "NO", "auto_increment on update"),
        ];
        let schema = build_schema(&rows, &[], &[], &RecordingSink::new()).unwrap();
        let t = schema.get("t").unwrap();
        assert!(t.column("a").unwrap().is_auto_increment);
        assert!(!t.column("b").unwrap().is_auto_increment);
        assert!(!t.column("c").unwrap().is_auto_increment);
    }

    #[test]
    fn test_nullability_only_false_for_no() {
        let rows = vec![
            col("t", "a", "int", "NO", ""),
            col("t", "b", "int", "YES", ""),
            col("t", "c", "int", "", ""),
        ];
        let schema = build_schema(&rows, &[], &[], &RecordingSink::new()).unwrap();
        let t = schema.get("t").unwrap();
        assert!(!t.column("a").unwrap().is_nullable);
        assert!(t.column("b").unwrap().is_nullable);
        assert!(t.column("c").unwrap().is_nullable);
    }

    #[test]
    fn test_primary_key_goes_to_its_own_slot() {
        let indexes = vec![
            IndexColumnRow::new("orders", "PRIMARY", "id", 1),
            IndexColumnRow::new("orders", "PRIMARY", "region", 2),
            IndexColumnRow::new("orders", "idx_customer", "customer_id", 1),
            IndexColumnRow::new("orders", "idx_customer", "region", 2),
        ];
        let schema =
            build_schema(&orders_columns(), &indexes, &[], &RecordingSink::new()).unwrap();
        let orders = schema.get("orders").unwrap();

        assert_eq!(orders.pk_columns(), ["id", "region"]);
        assert!(!orders.indexes.contains_key("PRIMARY"));
        assert_eq!(
            orders.indexes["idx_customer"].columns,
            vec!["customer_id", "region"]
        );
    }

    #[test]
    fn test_index_columns_follow_row_order_not_ordinal() {
        // The source is trusted to deliver rows ordinal-ordered.
        let indexes = vec![
            IndexColumnRow::new("orders", "idx", "region", 2),
            IndexColumnRow::new("orders", "idx", "customer_id", 1),
        ];
        let schema =
            build_schema(&orders_columns(), &indexes, &[], &RecordingSink::new()).unwrap();
        assert_eq!(
            schema.get("orders").unwrap().indexes["idx"].columns,
            vec!["region", "customer_id"]
        );
    }

    #[test]
    fn test_same_index_name_on_two_tables_stays_separate() {
        let indexes = vec![
            IndexColumnRow::new("customers", "idx1", "name", 1),
            IndexColumnRow::new("orders", "idx1", "note", 1),
        ];
        let schema =
            build_schema(&orders_columns(), &indexes, &[], &RecordingSink::new()).unwrap();
        assert_eq!(schema.get("customers").unwrap().indexes["idx1"].columns, vec!["name"]);
        assert_eq!(schema.get("orders").unwrap().indexes["idx1"].columns, vec!["note"]);
    }

    #[test]
    fn test_two_rows_of_one_constraint_build_one_foreign_key() {
        let fks = vec![
            ForeignKeyColumnRow::new("fk_order_customer", "orders", "customer_id", "customers", "id", 1),
            ForeignKeyColumnRow::new("fk_order_customer", "orders", "region", "customers", "name", 2),
        ];
        let schema = build_schema(&orders_columns(), &[], &fks, &RecordingSink::new()).unwrap();
        let orders = schema.get("orders").unwrap();

        assert_eq!(orders.foreign_keys.len(), 1);
        let fk = &orders.foreign_keys["fk_order_customer"];
        assert_eq!(fk.ref_table, "customers");
        assert_eq!(fk.columns, vec!["customer_id", "region"]);
        assert_eq!(fk.ref_columns, vec!["id", "name"]);
    }

    #[test]
    fn test_two_constraints_to_the_same_table_stay_distinct() {
        let fks = vec![
            ForeignKeyColumnRow::new("fk_a", "orders", "customer_id", "customers", "id", 1),
            ForeignKeyColumnRow::new("fk_b", "orders", "region", "customers", "id", 1),
        ];
        let schema = build_schema(&orders_columns(), &[], &fks, &RecordingSink::new()).unwrap();
        let orders = schema.get("orders").unwrap();

        assert_eq!(orders.foreign_keys.len(), 2);
        assert_eq!(orders.foreign_keys["fk_a"].columns, vec!["customer_id"]);
        assert_eq!(orders.foreign_keys["fk_b"].columns, vec!["region"]);
    }

    #[test]
    fn test_disagreeing_referenced_table_is_reported() {
        let fks = vec![
            ForeignKeyColumnRow::new("fk", "orders", "customer_id", "customers", "id", 1),
            ForeignKeyColumnRow::new("fk", "orders", "region", "regions", "code", 2),
        ];
        let sink = RecordingSink::new();
        let schema = build_schema(&orders_columns(), &[], &fks, &sink).unwrap();

        assert_eq!(schema.get("orders").unwrap().foreign_keys["fk"].ref_table, "regions");
        assert!(sink
            .events()
            .iter()
            .any(|e| matches!(e, CopyEvent::ForeignKeyRetargeted { previous, .. } if previous == "customers")));
    }

    #[test]
    fn test_index_row_for_unknown_table_fails() {
        let indexes = vec![IndexColumnRow::new("ghost", "PRIMARY", "id", 1)];
        let err = build_schema(&orders_columns(), &indexes, &[], &RecordingSink::new())
            .unwrap_err();
        match err {
            CopyError::Lookup { kind, name, .. } => {
                assert_eq!(kind, LookupKind::Table);
                assert_eq!(name, "ghost");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_foreign_key_row_for_unknown_table_fails() {
        let fks = vec![ForeignKeyColumnRow::new("fk", "ghost", "a", "orders", "id", 1)];
        let err =
            build_schema(&orders_columns(), &[], &fks, &RecordingSink::new()).unwrap_err();
        assert!(matches!(err, CopyError::Lookup { kind: LookupKind::Table, .. }));
    }

    #[test]
    fn test_dangling_key_column_is_rejected() {
        let indexes = vec![IndexColumnRow::new("orders", "PRIMARY", "missing", 1)];
        let err = build_schema(&orders_columns(), &indexes, &[], &RecordingSink::new())
            .unwrap_err();
        match err {
            CopyError::Lookup { kind, table, name } => {
                assert_eq!(kind, LookupKind::Column);
                assert_eq!(table, "orders");
                assert_eq!(name, "missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_loaded_keys_never_dangle() {
        let indexes = vec![
            IndexColumnRow::new("customers", "PRIMARY", "id", 1),
            IndexColumnRow::new("orders", "PRIMARY", "id", 1),
            IndexColumnRow::new("orders", "idx", "customer_id", 1),
        ];
        let schema =
            build_schema(&orders_columns(), &indexes, &[], &RecordingSink::new()).unwrap();
        for table in schema.tables() {
            for name in table.pk_columns() {
                assert!(table.columns.contains_key(name));
            }
            for index in table.indexes.values() {
                for name in &index.columns {
                    assert!(table.columns.contains_key(name));
                }
            }
        }
    }

    #[test]
    fn test_duplicate_column_is_a_conflict() {
        let rows = vec![
            col("t", "a", "int", "NO", ""),
            col("t", "a", "int", "NO", ""),
        ];
        let err = build_schema(&rows, &[], &[], &RecordingSink::new()).unwrap_err();
        assert!(matches!(err, CopyError::MetadataConflict { .. }));
    }

    #[test]
    fn test_repeated_index_column_is_a_conflict() {
        let indexes = vec![
            IndexColumnRow::new("orders", "idx", "region", 1),
            IndexColumnRow::new("orders", "idx", "region", 2),
        ];
        let err = build_schema(&orders_columns(), &indexes, &[], &RecordingSink::new())
            .unwrap_err();
        assert!(matches!(err, CopyError::MetadataConflict { .. }));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let rows = vec![
            col("Orders", "id", "int", "NO", ""),
            col("orders", "id", "int", "NO", ""),
        ];
        let indexes = vec![IndexColumnRow::new("orders", "primary", "id", 1)];
        let schema = build_schema(&rows, &indexes, &[], &RecordingSink::new()).unwrap();

        assert_eq!(schema.len(), 2);
        let orders = schema.get("orders").unwrap();
        assert!(orders.primary_key.is_none());
        assert!(orders.indexes.contains_key("primary"));
    }

    #[test]
    fn test_metadata_loaded_event() {
        let sink = RecordingSink::new();
        let indexes = vec![IndexColumnRow::new("orders", "idx", "note", 1)];
        build_schema(&orders_columns(), &indexes, &[], &sink).unwrap();
        assert_eq!(
            sink.events().last(),
            Some(&CopyEvent::MetadataLoaded {
                tables: 2,
                indexes: 1,
                foreign_keys: 0
            })
        );
    }
}
