//! Dialect translation between MySQL and SQLite.
//!
//! - [`MysqlToSqliteMapper`]: the [`TypeMapper`](crate::core::TypeMapper)
//!   used by the DDL emitter and the data copy engine
//! - [`classify_ddl`] / [`sqlite_type`]: column type in `CREATE TABLE`
//! - [`classify_binding`]: value marshalling on insert
//!
//! ```rust,ignore
//! let mapper = MysqlToSqliteMapper::new();
//! let mapping = mapper.map_column(&column);
//! let binding = mapper.binding_type(&column.source_type);
//! ```

mod typemap;

pub use typemap::{classify_binding, classify_ddl, sqlite_type, DdlType, MysqlToSqliteMapper};
