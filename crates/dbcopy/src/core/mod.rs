//! Core abstractions for the copy engine.
//!
//! - [`schema`]: Relational model (tables, columns, indexes, foreign keys)
//! - [`metadata`]: Typed introspection rows produced by source drivers
//! - [`value`]: Source values, binding types and bound destination values
//! - [`traits`]: Reader, writer, dialect and type mapper abstractions
//! - [`events`]: Observability events and sinks
//!
//! The core module is database-agnostic. Driver modules (`drivers/mysql`,
//! `drivers/sqlite`) implement its traits.

pub mod events;
pub mod metadata;
pub mod schema;
pub mod traits;
pub mod value;

pub use events::{CopyEvent, EventSink, JsonProgressSink, RecordingSink, TracingSink};
pub use metadata::{ColumnRow, ForeignKeyColumnRow, IndexColumnRow};
pub use schema::{Column, ForeignKey, Index, Schema, Table, PRIMARY_INDEX_NAME};
pub use traits::{ColumnMapping, Dialect, SourceReader, TargetWriter, TypeMapper, TypeMapping};
pub use value::{BindingType, BoundValue, Row, SqlValue};
