//! SQLite database driver.
//!
//! - [`SqliteDialect`]: SQL syntax strategy
//! - [`SqliteWriter`]: Destination database writer
//!
//! # Destination
//!
//! Either a plain file path (created if missing) or an SQLx URL:
//! ```text
//! sqlite://path/to/file.db
//! ```

mod dialect;
mod writer;

pub use dialect::SqliteDialect;
pub use writer::SqliteWriter;
