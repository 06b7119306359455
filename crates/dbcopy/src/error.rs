//! Error types for the copy library.

use thiserror::Error;

/// Main error type for copy operations.
#[derive(Error, Debug)]
pub enum CopyError {
    /// Configuration error (invalid YAML, missing fields, bad CLI input, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source database connection or query error
    #[error("Source database error: {0}")]
    Source(#[from] sqlx::Error),

    /// Connection pool error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// A metadata row references a table or column missing from the model
    #[error("Lookup failed: {}", lookup_message(*kind, table, name))]
    Lookup {
        kind: LookupKind,
        table: String,
        name: String,
    },

    /// Metadata rows contradict each other (duplicate column, repeated index column)
    #[error("Conflicting metadata for table {table}: {message}")]
    MetadataConflict { table: String, message: String },

    /// The destination rejected a DDL or DML statement
    #[error("Statement failed: {source}\n  SQL: {sql}")]
    Execution {
        sql: String,
        #[source]
        source: sqlx::Error,
    },

    /// The source row stream failed mid-table
    #[error("Row stream failed for table {table}: {message}")]
    Stream { table: String, message: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What a failed metadata lookup was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Table,
    Column,
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupKind::Table => f.write_str("table"),
            LookupKind::Column => f.write_str("column"),
        }
    }
}

fn lookup_message(kind: LookupKind, table: &str, name: &str) -> String {
    match kind {
        LookupKind::Table => format!("table '{}' not found", table),
        LookupKind::Column => format!("column '{}' not found in table '{}'", name, table),
    }
}

impl CopyError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl std::fmt::Display, context: impl Into<String>) -> Self {
        CopyError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Lookup failure for a table name that has no column metadata.
    pub fn missing_table(table: impl Into<String>) -> Self {
        let table = table.into();
        CopyError::Lookup {
            kind: LookupKind::Table,
            name: table.clone(),
            table,
        }
    }

    /// Lookup failure for a column that is not part of its table.
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        CopyError::Lookup {
            kind: LookupKind::Column,
            table: table.into(),
            name: column.into(),
        }
    }

    /// Create a MetadataConflict error
    pub fn conflict(table: impl Into<String>, message: impl Into<String>) -> Self {
        CopyError::MetadataConflict {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create an Execution error for a rejected statement
    pub fn execution(sql: impl Into<String>, source: sqlx::Error) -> Self {
        CopyError::Execution {
            sql: sql.into(),
            source,
        }
    }

    /// Create a Stream error
    pub fn stream(table: impl Into<String>, message: impl std::fmt::Display) -> Self {
        CopyError::Stream {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CopyError::Config(_) | CopyError::Yaml(_) => 1,
            CopyError::Source(_) | CopyError::Pool { .. } => 2,
            CopyError::Lookup { .. } | CopyError::MetadataConflict { .. } => 3,
            CopyError::Execution { .. } => 4,
            CopyError::Stream { .. } => 5,
            CopyError::Io(_) => 7,
            CopyError::Json(_) => 8,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for copy operations.
pub type Result<T> = std::result::Result<T, CopyError>;
