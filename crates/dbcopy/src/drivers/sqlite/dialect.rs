//! SQLite SQL dialect (Strategy pattern).
//!
//! SQLite accepts MySQL-style backtick quoting, which keeps the emitted DDL
//! readable next to the source schema. Parameters are numbered (`?1`).

use crate::core::traits::Dialect;

/// SQLite dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Create a new SQLite dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn quote_ident(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn param_placeholder(&self, index: usize) -> String {
        format!("?{}", index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        let dialect = SqliteDialect::new();
        assert_eq!(dialect.quote_ident("orders"), "`orders`");
        assert_eq!(dialect.quote_ident("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_build_insert_query() {
        let dialect = SqliteDialect::new();
        assert_eq!(
            dialect.build_insert_query("orders", 3),
            "INSERT INTO `orders` VALUES (?1, ?2, ?3)"
        );
    }
}
