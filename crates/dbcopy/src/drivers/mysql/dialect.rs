//! MySQL/MariaDB SQL dialect (Strategy pattern).
//!
//! Provides MySQL-specific identifier quoting and parameter placeholders.
//! Used to build the per-table projection query run against the source.

use crate::core::schema::Column;
use crate::core::traits::Dialect;

/// Lowercased base type of a column descriptor: `int(11) unsigned` → `int`.
pub(crate) fn base_type(source_type: &str) -> String {
    source_type
        .trim()
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Base types projected as `CAST(... AS CHAR)` and read back as text.
///
/// Only the text form holds every value of these types:
/// - DECIMAL up to 65 digits
/// - TIME within ±838:59:59
/// - zero dates such as `0000-00-00`
pub(crate) fn reads_as_text(base: &str) -> bool {
    matches!(
        base,
        "decimal" | "numeric" | "dec" | "fixed" | "date" | "datetime" | "timestamp" | "time"
    )
}

/// MySQL/MariaDB dialect implementation.
///
/// Compatible with MySQL 5.7+, 8.0+, and MariaDB 10.2+.
#[derive(Debug, Clone, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    /// Create a new MySQL dialect instance.
    pub fn new() -> Self {
        Self
    }

    /// Projection of every column of a table, in order. Columns whose type
    /// [`reads_as_text`] are cast to CHAR and keep their name as alias.
    pub fn build_projection(&self, table: &str, columns: &[Column]) -> String {
        let exprs = columns
            .iter()
            .map(|col| {
                let quoted = self.quote_ident(&col.name);
                if reads_as_text(&base_type(&col.source_type)) {
                    format!("CAST({} AS CHAR) AS {}", quoted, quoted)
                } else {
                    quoted
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("SELECT {} FROM {}", exprs, self.quote_ident(table))
    }
}

impl Dialect for MysqlDialect {
    fn name(&self) -> &str {
        "mysql"
    }

    fn quote_ident(&self, name: &str) -> String {
        // Backticks, doubled when embedded
        format!("`{}`", name.replace('`', "``"))
    }

    fn param_placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        let dialect = MysqlDialect::new();
        assert_eq!(dialect.quote_ident("name"), "`name`");
        assert_eq!(dialect.quote_ident("table`name"), "`table``name`");
        assert_eq!(dialect.quote_ident("Users"), "`Users`");
    }

    #[test]
    fn test_param_placeholder() {
        let dialect = MysqlDialect::new();
        assert_eq!(dialect.param_placeholder(1), "?");
        assert_eq!(dialect.param_placeholder(10), "?");
    }

    #[test]
    fn test_projection_keeps_column_order() {
        let dialect = MysqlDialect::new();
        let sql = dialect.build_projection(
            "Users",
            &[
                column("Name", "varchar(20)"),
                column("Id", "int(11)"),
                column("order", "tinyint(1)"),
            ],
        );
        assert_eq!(sql, "SELECT `Name`, `Id`, `order` FROM `Users`");
    }

    fn column(name: &str, source_type: &str) -> Column {
        Column {
            name: name.to_string(),
            source_type: source_type.to_string(),
            is_nullable: true,
            is_auto_increment: false,
        }
    }

    #[test]
    fn test_base_type() {
        assert_eq!(base_type("int(11) unsigned"), "int");
        assert_eq!(base_type("DECIMAL(18,2)"), "decimal");
        assert_eq!(base_type("enum('a','b')"), "enum");
        assert_eq!(base_type("longtext"), "longtext");
        assert_eq!(base_type("  bigint unsigned"), "bigint");
    }

    #[test]
    fn test_exact_text_types() {
        for ty in ["decimal(65,30)", "NUMERIC(10)", "date", "datetime(6)", "timestamp", "time(3)"] {
            assert!(reads_as_text(&base_type(ty)), "{ty}");
        }
        for ty in ["int(11)", "varchar(10)", "blob", "double", "year", "bit(1)"] {
            assert!(!reads_as_text(&base_type(ty)), "{ty}");
        }
    }

    #[test]
    fn test_projection_casts_exact_text_columns() {
        let dialect = MysqlDialect::new();
        let sql = dialect.build_projection(
            "shifts",
            &[
                column("id", "int(11)"),
                column("length", "time"),
                column("amount", "decimal(65,1)"),
                column("opened", "datetime"),
                column("note", "text"),
            ],
        );
        assert_eq!(
            sql,
            "SELECT `id`, CAST(`length` AS CHAR) AS `length`, \
             CAST(`amount` AS CHAR) AS `amount`, CAST(`opened` AS CHAR) AS `opened`, \
             `note` FROM `shifts`"
        );
    }
}
