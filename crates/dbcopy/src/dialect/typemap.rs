//! MySQL → SQLite type classification.
//!
//! Two independent rule lists live here. [`classify_ddl`] picks the column
//! type keyword written into `CREATE TABLE`; [`classify_binding`] picks how a
//! value of that column is marshalled on insert. All matching is
//! case-insensitive on the raw MySQL descriptor (e.g. `int(11) unsigned`).

use crate::core::traits::{TypeMapper, TypeMapping};
use crate::core::value::BindingType;

/// Width-less integer keywords reported by MySQL 8.0.19+.
const INTEGER_KEYWORDS: &[&str] = &["TINYINT", "SMALLINT", "MEDIUMINT", "BIGINT"];

/// Destination type for a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DdlType {
    /// SQLite `INTEGER` storage class.
    Integer,
    /// SQLite `TEXT` storage class.
    Text,
    /// Descriptor handed to SQLite as-is, `UNSIGNED` removed.
    Passthrough(String),
}

impl DdlType {
    /// Keyword written into the column definition.
    pub fn keyword(&self) -> &str {
        match self {
            DdlType::Integer => "INTEGER",
            DdlType::Text => "TEXT",
            DdlType::Passthrough(raw) => raw,
        }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, DdlType::Passthrough(_))
    }
}

/// Classify a MySQL column descriptor into a SQLite column type.
pub fn classify_ddl(source_type: &str) -> DdlType {
    let stripped = strip_unsigned(source_type);
    let upper = stripped.to_ascii_uppercase();

    if upper.starts_with("INT")
        || upper.starts_with("BIT")
        || upper.contains("INT(")
        || is_integer_keyword(&upper)
    {
        DdlType::Integer
    } else if upper.starts_with("ENUM") || upper.starts_with("SET") {
        DdlType::Text
    } else {
        DdlType::Passthrough(stripped)
    }
}

/// SQLite type keyword for a MySQL column descriptor.
pub fn sqlite_type(source_type: &str) -> String {
    classify_ddl(source_type).keyword().to_string()
}

/// Classify a MySQL column descriptor into an insert binding type.
///
/// Rules are checked last-to-first: a later rule overrides an earlier one,
/// so `MEDIUMBLOB` ends up `Binary` and `ENUM('INT')` ends up `Text`.
pub fn classify_binding(source_type: &str) -> BindingType {
    let upper = source_type.trim().to_ascii_uppercase();

    if upper.contains("BLOB") {
        BindingType::Binary
    } else if upper.starts_with("ENUM") || upper.starts_with("SET") {
        BindingType::Text
    } else if upper.starts_with("DATETIME") {
        BindingType::Temporal
    } else if upper.starts_with("DECIMAL") {
        BindingType::Numeric
    } else if upper.starts_with("INT") || upper.starts_with("BOOL") || is_integer_keyword(&upper)
    {
        BindingType::Integer
    } else {
        BindingType::Text
    }
}

/// Whether the leading keyword of an uppercased descriptor is one of the
/// sized integer types, with or without a display width.
fn is_integer_keyword(upper: &str) -> bool {
    let keyword = upper
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or_default();
    INTEGER_KEYWORDS.contains(&keyword)
}

/// Remove every `UNSIGNED` token (any case) and collapse whitespace.
/// The remaining text keeps its original casing.
fn strip_unsigned(source_type: &str) -> String {
    source_type
        .split_whitespace()
        .map(|word| remove_ascii_case_insensitive(word, "UNSIGNED"))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn remove_ascii_case_insensitive(haystack: &str, needle: &str) -> String {
    let upper = haystack.to_ascii_uppercase();
    let mut out = String::with_capacity(haystack.len());
    let mut rest = 0;
    let mut from = 0;
    while let Some(pos) = upper[from..].find(needle) {
        let start = from + pos;
        out.push_str(&haystack[rest..start]);
        rest = start + needle.len();
        from = rest;
    }
    out.push_str(&haystack[rest..]);
    out
}

/// MySQL → SQLite type mapper.
///
/// Integers (including `BIT`) become `INTEGER`, `ENUM`/`SET` become `TEXT`,
/// everything else is passed through for SQLite's affinity rules to handle.
#[derive(Debug, Clone, Default)]
pub struct MysqlToSqliteMapper;

impl MysqlToSqliteMapper {
    pub fn new() -> Self {
        Self
    }
}

impl TypeMapper for MysqlToSqliteMapper {
    fn source_dialect(&self) -> &str {
        "mysql"
    }

    fn target_dialect(&self) -> &str {
        "sqlite"
    }

    fn map_type(&self, source_type: &str) -> TypeMapping {
        let ddl = classify_ddl(source_type);
        if ddl.is_passthrough() {
            TypeMapping::passthrough(ddl.keyword())
        } else {
            TypeMapping::translated(ddl.keyword())
        }
    }

    fn binding_type(&self, source_type: &str) -> BindingType {
        classify_binding(source_type)
    }
}
