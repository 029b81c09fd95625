//! Table metadata as introspected at runtime.
//!
//! The administered schema is externally owned and assumed fixed for the
//! process lifetime; nothing here models constraints beyond what the column
//! listing reports.

use serde::{Deserialize, Serialize};

/// One column as reported by `SHOW COLUMNS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Raw type text, e.g. `int(11) unsigned`, `varchar(50)`, `date`
    pub sql_type: String,
    pub nullable: bool,
    /// Key marker as reported by the server (`PRI`, `UNI`, `MUL`, or empty)
    pub key: String,
}

impl ColumnInfo {
    /// The type name without length or attribute suffix (`int(11) unsigned`
    /// becomes `int`).
    pub fn base_type(&self) -> &str {
        let t = self.sql_type.as_str();
        let end = t
            .find(|c: char| c == '(' || c == ' ')
            .unwrap_or(t.len());
        &t[..end]
    }

    /// Integer family, in any width or signedness.
    pub fn is_integer(&self) -> bool {
        matches!(
            self.base_type().to_ascii_lowercase().as_str(),
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint"
        )
    }

    /// A plain DATE column. DATETIME/TIMESTAMP carry a time-of-day part and
    /// are not held to the `YYYY-MM-DD` entry format.
    pub fn is_date(&self) -> bool {
        self.base_type().eq_ignore_ascii_case("date")
    }
}

/// Ordered column list for one table, first column assumed to be the
/// identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<ColumnInfo>,
}

impl TableSchema {
    pub fn new(table: impl Into<String>, columns: Vec<ColumnInfo>) -> Self {
        Self {
            table: table.into(),
            columns,
        }
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// The identity column, by convention the first one.
    pub fn identity_column(&self) -> Option<&str> {
        self.columns.first().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
