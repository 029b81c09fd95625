/// Structured error types for the haulctl data layer.
///
/// Uses `thiserror` for better API surface and error composition.
/// The CLI binary can still use `anyhow` for convenience, but library
/// consumers get structured, composable errors.
use thiserror::Error;

/// Main error type for data-access operations.
///
/// Every failure crossing the engine boundary is one of these kinds; a
/// raw driver error never reaches the caller.
#[derive(Debug, Error)]
pub enum DataError {
    /// Pool and direct-connect fallback both failed
    #[error("database unavailable: {reason}")]
    Connection { reason: String },

    /// Table metadata could not be fetched
    #[error("schema lookup failed for table '{table}': {reason}")]
    SchemaLookup { table: String, reason: String },

    /// User-correctable input problem, caught before any statement is built
    #[error("{message}")]
    Validation { message: String },

    /// Identifier rejected by the allow-list check
    #[error("invalid identifier '{ident}'")]
    InvalidIdentifier { ident: String },

    /// Key constraint rejected the statement
    #[error("{kind}")]
    Constraint { kind: ConstraintKind, detail: String },

    /// Any other statement failure
    #[error("query failed ({operation} on {table}): {reason}")]
    Query {
        table: String,
        operation: &'static str,
        reason: String,
    },

    /// Configuration error
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

/// The two constraint failures the UI distinguishes for the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// The record is referenced by rows in another table
    ForeignKeyInUse,
    /// An identical primary or unique key already exists
    DuplicateKey,
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintKind::ForeignKeyInUse => write!(
                f,
                "cannot modify this record because it is being used by other records"
            ),
            ConstraintKind::DuplicateKey => {
                write!(f, "a record with this ID or unique key already exists")
            }
        }
    }
}

impl ConstraintKind {
    /// Recognize a constraint failure from the driver's error text.
    ///
    /// MySQL reports these as "...foreign key constraint fails..." (errno
    /// 1451/1452) and "Duplicate entry '...' for key ..." (errno 1062).
    pub fn from_driver_text(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower.contains("foreign key constraint fails") {
            Some(ConstraintKind::ForeignKeyInUse)
        } else if lower.contains("duplicate entry") {
            Some(ConstraintKind::DuplicateKey)
        } else {
            None
        }
    }
}

impl DataError {
    /// Create a connection error
    pub fn connection(reason: impl Into<String>) -> Self {
        Self::Connection {
            reason: reason.into(),
        }
    }

    /// Create a schema lookup error
    pub fn schema_lookup(table: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaLookup {
            table: table.into(),
            reason: reason.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Convert a driver failure into the taxonomy, classifying constraint
    /// violations by message text.
    pub fn from_driver(table: &str, operation: &'static str, text: String) -> Self {
        match ConstraintKind::from_driver_text(&text) {
            Some(kind) => Self::Constraint { kind, detail: text },
            None => Self::Query {
                table: table.to_owned(),
                operation,
                reason: text,
            },
        }
    }

    /// True for errors the operator can fix by editing input.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            DataError::Validation { .. } | DataError::Constraint { .. }
        )
    }
}
