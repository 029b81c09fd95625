pub mod config;
pub mod error;
pub mod fk;
pub mod ident;
pub mod page;
pub mod schema;

pub use config::{load_dotenv, DbConfig};
pub use error::{ConstraintKind, DataError};
pub use fk::{is_foreign_key, referenced_table};
pub use ident::{ensure_identifier, is_safe_identifier};
pub use page::{Paged, Pagination, Row, TableData};
pub use schema::{ColumnInfo, TableSchema};

/// Result type alias for haulctl operations
pub type Result<T> = std::result::Result<T, DataError>;
