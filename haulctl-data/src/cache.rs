//! Schema cache: runtime column introspection, memoized per table.
//!
//! The administered schema is assumed fixed while the process runs, so
//! entries have no TTL and are replaced only by an explicit `flush`. The
//! map is read-mostly; concurrent first access to the same table may
//! introspect twice, which is tolerated (same result, last write wins)
//! rather than serialized behind a cache-wide lock.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use sqlx::mysql::MySqlRow;
use sqlx::Row;
use tracing::{debug, warn};

use haulctl_core::{ensure_identifier, ColumnInfo, DataError, TableSchema};

use crate::manager::ConnectionManager;

/// Cached table metadata with a defined lifetime: constructed once and
/// passed by handle to every component that needs it.
#[derive(Debug)]
pub struct SchemaCache {
    manager: Arc<ConnectionManager>,
    tables: RwLock<HashMap<String, Arc<TableSchema>>>,
}

impl SchemaCache {
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self {
            manager,
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Full metadata for `table`, introspecting on first request.
    ///
    /// Cache keys are exact table names; `Driver` and `driver` are
    /// distinct entries.
    pub async fn schema(&self, table: &str) -> Result<Arc<TableSchema>, DataError> {
        if let Some(found) = self.lookup(table) {
            return Ok(found);
        }

        let schema = Arc::new(self.introspect(table).await?);
        self.tables
            .write()
            .expect("schema cache lock poisoned")
            .insert(table.to_owned(), schema.clone());
        Ok(schema)
    }

    /// Column names for `table`.
    ///
    /// Failures are logged and produce an empty list: a caller rendering a
    /// form treats no columns as nothing to render instead of crashing.
    pub async fn columns(&self, table: &str) -> Vec<String> {
        match self.schema(table).await {
            Ok(schema) => schema.column_names(),
            Err(err) => {
                warn!(table, "column lookup failed: {err}");
                Vec::new()
            }
        }
    }

    /// All table names visible in the connected database. Not cached;
    /// callers hit this once when building their navigation.
    pub async fn tables(&self) -> Result<Vec<String>, DataError> {
        let mut conn = self.manager.acquire().await?;
        let result = sqlx::query("SHOW TABLES")
            .fetch_all(conn.as_exec())
            .await
            .map_err(|err| DataError::from_driver("*", "show tables", driver_text(err)));
        conn.release().await;

        Ok(result?
            .iter()
            .filter_map(|row| text_column(row, 0))
            .collect())
    }

    /// Drop every cached entry. The next request per table re-introspects.
    pub fn flush(&self) {
        self.tables
            .write()
            .expect("schema cache lock poisoned")
            .clear();
    }

    /// Pre-seed an entry without touching the database. Test seam, also
    /// usable by callers that already know a table's shape.
    pub fn seed(&self, schema: TableSchema) {
        self.tables
            .write()
            .expect("schema cache lock poisoned")
            .insert(schema.table.clone(), Arc::new(schema));
    }

    fn lookup(&self, table: &str) -> Option<Arc<TableSchema>> {
        self.tables
            .read()
            .expect("schema cache lock poisoned")
            .get(table)
            .cloned()
    }

    async fn introspect(&self, table: &str) -> Result<TableSchema, DataError> {
        ensure_identifier(table)
            .map_err(|_| DataError::schema_lookup(table, "name rejected by identifier check"))?;

        let mut conn = self
            .manager
            .acquire()
            .await
            .map_err(|err| DataError::schema_lookup(table, err.to_string()))?;

        let sql = format!("SHOW COLUMNS FROM {table}");
        let result = sqlx::query(&sql).fetch_all(conn.as_exec()).await;
        conn.release().await;

        let rows = result.map_err(|err| DataError::schema_lookup(table, driver_text(err)))?;
        debug!(table, columns = rows.len(), "introspected table");

        let columns = rows
            .iter()
            .map(|row| ColumnInfo {
                name: text_column(row, 0).unwrap_or_default(),
                sql_type: text_column(row, 1).unwrap_or_default(),
                nullable: text_column(row, 2).as_deref() == Some("YES"),
                key: text_column(row, 3).unwrap_or_default(),
            })
            .collect();

        Ok(TableSchema::new(table, columns))
    }
}

/// `SHOW` statements report some fields as binary text depending on server
/// version; decode as UTF-8 either way.
fn text_column(row: &MySqlRow, idx: usize) -> Option<String> {
    if let Ok(value) = row.try_get::<String, _>(idx) {
        return Some(value);
    }
    row.try_get::<Vec<u8>, _>(idx)
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

pub(crate) fn driver_text(err: sqlx::Error) -> String {
    match err.as_database_error() {
        Some(db_err) => db_err.message().to_owned(),
        None => err.to_string(),
    }
}
