//! Generic CRUD over any table of the administered schema.
//!
//! One operation is one boundary: acquire a connection, run the statement,
//! release on every exit path, convert any driver failure into the error
//! taxonomy. Writes are validated against introspected metadata before a
//! statement is ever assembled.

use std::sync::Arc;

use sqlx::mysql::MySqlRow;
use tracing::{error, info};

use haulctl_core::{DataError, Paged, Pagination, Row, TableData, TableSchema};

use crate::cache::{driver_text, SchemaCache};
use crate::decode::row_to_display;
use crate::manager::{ConnectionManager, DbConn};
use crate::query::{self, SqlValue, Statement};
use crate::validate::validate_fields;

pub struct CrudEngine {
    manager: Arc<ConnectionManager>,
    cache: Arc<SchemaCache>,
}

impl CrudEngine {
    pub fn new(manager: Arc<ConnectionManager>, cache: Arc<SchemaCache>) -> Self {
        Self { manager, cache }
    }

    pub fn cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    /// One page of rows plus the table's total row count.
    ///
    /// The count is a separate COUNT(*) on the same borrowed connection;
    /// the two reads are not snapshot-consistent with each other, which is
    /// acceptable for a single-admin tool.
    pub async fn fetch_page(&self, table: &str, page: Pagination) -> Result<Paged<Row>, DataError> {
        let select = query::select_page(table, page)?;
        let count = query::count(table)?;

        let mut conn = self.manager.acquire().await?;
        let result: Result<Paged<Row>, DataError> = async {
            let rows = run_fetch(&mut conn, table, "fetch", &select).await?;
            let total = run_count(&mut conn, table, &count).await?;
            Ok(Paged {
                items: rows.iter().map(row_to_display).collect(),
                total,
                page: page.page,
                per_page: page.per_page,
            })
        }
        .await;
        conn.release().await;
        result
    }

    /// Header and full row set in matching order, for the CSV export
    /// collaborator.
    pub async fn fetch_all(&self, table: &str) -> Result<TableData, DataError> {
        let schema = self.cache.schema(table).await?;
        let select = query::select_all(table)?;

        let mut conn = self.manager.acquire().await?;
        let result = run_fetch(&mut conn, table, "fetch all", &select).await;
        conn.release().await;

        Ok(TableData {
            columns: schema.column_names(),
            rows: result?.iter().map(row_to_display).collect(),
        })
    }

    /// The record behind one identity value, if it exists.
    pub async fn fetch_by_id(
        &self,
        table: &str,
        id_column: &str,
        id_value: &str,
    ) -> Result<Option<Row>, DataError> {
        let schema = self.cache.schema(table).await?;
        let select = query::select_by_id(
            table,
            id_column,
            coerce_value(&schema, id_column, id_value.to_owned()),
        )?;

        let mut conn = self.manager.acquire().await?;
        let result = run_fetch(&mut conn, table, "fetch by id", &select).await;
        conn.release().await;

        Ok(result?.first().map(row_to_display))
    }

    /// Single-criterion LIKE search.
    pub async fn search(&self, table: &str, column: &str, value: &str) -> Result<Vec<Row>, DataError> {
        self.search_multi(table, &[(column.to_owned(), value.to_owned())])
            .await
    }

    /// Multi-criteria LIKE search, AND across the non-empty criteria.
    ///
    /// With no usable criterion this degrades to the first unfiltered
    /// page, never to an unbounded scan.
    pub async fn search_multi(
        &self,
        table: &str,
        criteria: &[(String, String)],
    ) -> Result<Vec<Row>, DataError> {
        let Some(select) = query::search(table, criteria)? else {
            return Ok(self.fetch_page(table, Pagination::default()).await?.items);
        };

        let mut conn = self.manager.acquire().await?;
        let result = run_fetch(&mut conn, table, "search", &select).await;
        conn.release().await;

        Ok(result?.iter().map(row_to_display).collect())
    }

    /// Insert one record.
    ///
    /// An empty value for the identity column (always the first entry of a
    /// loaded column list) drops that column from the statement so the
    /// server assigns the key.
    pub async fn insert(&self, table: &str, columns: &[String], values: Vec<String>) -> Result<(), DataError> {
        let schema = self.cache.schema(table).await?;
        let stmt = prepare_insert(&schema, columns, values)?;

        info!(table, "inserting record");
        let mut conn = self.manager.acquire().await?;
        let result = run_execute(&mut conn, table, "insert", &stmt).await;
        conn.release().await;
        result.map(|_| ())
    }

    /// Update one record in place.
    ///
    /// `id_column`/`id_value` must come from the record as it was loaded,
    /// not from editable UI state, so a record can never be re-keyed by a
    /// stray edit.
    pub async fn update(
        &self,
        table: &str,
        columns: &[String],
        values: Vec<String>,
        id_column: &str,
        id_value: &str,
    ) -> Result<(), DataError> {
        let schema = self.cache.schema(table).await?;
        let stmt = prepare_update(&schema, columns, values, id_column, id_value)?;

        info!(table, id_column, "updating record");
        let mut conn = self.manager.acquire().await?;
        let result = run_execute(&mut conn, table, "update", &stmt).await;
        conn.release().await;
        result.map(|_| ())
    }

    /// Delete one record by identity.
    pub async fn delete(&self, table: &str, id_column: &str, id_value: &str) -> Result<(), DataError> {
        let schema = self.cache.schema(table).await?;
        let stmt = query::delete(
            table,
            id_column,
            coerce_value(&schema, id_column, id_value.to_owned()),
        )?;

        info!(table, id_column, "deleting record");
        let mut conn = self.manager.acquire().await?;
        let result = run_execute(&mut conn, table, "delete", &stmt).await;
        conn.release().await;
        result.map(|_| ())
    }

    /// Key/display pairs from a referenced table, for dropdown population.
    pub async fn fk_pairs(
        &self,
        table: &str,
        id_column: &str,
        display_column: Option<&str>,
    ) -> Result<Vec<(String, String)>, DataError> {
        let select = query::fk_options(table, id_column, display_column)?;

        let mut conn = self.manager.acquire().await?;
        let result = run_fetch(&mut conn, table, "fk options", &select).await;
        conn.release().await;

        Ok(result?
            .iter()
            .map(|row| {
                let cells = row_to_display(row);
                let key = cells.first().cloned().unwrap_or_default();
                let display = cells.get(1).cloned().unwrap_or_else(|| key.clone());
                (key, display)
            })
            .collect())
    }
}

/// Build the INSERT for a record as entered, validating first and dropping
/// an auto-assigned identity.
pub(crate) fn prepare_insert(
    schema: &TableSchema,
    columns: &[String],
    values: Vec<String>,
) -> Result<Statement, DataError> {
    if columns.len() != values.len() {
        return Err(DataError::validation("column/value mismatch"));
    }

    let fields: Vec<(String, String)> = columns
        .iter()
        .cloned()
        .zip(values.iter().cloned())
        // An empty identity is about to be dropped for auto-assignment,
        // so it is exempt from the required-field check.
        .filter(|(name, value)| {
            !(Some(name.as_str()) == schema.identity_column() && value.is_empty())
        })
        .collect();
    validate_fields(schema, &fields)?;

    let (kept_columns, kept_values): (Vec<String>, Vec<SqlValue>) = fields
        .into_iter()
        .map(|(name, value)| {
            let coerced = coerce_value(schema, &name, value);
            (name, coerced)
        })
        .unzip();

    query::insert(&schema.table, &kept_columns, kept_values)
}

/// Build the UPDATE for an edited record, validating first.
pub(crate) fn prepare_update(
    schema: &TableSchema,
    columns: &[String],
    values: Vec<String>,
    id_column: &str,
    id_value: &str,
) -> Result<Statement, DataError> {
    if columns.len() != values.len() {
        return Err(DataError::validation("column/value mismatch"));
    }

    let fields: Vec<(String, String)> = columns
        .iter()
        .cloned()
        .zip(values.iter().cloned())
        .collect();
    validate_fields(schema, &fields)?;

    let (set_columns, set_values): (Vec<String>, Vec<SqlValue>) = fields
        .into_iter()
        .map(|(name, value)| {
            let coerced = coerce_value(schema, &name, value);
            (name, coerced)
        })
        .unzip();

    query::update(
        &schema.table,
        &set_columns,
        set_values,
        id_column,
        coerce_value(schema, id_column, id_value.to_owned()),
    )
}

/// Turn an entered string into the value actually bound: NULL for an empty
/// value in a nullable column, a native integer where the column is
/// integer-typed, text otherwise.
fn coerce_value(schema: &TableSchema, column: &str, value: String) -> SqlValue {
    let info = schema.column(column);
    if value.is_empty() {
        return match info {
            Some(col) if col.nullable => SqlValue::Null,
            _ => SqlValue::Text(value),
        };
    }
    match info {
        Some(col) if col.is_integer() => match value.parse::<i64>() {
            Ok(n) => SqlValue::Int(n),
            Err(_) => SqlValue::Text(value),
        },
        _ => SqlValue::Text(value),
    }
}

async fn run_fetch(
    conn: &mut DbConn,
    table: &str,
    operation: &'static str,
    stmt: &Statement,
) -> Result<Vec<MySqlRow>, DataError> {
    let mut q = sqlx::query(&stmt.sql);
    for param in &stmt.params {
        q = match param {
            SqlValue::Text(s) => q.bind(s),
            SqlValue::Int(i) => q.bind(i),
            SqlValue::Null => q.bind(Option::<String>::None),
        };
    }
    q.fetch_all(conn.as_exec()).await.map_err(|err| {
        let text = driver_text(err);
        error!(table, operation, "query failed: {text}");
        DataError::from_driver(table, operation, text)
    })
}

async fn run_count(conn: &mut DbConn, table: &str, stmt: &Statement) -> Result<i64, DataError> {
    sqlx::query_scalar::<_, i64>(&stmt.sql)
        .fetch_one(conn.as_exec())
        .await
        .map_err(|err| {
            let text = driver_text(err);
            error!(table, "count failed: {text}");
            DataError::from_driver(table, "count", text)
        })
}

async fn run_execute(
    conn: &mut DbConn,
    table: &str,
    operation: &'static str,
    stmt: &Statement,
) -> Result<u64, DataError> {
    let mut q = sqlx::query(&stmt.sql);
    for param in &stmt.params {
        q = match param {
            SqlValue::Text(s) => q.bind(s),
            SqlValue::Int(i) => q.bind(i),
            SqlValue::Null => q.bind(Option::<String>::None),
        };
    }
    match q.execute(conn.as_exec()).await {
        Ok(done) => Ok(done.rows_affected()),
        Err(err) => {
            let text = driver_text(err);
            error!(table, operation, "statement failed: {text}");
            Err(DataError::from_driver(table, operation, text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haulctl_core::ColumnInfo;

    fn driver_schema() -> TableSchema {
        TableSchema::new(
            "Driver",
            vec![
                ColumnInfo {
                    name: "Driver_ID".into(),
                    sql_type: "int(11)".into(),
                    nullable: false,
                    key: "PRI".into(),
                },
                ColumnInfo {
                    name: "First_Name".into(),
                    sql_type: "varchar(50)".into(),
                    nullable: false,
                    key: String::new(),
                },
                ColumnInfo {
                    name: "Last_Name".into(),
                    sql_type: "varchar(50)".into(),
                    nullable: false,
                    key: String::new(),
                },
                ColumnInfo {
                    name: "Licence_Expiry".into(),
                    sql_type: "date".into(),
                    nullable: true,
                    key: String::new(),
                },
            ],
        )
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn vals(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn empty_identity_is_omitted_from_insert() {
        let stmt = prepare_insert(
            &driver_schema(),
            &cols(&["Driver_ID", "First_Name", "Last_Name"]),
            vals(&["", "Jane", "Doe"]),
        )
        .unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO Driver (First_Name, Last_Name) VALUES (?, ?)"
        );
        assert_eq!(
            stmt.params,
            vec![SqlValue::Text("Jane".into()), SqlValue::Text("Doe".into())]
        );
    }

    #[test]
    fn explicit_identity_is_kept_and_typed() {
        let stmt = prepare_insert(
            &driver_schema(),
            &cols(&["Driver_ID", "First_Name", "Last_Name"]),
            vals(&["42", "Jane", "Doe"]),
        )
        .unwrap();
        assert!(stmt.sql.contains("Driver_ID"));
        assert_eq!(stmt.params[0], SqlValue::Int(42));
    }

    #[test]
    fn invalid_record_never_reaches_the_builder() {
        let err = prepare_insert(
            &driver_schema(),
            &cols(&["Driver_ID", "First_Name", "Last_Name"]),
            vals(&["", "", "Doe"]),
        )
        .unwrap_err();
        assert!(matches!(err, DataError::Validation { .. }));
        assert!(err.to_string().contains("First_Name is required"));
    }

    #[test]
    fn empty_nullable_binds_null() {
        let stmt = prepare_insert(
            &driver_schema(),
            &cols(&["Driver_ID", "First_Name", "Last_Name", "Licence_Expiry"]),
            vals(&["", "Jane", "Doe", ""]),
        )
        .unwrap();
        assert_eq!(stmt.params.last(), Some(&SqlValue::Null));
    }

    #[test]
    fn update_keys_on_the_loaded_identity() {
        let stmt = prepare_update(
            &driver_schema(),
            &cols(&["First_Name", "Last_Name"]),
            vals(&["Janet", "Doe"]),
            "Driver_ID",
            "7",
        )
        .unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE Driver SET First_Name = ?, Last_Name = ? WHERE Driver_ID = ?"
        );
        assert_eq!(stmt.params.last(), Some(&SqlValue::Int(7)));
    }

    #[test]
    fn update_validates_before_building() {
        let err = prepare_update(
            &driver_schema(),
            &cols(&["First_Name", "Licence_Expiry"]),
            vals(&["Janet", "31/12/2025"]),
            "Driver_ID",
            "7",
        )
        .unwrap_err();
        assert!(err.to_string().contains("Licence_Expiry must be a valid date"));
    }

    #[test]
    fn oversized_number_falls_back_to_text_binding() {
        let huge = "9".repeat(30);
        let stmt = prepare_insert(
            &driver_schema(),
            &cols(&["Driver_ID", "First_Name", "Last_Name"]),
            vals(&[&huge, "Jane", "Doe"]),
        )
        .unwrap();
        assert_eq!(stmt.params[0], SqlValue::Text(huge));
    }
}
