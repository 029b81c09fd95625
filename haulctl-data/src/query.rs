//! Generic statement assembly.
//!
//! Statement skeletons are built from table and column names that have
//! passed the identifier allow-list; literal data values never appear in
//! the SQL text, they travel as bound parameters. Every builder returns
//! the text and its parameters together so the placeholder/parameter
//! count invariant cannot drift.

use haulctl_core::{ensure_identifier, DataError, Pagination};

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
    Null,
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_owned())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

/// SQL text plus the parameters for its placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    fn new(sql: String, params: Vec<SqlValue>) -> Self {
        debug_assert_eq!(
            sql.matches('?').count(),
            params.len(),
            "placeholder/parameter mismatch in {sql}"
        );
        Self { sql, params }
    }
}

/// `INSERT INTO table (columns) VALUES (?, ...)`
pub fn insert(table: &str, columns: &[String], values: Vec<SqlValue>) -> Result<Statement, DataError> {
    ensure_identifier(table)?;
    if columns.is_empty() || columns.len() != values.len() {
        return Err(DataError::validation("nothing to insert"));
    }
    for column in columns {
        ensure_identifier(column)?;
    }

    let col_clause = columns.join(", ");
    let placeholder_clause = vec!["?"; values.len()].join(", ");
    Ok(Statement::new(
        format!("INSERT INTO {table} ({col_clause}) VALUES ({placeholder_clause})"),
        values,
    ))
}

/// `UPDATE table SET col = ?, ... WHERE id_column = ?`
pub fn update(
    table: &str,
    columns: &[String],
    values: Vec<SqlValue>,
    id_column: &str,
    id_value: SqlValue,
) -> Result<Statement, DataError> {
    ensure_identifier(table)?;
    ensure_identifier(id_column)?;
    if columns.is_empty() || columns.len() != values.len() {
        return Err(DataError::validation("nothing to update"));
    }
    for column in columns {
        ensure_identifier(column)?;
    }

    let set_clause = columns
        .iter()
        .map(|col| format!("{col} = ?"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut params = values;
    params.push(id_value);
    Ok(Statement::new(
        format!("UPDATE {table} SET {set_clause} WHERE {id_column} = ?"),
        params,
    ))
}

/// `DELETE FROM table WHERE id_column = ?`
pub fn delete(table: &str, id_column: &str, id_value: SqlValue) -> Result<Statement, DataError> {
    ensure_identifier(table)?;
    ensure_identifier(id_column)?;
    Ok(Statement::new(
        format!("DELETE FROM {table} WHERE {id_column} = ?"),
        vec![id_value],
    ))
}

/// `SELECT * FROM table LIMIT ? OFFSET ?`
pub fn select_page(table: &str, page: Pagination) -> Result<Statement, DataError> {
    ensure_identifier(table)?;
    Ok(Statement::new(
        format!("SELECT * FROM {table} LIMIT ? OFFSET ?"),
        vec![
            SqlValue::Int(page.limit() as i64),
            SqlValue::Int(page.offset() as i64),
        ],
    ))
}

/// `SELECT COUNT(*) FROM table`
pub fn count(table: &str) -> Result<Statement, DataError> {
    ensure_identifier(table)?;
    Ok(Statement::new(format!("SELECT COUNT(*) FROM {table}"), Vec::new()))
}

/// `SELECT * FROM table`
pub fn select_all(table: &str) -> Result<Statement, DataError> {
    ensure_identifier(table)?;
    Ok(Statement::new(format!("SELECT * FROM {table}"), Vec::new()))
}

/// `SELECT * FROM table WHERE id_column = ?`
pub fn select_by_id(table: &str, id_column: &str, id_value: SqlValue) -> Result<Statement, DataError> {
    ensure_identifier(table)?;
    ensure_identifier(id_column)?;
    Ok(Statement::new(
        format!("SELECT * FROM {table} WHERE {id_column} = ?"),
        vec![id_value],
    ))
}

/// `SELECT * FROM table WHERE col LIKE ? [AND ...]` over the non-empty
/// criteria. Returns `None` when every criterion is empty; the caller
/// degrades to the paginated unfiltered fetch instead of a full scan.
pub fn search(table: &str, criteria: &[(String, String)]) -> Result<Option<Statement>, DataError> {
    ensure_identifier(table)?;

    let mut clauses = Vec::new();
    let mut params = Vec::new();
    for (column, value) in criteria {
        if value.is_empty() {
            continue;
        }
        ensure_identifier(column)?;
        clauses.push(format!("{column} LIKE ?"));
        params.push(SqlValue::Text(format!("%{value}%")));
    }

    if clauses.is_empty() {
        return Ok(None);
    }

    Ok(Some(Statement::new(
        format!("SELECT * FROM {table} WHERE {}", clauses.join(" AND ")),
        params,
    )))
}

/// Key/display pairs for a dropdown: `SELECT id, display FROM table`, or
/// just the keys when the referenced table has no display field.
pub fn fk_options(
    table: &str,
    id_column: &str,
    display_column: Option<&str>,
) -> Result<Statement, DataError> {
    ensure_identifier(table)?;
    ensure_identifier(id_column)?;
    let sql = match display_column {
        Some(display) => {
            ensure_identifier(display)?;
            format!("SELECT {id_column}, {display} FROM {table}")
        }
        None => format!("SELECT {id_column} FROM {table}"),
    };
    Ok(Statement::new(sql, Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn insert_statement_shape() {
        let stmt = insert(
            "Driver",
            &cols(&["First_Name", "Last_Name"]),
            vec!["Jane".into(), "Doe".into()],
        )
        .unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO Driver (First_Name, Last_Name) VALUES (?, ?)"
        );
        assert_eq!(stmt.params.len(), 2);
    }

    #[test]
    fn update_appends_id_param_last() {
        let stmt = update(
            "Driver",
            &cols(&["First_Name"]),
            vec!["Jane".into()],
            "Driver_ID",
            SqlValue::Int(7),
        )
        .unwrap();
        assert_eq!(stmt.sql, "UPDATE Driver SET First_Name = ? WHERE Driver_ID = ?");
        assert_eq!(stmt.params.last(), Some(&SqlValue::Int(7)));
    }

    #[test]
    fn delete_statement_shape() {
        let stmt = delete("Driver", "Driver_ID", SqlValue::Int(7)).unwrap();
        assert_eq!(stmt.sql, "DELETE FROM Driver WHERE Driver_ID = ?");
        assert_eq!(stmt.params.len(), 1);
    }

    #[test]
    fn search_wraps_values_in_wildcards() {
        let stmt = search("Driver", &[("Last_Name".into(), "Doe".into())])
            .unwrap()
            .expect("one non-empty criterion");
        assert_eq!(stmt.sql, "SELECT * FROM Driver WHERE Last_Name LIKE ?");
        assert_eq!(stmt.params, vec![SqlValue::Text("%Doe%".into())]);
    }

    #[test]
    fn search_joins_criteria_with_and() {
        let stmt = search(
            "Driver",
            &[
                ("First_Name".into(), "Ja".into()),
                ("Last_Name".into(), "Doe".into()),
            ],
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM Driver WHERE First_Name LIKE ? AND Last_Name LIKE ?"
        );
        assert_eq!(stmt.params.len(), 2);
    }

    #[test]
    fn search_skips_empty_values_and_degrades() {
        let stmt = search(
            "Driver",
            &[
                ("First_Name".into(), String::new()),
                ("Last_Name".into(), String::new()),
            ],
        )
        .unwrap();
        assert!(stmt.is_none());
    }

    #[test]
    fn page_params_follow_offset_math() {
        let stmt = select_page("Driver", Pagination::new(3, 25)).unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM Driver LIMIT ? OFFSET ?");
        assert_eq!(stmt.params, vec![SqlValue::Int(25), SqlValue::Int(50)]);
    }

    #[test]
    fn identifiers_are_checked_everywhere() {
        assert!(insert("Driver; --", &cols(&["A"]), vec!["x".into()]).is_err());
        assert!(insert("Driver", &cols(&["bad col"]), vec!["x".into()]).is_err());
        assert!(delete("Driver", "1bad", SqlValue::Int(1)).is_err());
        assert!(search("Driver", &[("bad col".into(), "x".into())]).is_err());
        assert!(fk_options("Vehicle", "Vehicle_ID", Some("bad col")).is_err());
    }

    #[test]
    fn malicious_value_stays_in_params() {
        let stmt = search(
            "Driver",
            &[("Last_Name".into(), "'; DROP TABLE Driver; --".into())],
        )
        .unwrap()
        .unwrap();
        assert!(!stmt.sql.contains("DROP"));
        assert_eq!(stmt.params.len(), 1);
    }

    #[test]
    fn placeholder_count_matches_params() {
        let stmt = insert(
            "Cargo",
            &cols(&["Cargo_Type_ID", "Weight", "Description"]),
            vec![SqlValue::Int(2), "1200".into(), "Steel coils".into()],
        )
        .unwrap();
        assert_eq!(stmt.sql.matches('?').count(), stmt.params.len());
    }

    #[test]
    fn fk_options_with_and_without_display() {
        let with = fk_options("Vehicle", "Vehicle_ID", Some("Registration")).unwrap();
        assert_eq!(with.sql, "SELECT Vehicle_ID, Registration FROM Vehicle");
        let without = fk_options("Vehicle", "Vehicle_ID", None).unwrap();
        assert_eq!(without.sql, "SELECT Vehicle_ID FROM Vehicle");
    }
}
