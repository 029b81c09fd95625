//! Field validation against introspected column metadata.
//!
//! Runs before any write statement is assembled; a failed validation never
//! reaches the query builder. Errors accumulate so the operator sees every
//! problem in one message, not one per save attempt.

use chrono::NaiveDate;

use haulctl_core::{DataError, TableSchema};

/// Validate user-entered field values against `schema`.
///
/// Checks, per column present in `fields`:
/// - empty value on a NOT NULL column: "{column} is required"
/// - non-digit content in an integer column: "{column} must be a number"
/// - content not matching `YYYY-MM-DD` in a DATE column:
///   "{column} must be a valid date (YYYY-MM-DD)"
pub fn validate_fields(schema: &TableSchema, fields: &[(String, String)]) -> Result<(), DataError> {
    let mut errors = Vec::new();

    for column in &schema.columns {
        let Some((_, value)) = fields.iter().find(|(name, _)| *name == column.name) else {
            continue;
        };

        if value.is_empty() {
            if !column.nullable {
                errors.push(format!("{} is required", column.name));
            }
            continue;
        }

        if column.is_integer() && !value.chars().all(|c| c.is_ascii_digit()) {
            errors.push(format!("{} must be a number", column.name));
        }

        if column.is_date() && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
            errors.push(format!("{} must be a valid date (YYYY-MM-DD)", column.name));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(DataError::validation(errors.join(", ")))
    }
}
