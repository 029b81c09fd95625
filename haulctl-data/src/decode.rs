//! Row decoding for schema-less fetches.
//!
//! The engine selects `*` from tables it knows nothing about at compile
//! time, so every cell is rendered to the display string the grid and the
//! CSV export consume. NULL becomes the empty string, which is also what
//! the entry widgets hand back for an untouched field.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{Row as _, ValueRef};

use haulctl_core::Row;

/// Render one fetched row in column order.
pub fn row_to_display(row: &MySqlRow) -> Row {
    (0..row.len()).map(|idx| cell_to_display(row, idx)).collect()
}

/// Render a single cell.
///
/// Cells are typed by the server, not by us, so decoding cascades through
/// the families the administered schema actually uses: text, integers
/// (both signednesses), floats/decimals, dates and times, then raw bytes
/// as a last resort.
pub fn cell_to_display(row: &MySqlRow, idx: usize) -> String {
    match row.try_get_raw(idx) {
        Ok(raw) if raw.is_null() => return String::new(),
        Ok(_) => {}
        Err(_) => return String::new(),
    }

    if let Ok(value) = row.try_get::<String, _>(idx) {
        return value;
    }
    if let Ok(value) = row.try_get::<i64, _>(idx) {
        return value.to_string();
    }
    if let Ok(value) = row.try_get::<u64, _>(idx) {
        return value.to_string();
    }
    if let Ok(value) = row.try_get::<f64, _>(idx) {
        return value.to_string();
    }
    if let Ok(value) = row.try_get::<bool, _>(idx) {
        return if value { "1".into() } else { "0".into() };
    }
    if let Ok(value) = row.try_get::<NaiveDate, _>(idx) {
        return value.format("%Y-%m-%d").to_string();
    }
    if let Ok(value) = row.try_get::<NaiveDateTime, _>(idx) {
        return value.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    if let Ok(value) = row.try_get::<DateTime<Utc>, _>(idx) {
        return value.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    if let Ok(value) = row.try_get::<NaiveTime, _>(idx) {
        return value.format("%H:%M:%S").to_string();
    }
    if let Ok(value) = row.try_get::<Vec<u8>, _>(idx) {
        return String::from_utf8_lossy(&value).into_owned();
    }

    String::new()
}
