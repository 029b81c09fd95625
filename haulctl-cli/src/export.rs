//! CSV export of a table's current result set.
//!
//! The engine hands over the header and rows in matching order; this side
//! only formats.

use std::path::Path;

use anyhow::{Context, Result};

use haulctl_core::TableData;

/// Write `data` to `path` as CSV, header first. Returns the row count.
pub fn write_csv(path: &Path, data: &TableData) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("cannot create {}", path.display()))?;

    writer
        .write_record(&data.columns)
        .context("failed to write CSV header")?;
    for row in &data.rows {
        writer.write_record(row).context("failed to write CSV row")?;
    }
    writer.flush().context("failed to flush CSV output")?;

    Ok(data.rows.len())
}
