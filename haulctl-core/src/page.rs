//! Pagination primitives and row containers shared across the engine.

use serde::{Deserialize, Serialize};

/// Default page size for grid fetches.
pub const DEFAULT_PER_PAGE: u32 = 100;

/// Hard cap on page size.
pub const MAX_PER_PAGE: u32 = 500;

/// One record as display values in column order. NULL is rendered as an
/// empty string, matching what the entry widgets hand back.
pub type Row = Vec<String>;

/// Pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Page number (1-indexed)
    pub page: u32,
    /// Items per page
    pub per_page: u32,
}

impl Pagination {
    /// Create pagination with validation.
    ///
    /// - Page is clamped to minimum of 1
    /// - Per page is clamped to 1..=MAX_PER_PAGE
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Calculate SQL OFFSET value.
    pub fn offset(&self) -> u64 {
        ((self.page - 1) * self.per_page) as u64
    }

    /// Get LIMIT value.
    pub fn limit(&self) -> u32 {
        self.per_page
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// Paginated response wrapper.
///
/// `total` comes from a separate COUNT(*) and may drift from the row set
/// under concurrent writers; this tool is operated by one admin at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

/// Header plus full row set in matching order, the shape handed to the CSV
/// export collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableData {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}
