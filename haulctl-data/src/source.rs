//! The seam between the coordinator and the engine.
//!
//! The coordinator only needs the operations a grid can trigger; putting
//! them behind a trait keeps it testable with a stub source and leaves
//! the hosting UI free to wrap a different backend.

use async_trait::async_trait;

use haulctl_core::{DataError, Paged, Pagination, Row};

use crate::engine::CrudEngine;

#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_page(&self, table: &str, page: Pagination) -> Result<Paged<Row>, DataError>;

    async fn search_multi(
        &self,
        table: &str,
        criteria: &[(String, String)],
    ) -> Result<Vec<Row>, DataError>;

    async fn insert(
        &self,
        table: &str,
        columns: &[String],
        values: Vec<String>,
    ) -> Result<(), DataError>;

    async fn update(
        &self,
        table: &str,
        columns: &[String],
        values: Vec<String>,
        id_column: &str,
        id_value: &str,
    ) -> Result<(), DataError>;

    async fn delete(&self, table: &str, id_column: &str, id_value: &str) -> Result<(), DataError>;
}

#[async_trait]
impl DataSource for CrudEngine {
    async fn fetch_page(&self, table: &str, page: Pagination) -> Result<Paged<Row>, DataError> {
        CrudEngine::fetch_page(self, table, page).await
    }

    async fn search_multi(
        &self,
        table: &str,
        criteria: &[(String, String)],
    ) -> Result<Vec<Row>, DataError> {
        CrudEngine::search_multi(self, table, criteria).await
    }

    async fn insert(
        &self,
        table: &str,
        columns: &[String],
        values: Vec<String>,
    ) -> Result<(), DataError> {
        CrudEngine::insert(self, table, columns, values).await
    }

    async fn update(
        &self,
        table: &str,
        columns: &[String],
        values: Vec<String>,
        id_column: &str,
        id_value: &str,
    ) -> Result<(), DataError> {
        CrudEngine::update(self, table, columns, values, id_column, id_value).await
    }

    async fn delete(&self, table: &str, id_column: &str, id_value: &str) -> Result<(), DataError> {
        CrudEngine::delete(self, table, id_column, id_value).await
    }
}
