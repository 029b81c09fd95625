//! haulctl-data: schema-driven generic data access.
//!
//! The engine introspects table structure at runtime, caches it, builds
//! parameterized statements without per-table code, resolves foreign-key
//! references into operator-friendly choices, and serves paginated or
//! filtered record sets to a UI that must never block on the database.
//!
//! # Design Principles
//!
//! - Identifiers pass an allow-list before they reach statement text;
//!   values only ever travel as bound parameters
//! - One operation, one connection loan, released on every exit path
//! - Failures convert to the `DataError` taxonomy at the operation
//!   boundary; callers never see a raw driver error

pub mod cache;
pub mod coordinator;
pub mod decode;
pub mod engine;
pub mod manager;
pub mod query;
pub mod resolver;
pub mod source;
pub mod validate;

pub use cache::SchemaCache;
pub use coordinator::{FetchCoordinator, GridState, GridUpdate};
pub use engine::CrudEngine;
pub use manager::{ConnectionManager, DbConn};
pub use query::{SqlValue, Statement};
pub use resolver::{FkChoices, FkResolution, FkResolver};
pub use source::DataSource;
pub use validate::validate_fields;
