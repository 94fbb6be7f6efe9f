//! dw-db - Database abstraction layer for dbwarden
//!
//! This crate provides the `Database` trait the migration engine runs
//! against, and its DuckDB implementation.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use crate::duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::{Database, DatabaseCore, DatabaseSchema, Row, SqlValue};
