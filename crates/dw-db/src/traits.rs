//! Database trait definitions
//!
//! The engine talks to the target database only through these traits, so
//! dialect-specific DDL (ledger and lock tables, schema selection, relation
//! lookups) lives with each backend.

use crate::error::DbResult;
use async_trait::async_trait;

/// A bound parameter value for [`DatabaseCore::execute_with`] and
/// [`DatabaseCore::query_rows`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Null,
    Text(String),
    Integer(i64),
    Boolean(bool),
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Boolean(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// A result row; `None` is SQL NULL, everything else is rendered as text.
pub type Row = Vec<Option<String>>;

/// Core database operations: execution, queries and transactions.
#[async_trait]
pub trait DatabaseCore: Send + Sync {
    /// Execute a single statement, returns affected rows
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute one or more statements separated by `;`
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Execute a single statement with positional `?` parameters, returns
    /// affected rows
    async fn execute_with(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize>;

    /// Run a query with positional `?` parameters and collect every row
    async fn query_rows(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>>;

    /// Open a transaction on this session
    async fn begin(&self) -> DbResult<()>;

    /// Commit the open transaction
    async fn commit(&self) -> DbResult<()>;

    /// Roll back the open transaction
    async fn rollback(&self) -> DbResult<()>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// Schema and bookkeeping-table management.
#[async_trait]
pub trait DatabaseSchema: Send + Sync {
    /// Check if a table or view exists. Unqualified names are looked up in
    /// the session's current schema.
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Create a schema if it does not exist
    async fn create_schema_if_not_exists(&self, schema: &str) -> DbResult<()>;

    /// Make `schema` the default for unqualified names on this session
    async fn use_schema(&self, schema: &str) -> DbResult<()>;

    /// Create the migration ledger table if it does not exist
    async fn create_ledger_table(&self, name: &str) -> DbResult<()>;

    /// Create the lock table if it does not exist and seed its single
    /// unlocked row
    async fn create_lock_table(&self, name: &str) -> DbResult<()>;
}

/// Full database abstraction used by the migration engine.
///
/// Implementations must be Send + Sync for async operation.
pub trait Database: DatabaseCore + DatabaseSchema {}

impl<T: DatabaseCore + DatabaseSchema> Database for T {}
