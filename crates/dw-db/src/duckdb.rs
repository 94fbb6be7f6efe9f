//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{DatabaseCore, DatabaseSchema, Row, SqlValue};
use async_trait::async_trait;
use duckdb::types::{ToSqlOutput, Value};
use duckdb::{params_from_iter, Connection, ToSql};
use dw_core::sql_utils::{escape_sql_string, quote_ident, quote_qualified, split_qualified_name};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const MEMORY_PATH: &str = ":memory:";

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        let value = match self {
            SqlValue::Null => Value::Null,
            SqlValue::Text(s) => Value::Text(s.clone()),
            SqlValue::Integer(n) => Value::BigInt(*n),
            SqlValue::Boolean(b) => Value::Boolean(*b),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

/// Render a column value as text, keeping NULL distinct.
fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Text(s) => Some(s),
        Value::Boolean(b) => Some(b.to_string()),
        Value::TinyInt(n) => Some(n.to_string()),
        Value::SmallInt(n) => Some(n.to_string()),
        Value::Int(n) => Some(n.to_string()),
        Value::BigInt(n) => Some(n.to_string()),
        Value::HugeInt(n) => Some(n.to_string()),
        Value::UTinyInt(n) => Some(n.to_string()),
        Value::USmallInt(n) => Some(n.to_string()),
        Value::UInt(n) => Some(n.to_string()),
        Value::UBigInt(n) => Some(n.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Double(f) => Some(f.to_string()),
        other => Some(format!("{other:?}")),
    }
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == MEMORY_PATH {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    /// Open another session on the same database instance.
    ///
    /// Sessions have independent transactions and session settings (such as
    /// the default schema), which is what concurrent migration runs against
    /// one database look like.
    pub fn session(&self) -> DbResult<Self> {
        let conn = self
            .lock()?
            .try_clone()
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Execute SQL synchronously
    fn execute_sync(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize> {
        let conn = self.lock()?;
        conn.execute(sql, params_from_iter(params.iter()))
            .map_err(|e| DbError::with_sql(e, sql))
    }

    /// Execute batch SQL synchronously
    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql).map_err(DbError::from)
    }

    /// Query rows synchronously
    fn query_rows_sync(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql).map_err(|e| DbError::with_sql(e, sql))?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                let col_count = row.as_ref().column_count();
                (0..col_count)
                    .map(|i| row.get::<_, Value>(i).map(value_to_text))
                    .collect::<duckdb::Result<Row>>()
            })
            .map_err(|e| DbError::with_sql(e, sql))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DbError::with_sql(e, sql))?;
        Ok(rows)
    }

    /// Check if relation exists synchronously
    fn relation_exists_sync(&self, name: &str) -> DbResult<bool> {
        let rows = if name.contains('.') {
            let (schema, table) = split_qualified_name(name);
            self.query_rows_sync(
                "SELECT COUNT(*) FROM information_schema.tables \
                 WHERE table_schema = ? AND table_name = ?",
                &[SqlValue::from(schema), SqlValue::from(table)],
            )?
        } else {
            self.query_rows_sync(
                "SELECT COUNT(*) FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_name = ?",
                &[SqlValue::from(name)],
            )?
        };
        let count = rows
            .first()
            .and_then(|row| row.first().cloned().flatten())
            .and_then(|n| n.parse::<i64>().ok())
            .unwrap_or(0);
        Ok(count > 0)
    }
}

#[async_trait]
impl DatabaseCore for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.execute_sync(sql, &[])
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn execute_with(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize> {
        self.execute_sync(sql, params)
    }

    async fn query_rows(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>> {
        self.query_rows_sync(sql, params)
    }

    async fn begin(&self) -> DbResult<()> {
        self.execute_batch_sync("BEGIN TRANSACTION")
    }

    async fn commit(&self) -> DbResult<()> {
        self.execute_batch_sync("COMMIT")
    }

    async fn rollback(&self) -> DbResult<()> {
        self.execute_batch_sync("ROLLBACK")
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[async_trait]
impl DatabaseSchema for DuckDbBackend {
    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        self.relation_exists_sync(name)
    }

    async fn create_schema_if_not_exists(&self, schema: &str) -> DbResult<()> {
        let sql = format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema));
        self.execute_batch_sync(&sql)
    }

    async fn use_schema(&self, schema: &str) -> DbResult<()> {
        let sql = format!("SET schema = '{}'", escape_sql_string(schema));
        self.execute_batch_sync(&sql)
    }

    async fn create_ledger_table(&self, name: &str) -> DbResult<()> {
        // DuckDB has no auto-increment columns; order_executed draws from a
        // sequence owned by the ledger.
        let sequence = format!("{name}_order_seq");
        let sql = format!(
            "CREATE SEQUENCE IF NOT EXISTS {seq};
             CREATE TABLE IF NOT EXISTS {table} (
                 order_executed BIGINT PRIMARY KEY DEFAULT nextval('{seq_name}'),
                 version        VARCHAR UNIQUE,
                 description    VARCHAR(500),
                 filename       VARCHAR(255) NOT NULL,
                 migration_type VARCHAR(20) NOT NULL,
                 applied_at     TIMESTAMP NOT NULL DEFAULT now(),
                 checksum       VARCHAR(64)
             );",
            seq = quote_qualified(&sequence),
            seq_name = escape_sql_string(&sequence),
            table = quote_qualified(name),
        );
        self.execute_batch_sync(&sql)
    }

    async fn create_lock_table(&self, name: &str) -> DbResult<()> {
        let table = quote_qualified(name);
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                 id          INTEGER PRIMARY KEY CHECK (id = 1),
                 locked      BOOLEAN NOT NULL DEFAULT FALSE,
                 acquired_at TIMESTAMP
             );
             INSERT INTO {table} (id, locked, acquired_at)
             VALUES (1, FALSE, NULL)
             ON CONFLICT DO NOTHING;"
        );
        self.execute_batch_sync(&sql)
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
