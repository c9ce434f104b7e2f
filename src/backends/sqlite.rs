//! SQLite database backend implementation
//!
//! This module provides a SQLite implementation of the Database trait.

use crate::core::{
    database::Database, database_types::DatabaseType, error::DatabaseError, error::Result,
    value::DatabaseResult, value::DatabaseRow, value::DatabaseValue,
};
use async_trait::async_trait;
use rusqlite::{params_from_iter, Connection, Row};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Default timeout for database operations (30 seconds)
const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection string keys naming the database file
const DATA_SOURCE_KEYS: [&str; 3] = ["data source", "datasource", "filename"];

/// SQLite database implementation
pub struct SqliteDatabase {
    connection: Arc<Mutex<Option<Connection>>>,
    in_transaction: Arc<parking_lot::Mutex<bool>>,
    operation_timeout: Duration,
}

impl SqliteDatabase {
    /// Create a new SQLite database instance
    pub fn new() -> Self {
        Self::with_operation_timeout(DEFAULT_OPERATION_TIMEOUT)
    }

    /// Create an instance whose statements are interrupted after `timeout`
    ///
    /// Calls that take their own timeout, such as
    /// [`Database::execute_batch_with_timeout`], are not affected.
    pub fn with_operation_timeout(timeout: Duration) -> Self {
        Self {
            connection: Arc::new(Mutex::new(None)),
            in_transaction: Arc::new(parking_lot::Mutex::new(false)),
            operation_timeout: timeout,
        }
    }

    /// Resolve the file path from a bare path or a `Data Source=...;` string
    pub fn data_source(connection_string: &str) -> Result<String> {
        let trimmed = connection_string.trim();
        if !trimmed.contains('=') {
            return Ok(trimmed.to_string());
        }

        trimmed
            .split(';')
            .filter_map(|segment| segment.split_once('='))
            .find(|(key, _)| {
                let key = key.trim().to_lowercase();
                DATA_SOURCE_KEYS.contains(&key.as_str())
            })
            .map(|(_, value)| value.trim().to_string())
            .filter(|path| !path.is_empty())
            .ok_or_else(|| {
                DatabaseError::invalid_connection_string(format!(
                    "SQLite connection string has no 'Data Source': '{}'",
                    connection_string
                ))
            })
    }

    /// Convert a rusqlite Row to a DatabaseRow
    fn row_to_database_row(row: &Row) -> rusqlite::Result<DatabaseRow> {
        let mut db_row = DatabaseRow::new();
        let column_count = row.as_ref().column_count();

        for i in 0..column_count {
            let column_name = row.as_ref().column_name(i)?.to_string();
            let value = match row.get_ref(i)? {
                rusqlite::types::ValueRef::Null => DatabaseValue::Null,
                rusqlite::types::ValueRef::Integer(v) => DatabaseValue::Long(v),
                rusqlite::types::ValueRef::Real(v) => DatabaseValue::Double(v),
                rusqlite::types::ValueRef::Text(v) => {
                    DatabaseValue::String(String::from_utf8_lossy(v).to_string())
                }
                rusqlite::types::ValueRef::Blob(v) => DatabaseValue::Bytes(v.to_vec()),
            };
            db_row.insert(column_name, value);
        }

        Ok(db_row)
    }

    /// Convert DatabaseValue to rusqlite parameter
    fn value_to_param(value: &DatabaseValue) -> Box<dyn rusqlite::ToSql> {
        match value {
            DatabaseValue::Null => Box::new(None::<i64>),
            DatabaseValue::Bool(v) => Box::new(*v),
            DatabaseValue::Long(v) => Box::new(*v),
            DatabaseValue::Double(v) => Box::new(*v),
            DatabaseValue::String(v) => Box::new(v.clone()),
            DatabaseValue::Bytes(v) => Box::new(v.clone()),
        }
    }

    /// Run `work` against the open connection under the operation timeout
    async fn with_connection<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        self.with_connection_timeout(self.operation_timeout, work).await
    }

    /// Run `work` against the open connection on the blocking pool
    ///
    /// When `timeout` elapses the running statement is interrupted and the
    /// call returns only once the blocking work has stopped.
    async fn with_connection_timeout<T, F>(&self, timeout: Duration, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let interrupt = self
            .connection
            .lock()
            .await
            .as_ref()
            .map(Connection::get_interrupt_handle)
            .ok_or_else(|| DatabaseError::connection("Not connected to database"))?;

        let connection_arc = Arc::clone(&self.connection);
        let mut task = tokio::task::spawn_blocking(move || -> Result<T> {
            let connection = connection_arc.blocking_lock();
            let conn = connection
                .as_ref()
                .ok_or_else(|| DatabaseError::connection("Not connected to database"))?;
            work(conn)
        });

        let joined = tokio::select! {
            result = &mut task => result,
            _ = tokio::time::sleep(timeout) => {
                interrupt.interrupt();
                let result = (&mut task).await;
                tracing::warn!(timeout_ms = timeout.as_millis() as u64, "sqlite statement interrupted");
                return match result {
                    // Finished between the deadline and the interrupt
                    Ok(Ok(value)) => Ok(value),
                    _ => Err(DatabaseError::query_timeout(timeout.as_millis() as u64)),
                };
            }
        };

        joined.map_err(|e| DatabaseError::other(format!("Task join error: {}", e)))?
    }

    /// Run a transaction control statement and flip the flag on success
    async fn transaction_control(&self, sql: &'static str, expect_active: bool) -> Result<()> {
        let in_transaction_arc = Arc::clone(&self.in_transaction);

        self.with_connection(move |conn| {
            let mut in_transaction = in_transaction_arc.lock();
            if *in_transaction != expect_active {
                return Err(DatabaseError::transaction(if expect_active {
                    "Not in a transaction"
                } else {
                    "Already in a transaction"
                }));
            }

            // An interrupted statement may already have rolled the transaction back
            let ended_by_engine = expect_active && conn.is_autocommit();
            if ended_by_engine && sql != "ROLLBACK" {
                *in_transaction = false;
                return Err(DatabaseError::transaction(
                    "Transaction was rolled back by the database",
                ));
            }
            if !ended_by_engine {
                conn.execute(sql, [])?;
            }
            *in_transaction = !expect_active;
            Ok(())
        })
        .await
    }
}

impl Default for SqliteDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    async fn connect(&self, connection_string: &str) -> Result<()> {
        let path = Self::data_source(connection_string)?;

        // Clean up any existing connection first
        {
            let mut connection = self.connection.lock().await;
            *connection = None;
        }
        *self.in_transaction.lock() = false;

        let connection_arc = Arc::clone(&self.connection);

        let mut task = tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = Connection::open(&path)?;
            conn.execute("PRAGMA foreign_keys = ON", [])?;

            let mut connection = connection_arc.blocking_lock();
            *connection = Some(conn);
            tracing::debug!(path = %path, "sqlite connection opened");
            Ok(())
        });

        tokio::select! {
            result = &mut task => {
                result.map_err(|e| DatabaseError::other(format!("Task join error: {}", e)))?
            }
            _ = tokio::time::sleep(self.operation_timeout) => {
                task.abort();
                Err(DatabaseError::connection_timeout(self.operation_timeout.as_millis() as u64))
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connection
            .try_lock()
            .map(|conn| conn.is_some())
            .unwrap_or(false)
    }

    async fn disconnect(&self) -> Result<()> {
        *self.in_transaction.lock() = false;

        let mut connection = self.connection.lock().await;
        *connection = None;
        Ok(())
    }

    async fn execute(&self, query: &str) -> Result<u64> {
        let query = query.to_string();
        self.with_connection(move |conn| Ok(conn.execute(&query, [])? as u64))
            .await
    }

    async fn execute_batch(&self, script: &str) -> Result<()> {
        self.execute_batch_with_timeout(script, self.operation_timeout)
            .await
    }

    async fn execute_batch_with_timeout(&self, script: &str, timeout: Duration) -> Result<()> {
        let script = script.to_string();
        self.with_connection_timeout(timeout, move |conn| Ok(conn.execute_batch(&script)?))
            .await
    }

    async fn query(&self, query: &str) -> Result<DatabaseResult> {
        let query = query.to_string();
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(&query)?;
            let rows = stmt.query_map([], Self::row_to_database_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn query_with_params(
        &self,
        query: &str,
        params: &[DatabaseValue],
    ) -> Result<DatabaseResult> {
        let query = query.to_string();
        let params = params.to_vec();
        self.with_connection(move |conn| {
            let rusqlite_params: Vec<Box<dyn rusqlite::ToSql>> =
                params.iter().map(Self::value_to_param).collect();

            let mut stmt = conn.prepare(&query)?;
            let rows = stmt.query_map(
                params_from_iter(rusqlite_params.iter()),
                Self::row_to_database_row,
            )?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn execute_with_params(&self, query: &str, params: &[DatabaseValue]) -> Result<u64> {
        let query = query.to_string();
        let params = params.to_vec();
        self.with_connection(move |conn| {
            let rusqlite_params: Vec<Box<dyn rusqlite::ToSql>> =
                params.iter().map(Self::value_to_param).collect();

            let mut stmt = conn.prepare(&query)?;
            Ok(stmt.execute(params_from_iter(rusqlite_params.iter()))? as u64)
        })
        .await
    }

    async fn begin_transaction(&self) -> Result<()> {
        self.transaction_control("BEGIN TRANSACTION", false).await
    }

    async fn commit(&self) -> Result<()> {
        self.transaction_control("COMMIT", true).await
    }

    async fn rollback(&self) -> Result<()> {
        self.transaction_control("ROLLBACK", true).await
    }

    fn in_transaction(&self) -> bool {
        *self.in_transaction.lock()
    }
}

impl Drop for SqliteDatabase {
    fn drop(&mut self) {
        // Best effort, Drop cannot be async
        if *self.in_transaction.lock() {
            if let Ok(connection) = self.connection.try_lock() {
                if let Some(conn) = connection.as_ref() {
                    let _ = conn.execute("ROLLBACK", []);
                }
            }
        }
    }
}
