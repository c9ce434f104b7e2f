//! Database trait implemented by every backend
//!
//! The trait is object safe so the rest of the crate can hold backends as
//! `Arc<dyn Database>` and pick one at runtime from the connection provider.

use super::database_types::DatabaseType;
use super::error::{DatabaseError, Result};
use super::value::{DatabaseResult, DatabaseValue};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Core database trait that all database backends must implement
#[async_trait]
pub trait Database: Send + Sync {
    /// Get the database type
    fn database_type(&self) -> DatabaseType;

    /// Connect to the database with the given connection string
    ///
    /// # Thread Safety
    /// This method uses interior mutability so it's safe to call from multiple
    /// threads concurrently, though only one connection operation will proceed
    /// at a time.
    async fn connect(&self, connection_string: &str) -> Result<()>;

    /// Check if connected to the database
    fn is_connected(&self) -> bool;

    /// Disconnect from the database
    async fn disconnect(&self) -> Result<()>;

    /// Execute a single statement that doesn't return results
    ///
    /// # Security Warning
    ///
    /// **SQL Injection Risk**: This method executes raw SQL without parameter
    /// sanitization. Use `execute_with_params()` for anything built from input.
    async fn execute(&self, query: &str) -> Result<u64>;

    /// Execute a batch of statements separated by `;`
    ///
    /// Used for migration scripts, which usually hold several statements.
    async fn execute_batch(&self, script: &str) -> Result<()>;

    /// Execute a batch of statements bounded by `timeout` instead of the
    /// backend's own operation timeout
    ///
    /// Backends that can stop running work should override this; the default
    /// only stops waiting.
    async fn execute_batch_with_timeout(&self, script: &str, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.execute_batch(script))
            .await
            .unwrap_or_else(|_| Err(DatabaseError::query_timeout(timeout.as_millis() as u64)))
    }

    /// Execute a SELECT query and return results
    async fn query(&self, query: &str) -> Result<DatabaseResult>;

    /// Execute a query with parameters (prepared statement)
    async fn query_with_params(
        &self,
        query: &str,
        params: &[DatabaseValue],
    ) -> Result<DatabaseResult>;

    /// Execute a statement with parameters that doesn't return results
    async fn execute_with_params(&self, query: &str, params: &[DatabaseValue]) -> Result<u64>;

    /// Begin a transaction
    ///
    /// # Thread Safety
    /// Only one transaction can be active at a time per connection.
    async fn begin_transaction(&self) -> Result<()>;

    /// Commit the current transaction
    async fn commit(&self) -> Result<()>;

    /// Rollback the current transaction
    async fn rollback(&self) -> Result<()>;

    /// Check if currently in a transaction
    fn in_transaction(&self) -> bool;
}

/// Creates a fresh, unconnected backend for a provider
///
/// The builder keeps one of these so that every database it hands out (and
/// every migrations runner resolved from the registry) gets its own backend.
pub type BackendFactory = Arc<dyn Fn(DatabaseType) -> Result<Arc<dyn Database>> + Send + Sync>;
