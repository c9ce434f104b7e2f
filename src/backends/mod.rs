//! Database backend implementations
//!
//! This module contains concrete implementations of the Database trait and
//! the default provider → backend factory.

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

use crate::core::database::{BackendFactory, Database};
use crate::core::database_types::DatabaseType;
use crate::core::error::{DatabaseError, Result};
use std::sync::Arc;

/// Create a fresh, unconnected backend for a provider
///
/// # Errors
///
/// `UnsupportedOperation` for providers without a bundled backend.
pub fn create_backend(provider: DatabaseType) -> Result<Arc<dyn Database>> {
    match provider {
        #[cfg(feature = "sqlite")]
        DatabaseType::Sqlite => Ok(Arc::new(SqliteDatabase::new())),
        other => Err(DatabaseError::unsupported(format!(
            "No bundled backend for provider '{}', plug one in with use_backend_factory",
            other
        ))),
    }
}

/// Factory wrapping [`create_backend`]
pub fn default_backend_factory() -> BackendFactory {
    Arc::new(create_backend)
}
