//! Core types and traits
//!
//! This module provides the building blocks the startup builder wires
//! together: errors, connection settings, the database trait and handle,
//! model configuration, the service registry and the memory cache.

pub mod cache;
pub mod database;
pub mod database_types;
pub mod error;
pub mod korm_database;
pub mod model;
pub mod runtime;
pub mod services;
pub mod settings;
pub mod transaction;
pub mod value;

// Re-export commonly used types
pub use cache::MemoryCache;
pub use database::{BackendFactory, Database};
pub use database_types::DatabaseType;
pub use error::{DatabaseError, Result};
pub use korm_database::{DatabaseBuilder, KormDatabase};
pub use model::{DatabaseConfiguration, EntityMapping, Model, ModelBuilder};
pub use services::{ServiceCollection, ServiceProvider};
pub use settings::ConnectionSettings;
pub use transaction::TransactionGuard;
pub use value::{DatabaseResult, DatabaseRow, DatabaseValue};
