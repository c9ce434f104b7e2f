//! ID generators
//!
//! An ID generator hands out unique, increasing keys for one table. Keys are
//! reserved in batches from a store kept in the database itself, which has to
//! be created once per database (`init_database_for_id_generator`).
//!
//! Generators are plain owned values: dropping one releases it, so a generator
//! acquired in a scope is released on every exit path from that scope.

mod sqlite;

pub use sqlite::{SqliteIdGenerator, SqliteIdGeneratorFactory, ID_STORE_TABLE};

use crate::core::database_types::DatabaseType;
use crate::core::error::{DatabaseError, Result};
use crate::core::korm_database::KormDatabase;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Source of unique keys for one table
#[async_trait]
pub trait IdGenerator: Send + Sync {
    /// Next key for the generator's table
    async fn next_id(&mut self) -> Result<i64>;

    /// Create the database objects the generator relies on
    ///
    /// Idempotent; meant to be called once at startup.
    async fn init_database_for_id_generator(&self) -> Result<()>;
}

/// Creates generators bound to one database
pub trait IdGeneratorFactory: Send + Sync {
    /// Acquire a generator for `table_name` reserving `batch_size` keys at a time
    ///
    /// # Errors
    ///
    /// `InvalidArgument` naming `batch_size` when it is zero or does not fit
    /// in a 64-bit key.
    fn get_generator(&self, table_name: &str, batch_size: usize) -> Result<Box<dyn IdGenerator>>;
}

/// Builds a factory for a database of a given provider
pub type IdGeneratorFactoryConstructor =
    Arc<dyn Fn(&KormDatabase) -> Arc<dyn IdGeneratorFactory> + Send + Sync>;

/// Registry of ID generator factories by provider
#[derive(Clone)]
pub struct IdGeneratorFactories {
    constructors: HashMap<DatabaseType, IdGeneratorFactoryConstructor>,
}

impl IdGeneratorFactories {
    /// Registry with the bundled SQLite factory
    pub fn new() -> Self {
        let mut factories = Self::empty();
        factories.register(
            DatabaseType::Sqlite,
            Arc::new(|database: &KormDatabase| {
                Arc::new(SqliteIdGeneratorFactory::new(database.clone())) as Arc<dyn IdGeneratorFactory>
            }),
        );
        factories
    }

    /// Registry without any factory
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Register or replace the factory for a provider
    pub fn register(
        &mut self,
        provider: DatabaseType,
        constructor: IdGeneratorFactoryConstructor,
    ) -> &mut Self {
        self.constructors.insert(provider, constructor);
        self
    }

    /// Factory for the database's provider
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` if no factory is registered for the provider.
    pub fn get_factory(&self, database: &KormDatabase) -> Result<Arc<dyn IdGeneratorFactory>> {
        let provider = database.provider();
        let constructor = self.constructors.get(&provider).ok_or_else(|| {
            DatabaseError::unsupported(format!(
                "No ID generator factory registered for provider '{}'",
                provider
            ))
        })?;
        Ok(constructor(database))
    }
}

impl Default for IdGeneratorFactories {
    fn default() -> Self {
        Self::new()
    }
}

/// Check a batch size and convert it to the store's key type
pub(crate) fn validate_batch_size(batch_size: usize) -> Result<i64> {
    if batch_size == 0 {
        return Err(DatabaseError::invalid_argument(
            "batch_size",
            "must be greater than zero",
        ));
    }
    i64::try_from(batch_size).map_err(|_| {
        DatabaseError::invalid_argument("batch_size", format!("must not exceed {}", i64::MAX))
    })
}
