//! # KORM Bootstrap
//!
//! Startup wiring for a KORM-style data access layer: connection settings,
//! database model configuration, ID generator storage and database
//! migrations, registered into a typed service collection while the
//! application starts.
//!
//! ## Features
//!
//! - **Validated settings**: connection strings are checked once, up front
//! - **Lazy registration**: migration runners are constructed on first resolution
//! - **Scoped resources**: ID generators are released even when initialization fails
//! - **Blocking startup**: `migrate` finishes before startup continues, with async twins
//! - **Migrations**: ordered SQL scripts from directories or the binary itself
//!
//! ## Supported Databases
//!
//! | Database | Status | Features |
//! |----------|--------|----------|
//! | SQLite | Implemented | Bundled, ID generator, migrations |
//! | PostgreSQL | Settings only | Provider for custom backend factories |
//! | SQL Server | Settings only | Provider for custom backend factories |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use korm_bootstrap::prelude::*;
//!
//! #[derive(Default)]
//! struct AppConfiguration;
//!
//! impl DatabaseConfiguration for AppConfiguration {
//!     fn on_model_creating(&self, model: &mut ModelBuilder) {
//!         model
//!             .entity("Invoice")
//!             .has_table_name("Invoices")
//!             .use_id_generator();
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let mut services = ServiceCollection::new();
//!     let settings = ConnectionSettings::parse("Data Source=app.db;KormAutoMigrate=true")?;
//!
//!     let mut builder = services.add_korm(settings)?;
//!     builder
//!         .use_database_configuration::<AppConfiguration>()
//!         .init_database_for_id_generator()?
//!         .add_korm_migrations()
//!         .migrate()?;
//!
//!     let database = builder.build()?;
//!     println!("{:?}", database);
//!     Ok(())
//! }
//! ```
//!
//! ## Project Structure
//!
//! ```text
//! src/
//! ├── core/            # Settings, errors, database trait and handle, services
//! ├── backends/        # Database backend implementations
//! ├── id_generator/    # Batch ID generators and their storage
//! ├── migrations/      # Script providers, options and the runner
//! ├── builder.rs       # Startup builder
//! └── lib.rs
//! ```

/// Core types and traits
pub mod core;

/// Database backend implementations
pub mod backends;

/// Batch ID generators
pub mod id_generator;

/// Database migrations
pub mod migrations;

/// Startup builder
pub mod builder;

/// Prelude for convenient imports
///
/// ```rust
/// use korm_bootstrap::prelude::*;
///
/// let mut services = ServiceCollection::new();
/// let settings = ConnectionSettings::new("app.db", DatabaseType::Sqlite, false)?;
/// let builder = services.add_korm(settings)?;
/// assert!(!builder.settings().auto_migrate());
/// # Ok::<(), DatabaseError>(())
/// ```
pub mod prelude {
    pub use crate::builder::{KormBuilder, KormServiceCollectionExt};
    pub use crate::core::{
        ConnectionSettings, Database, DatabaseBuilder, DatabaseConfiguration, DatabaseError,
        DatabaseResult, DatabaseRow, DatabaseType, DatabaseValue, KormDatabase, ModelBuilder,
        Result, ServiceCollection, ServiceProvider, TransactionGuard,
    };
    pub use crate::id_generator::{IdGenerator, IdGeneratorFactory};
    pub use crate::migrations::{EmbeddedScriptsProvider, MigrationOptions, MigrationsRunner};

    #[cfg(feature = "sqlite")]
    pub use crate::backends::SqliteDatabase;
}

// Re-export at root level for convenience
pub use builder::{KormBuilder, KormServiceCollectionExt};
pub use core::{
    ConnectionSettings, Database, DatabaseBuilder, DatabaseConfiguration, DatabaseError,
    DatabaseResult, DatabaseRow, DatabaseType, DatabaseValue, KormDatabase, MemoryCache, Model,
    ModelBuilder, Result, ServiceCollection, ServiceProvider, TransactionGuard,
};

#[cfg(feature = "sqlite")]
pub use backends::SqliteDatabase;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        use prelude::*;

        let db_type = DatabaseType::Sqlite;
        assert_eq!(db_type.to_str(), "sqlite");

        let mut services = ServiceCollection::new();
        let settings = ConnectionSettings::new("app.db", db_type, true).unwrap();
        let mut builder = services.add_korm(settings).unwrap();
        builder.add_korm_migrations();
        assert!(services.contains::<std::sync::Arc<dyn MigrationsRunner>>());
    }

    #[test]
    fn test_value_conversions() {
        use prelude::*;

        let val: DatabaseValue = 42i64.into();
        assert_eq!(val.as_long(), Some(42));

        let val: DatabaseValue = "test".into();
        assert_eq!(val.as_string(), "test");
    }
}
