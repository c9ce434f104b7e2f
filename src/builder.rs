//! Startup builder
//!
//! [`KormBuilder`] is created once during application startup, configured
//! through its fluent methods and dropped after `migrate`/`build`.
//!
//! ```rust,no_run
//! use korm_bootstrap::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let mut services = ServiceCollection::new();
//! let settings = ConnectionSettings::parse("Data Source=app.db;KormAutoMigrate=true")?;
//!
//! let mut builder = services.add_korm(settings)?;
//! builder
//!     .init_database_for_id_generator()?
//!     .add_korm_migrations_with(|options| {
//!         options.add_file_scripts_provider("db/scripts");
//!     })
//!     .migrate()?;
//! let database = builder.build()?;
//! # Ok(())
//! # }
//! ```

use crate::core::cache::MemoryCache;
use crate::core::database::BackendFactory;
use crate::core::database_types::DatabaseType;
use crate::core::error::Result;
use crate::core::korm_database::{DatabaseBuilder, KormDatabase};
use crate::core::model::DatabaseConfiguration;
use crate::core::runtime;
use crate::core::services::ServiceCollection;
use crate::core::settings::ConnectionSettings;
use crate::id_generator::{IdGeneratorFactories, IdGeneratorFactory, IdGeneratorFactoryConstructor};
use crate::migrations::{
    setup_migration_options, DatabaseMigrationsRunner, MigrationOptions, MigrationOptionsSetup,
    MigrationsRunner, DEFAULT_SCRIPTS_DIR,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Fluent startup configuration for one database connection
pub struct KormBuilder<'a> {
    services: &'a mut ServiceCollection,
    settings: ConnectionSettings,
    database_builder: DatabaseBuilder,
    id_generator_factories: IdGeneratorFactories,
    default_scripts_dir: PathBuf,
}

impl<'a> KormBuilder<'a> {
    /// Create a builder registering into `services`
    ///
    /// # Errors
    ///
    /// `InvalidArgument` naming `connection_string` when the connection string
    /// is empty or whitespace-only.
    pub fn new(services: &'a mut ServiceCollection, settings: ConnectionSettings) -> Result<Self> {
        settings.validate()?;

        let mut database_builder = DatabaseBuilder::new();
        database_builder.use_connection(settings.clone());

        tracing::debug!(
            provider = %settings.provider(),
            auto_migrate = settings.auto_migrate(),
            "korm builder created"
        );

        Ok(Self {
            services,
            settings,
            database_builder,
            id_generator_factories: IdGeneratorFactories::new(),
            default_scripts_dir: PathBuf::from(DEFAULT_SCRIPTS_DIR),
        })
    }

    /// Settings the builder was created with
    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// The registry services are added to
    pub fn services(&mut self) -> &mut ServiceCollection {
        &mut *self.services
    }

    /// Directory the default scripts provider reads from
    pub fn default_scripts_dir(&self) -> &Path {
        &self.default_scripts_dir
    }

    /// Apply the mapping rules of configuration type `C`
    pub fn use_database_configuration<C>(&mut self) -> &mut Self
    where
        C: DatabaseConfiguration + Default + 'static,
    {
        self.use_database_configuration_instance(C::default())
    }

    /// Apply the mapping rules of a configuration instance
    pub fn use_database_configuration_instance(
        &mut self,
        configuration: impl DatabaseConfiguration + 'static,
    ) -> &mut Self {
        self.database_builder
            .use_database_configuration(Arc::new(configuration));
        self
    }

    /// Replace the provider → backend factory
    ///
    /// Applies to databases built afterwards, including the ones created for
    /// migrations registered afterwards.
    pub fn use_backend_factory(&mut self, factory: BackendFactory) -> &mut Self {
        self.database_builder.use_backend_factory(factory);
        self
    }

    /// Read default migration scripts from `directory`
    ///
    /// Must be called before [`KormBuilder::add_korm_migrations`] to take effect.
    pub fn use_default_scripts_dir(&mut self, directory: impl Into<PathBuf>) -> &mut Self {
        self.default_scripts_dir = directory.into();
        self
    }

    /// Register or replace the ID generator factory for a provider
    pub fn register_id_generator_factory(
        &mut self,
        provider: DatabaseType,
        constructor: IdGeneratorFactoryConstructor,
    ) -> &mut Self {
        self.id_generator_factories.register(provider, constructor);
        self
    }

    /// Create the database objects ID generators need
    ///
    /// Blocks the calling thread; see [`KormBuilder::migrate`] for the
    /// runtime rules. The generator acquired for this is released whether
    /// the initialization succeeds or fails.
    pub fn init_database_for_id_generator(&mut self) -> Result<&mut Self> {
        let factory = self.id_generator_factory()?;
        runtime::block_on("init_database_for_id_generator", init_id_store(factory))??;
        Ok(self)
    }

    /// Async variant of [`KormBuilder::init_database_for_id_generator`]
    pub async fn init_database_for_id_generator_async(&mut self) -> Result<&mut Self> {
        let factory = self.id_generator_factory()?;
        init_id_store(factory).await?;
        Ok(self)
    }

    fn id_generator_factory(&self) -> Result<Arc<dyn IdGeneratorFactory>> {
        let database = self.database_builder.build()?;
        self.id_generator_factories.get_factory(&database)
    }

    /// Register the migrations runner with the default scripts directory
    pub fn add_korm_migrations(&mut self) -> &mut Self {
        self.register_migrations(None)
    }

    /// Register the migrations runner configured by `setup`
    ///
    /// `setup` alone decides the script providers; the default directory is
    /// not added.
    pub fn add_korm_migrations_with<F>(&mut self, setup: F) -> &mut Self
    where
        F: Fn(&mut MigrationOptions) + Send + Sync + 'static,
    {
        self.register_migrations(Some(Arc::new(setup)))
    }

    fn register_migrations(&mut self, setup: Option<MigrationOptionsSetup>) -> &mut Self {
        let settings = self.settings.clone();
        let backend_factory = self.database_builder.backend_factory();
        let scripts_dir = self.default_scripts_dir.clone();

        self.services.try_add_singleton(Arc::new(MemoryCache::new()));
        self.services
            .add_transient::<Arc<dyn MigrationsRunner>, _>(move |provider| {
                let cache = provider.get::<Arc<MemoryCache>>()?;
                let database = DatabaseBuilder::new()
                    .use_connection(settings.clone())
                    .use_backend_factory(Arc::clone(&backend_factory))
                    .build()?;
                let options = setup_migration_options(setup.as_deref(), &scripts_dir);
                tracing::debug!(?options, "migrations runner constructed");

                Ok(Arc::new(DatabaseMigrationsRunner::new(database, options, cache))
                    as Arc<dyn MigrationsRunner>)
            });
        self
    }

    /// Run migrations if the connection has auto-migrate enabled
    ///
    /// Without auto-migrate nothing is resolved and nothing runs. Otherwise the
    /// registered runner is resolved and driven to completion on a runtime
    /// owned by this call, blocking the calling thread.
    ///
    /// # Errors
    ///
    /// `BlockingInAsyncContext` when called from inside a tokio runtime (use
    /// [`KormBuilder::migrate_async`] there), `ServiceNotRegistered` when no
    /// runner was registered, and the runner's own error unchanged.
    pub fn migrate(&self) -> Result<()> {
        if !self.settings.auto_migrate() {
            tracing::debug!("auto-migrate disabled, skipping migrations");
            return Ok(());
        }

        let runner = self.resolve_runner()?;
        runtime::block_on("migrate", async move { runner.migrate().await })?
    }

    /// Async variant of [`KormBuilder::migrate`]
    pub async fn migrate_async(&self) -> Result<()> {
        if !self.settings.auto_migrate() {
            tracing::debug!("auto-migrate disabled, skipping migrations");
            return Ok(());
        }

        let runner = self.resolve_runner()?;
        runner.migrate().await
    }

    fn resolve_runner(&self) -> Result<Arc<dyn MigrationsRunner>> {
        self.services
            .build_service_provider()
            .get::<Arc<dyn MigrationsRunner>>()
    }

    /// Materialize the database handle
    pub fn build(&self) -> Result<KormDatabase> {
        self.database_builder.build()
    }
}

async fn init_id_store(factory: Arc<dyn IdGeneratorFactory>) -> Result<()> {
    let generator = factory.get_generator("", 1)?;
    generator.init_database_for_id_generator().await
}

/// Entry point adding the builder to a [`ServiceCollection`]
pub trait KormServiceCollectionExt {
    /// Start configuring a database connection
    fn add_korm(&mut self, settings: ConnectionSettings) -> Result<KormBuilder<'_>>;
}

impl KormServiceCollectionExt for ServiceCollection {
    fn add_korm(&mut self, settings: ConnectionSettings) -> Result<KormBuilder<'_>> {
        KormBuilder::new(self, settings)
    }
}
