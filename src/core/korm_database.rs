//! Database access object and the builder that materializes it

use super::database::{BackendFactory, Database};
use super::database_types::DatabaseType;
use super::error::{DatabaseError, Result};
use super::model::{DatabaseConfiguration, Model};
use super::settings::ConnectionSettings;
use super::transaction::TransactionGuard;
use super::value::{DatabaseResult, DatabaseValue};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

struct Inner {
    settings: ConnectionSettings,
    backend: Arc<dyn Database>,
    model: Model,
    connected: OnceCell<()>,
    transaction_lock: Arc<Mutex<()>>,
}

/// Handle to a configured database
///
/// Cloning is cheap and clones share one backend connection. The connection
/// is opened on first use, so building a handle never touches the database.
#[derive(Clone)]
pub struct KormDatabase {
    inner: Arc<Inner>,
}

impl KormDatabase {
    /// Wrap a backend with its settings and model
    pub fn new(settings: ConnectionSettings, backend: Arc<dyn Database>, model: Model) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                backend,
                model,
                connected: OnceCell::new(),
                transaction_lock: Arc::new(Mutex::new(())),
            }),
        }
    }

    /// Settings the handle is bound to
    pub fn settings(&self) -> &ConnectionSettings {
        &self.inner.settings
    }

    /// Provider of the underlying connection
    pub fn provider(&self) -> DatabaseType {
        self.inner.settings.provider()
    }

    /// Entity mappings built from the database configuration
    pub fn model(&self) -> &Model {
        &self.inner.model
    }

    /// The backend connection, opened if necessary
    pub async fn connection(&self) -> Result<Arc<dyn Database>> {
        let backend = &self.inner.backend;
        self.inner
            .connected
            .get_or_try_init(|| async {
                if !backend.is_connected() {
                    tracing::debug!(provider = %self.provider(), "opening database connection");
                    backend.connect(self.inner.settings.connection_string()).await?;
                }
                Ok::<(), DatabaseError>(())
            })
            .await?;
        Ok(Arc::clone(backend))
    }

    /// Execute a single statement
    pub async fn execute(&self, query: &str) -> Result<u64> {
        self.connection().await?.execute(query).await
    }

    /// Execute a multi-statement script
    pub async fn execute_batch(&self, script: &str) -> Result<()> {
        self.connection().await?.execute_batch(script).await
    }

    /// Execute a parameterized statement
    pub async fn execute_with_params(&self, query: &str, params: &[DatabaseValue]) -> Result<u64> {
        self.connection()
            .await?
            .execute_with_params(query, params)
            .await
    }

    /// Run a query
    pub async fn query(&self, query: &str) -> Result<DatabaseResult> {
        self.connection().await?.query(query).await
    }

    /// Run a parameterized query
    pub async fn query_with_params(
        &self,
        query: &str,
        params: &[DatabaseValue],
    ) -> Result<DatabaseResult> {
        self.connection()
            .await?
            .query_with_params(query, params)
            .await
    }

    /// Begin a transaction that rolls back unless committed
    ///
    /// Clones share one connection, so a transaction waits until the one
    /// started through another clone has ended.
    pub async fn begin_transaction(&self) -> Result<TransactionGuard> {
        let connection = self.connection().await?;
        TransactionGuard::begin_exclusive(connection, Arc::clone(&self.inner.transaction_lock)).await
    }
}

impl std::fmt::Debug for KormDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KormDatabase")
            .field("provider", &self.provider())
            .field("entities", &self.inner.model.len())
            .field("connected", &self.inner.backend.is_connected())
            .finish()
    }
}

/// Underlying database-construction object
///
/// ```no_run
/// use korm_bootstrap::{ConnectionSettings, DatabaseBuilder, DatabaseType};
///
/// # fn example() -> korm_bootstrap::Result<()> {
/// let settings = ConnectionSettings::new("app.db", DatabaseType::Sqlite, false)?;
/// let database = DatabaseBuilder::new().use_connection(settings).build()?;
/// # Ok(())
/// # }
/// ```
pub struct DatabaseBuilder {
    settings: Option<ConnectionSettings>,
    configuration: Option<Arc<dyn DatabaseConfiguration>>,
    backend_factory: BackendFactory,
}

impl DatabaseBuilder {
    /// Create a builder using the bundled backends
    pub fn new() -> Self {
        Self {
            settings: None,
            configuration: None,
            backend_factory: crate::backends::default_backend_factory(),
        }
    }

    /// Bind the database to a connection
    pub fn use_connection(&mut self, settings: ConnectionSettings) -> &mut Self {
        self.settings = Some(settings);
        self
    }

    /// Set the mapping rules applied when the database is built
    pub fn use_database_configuration(
        &mut self,
        configuration: Arc<dyn DatabaseConfiguration>,
    ) -> &mut Self {
        self.configuration = Some(configuration);
        self
    }

    /// Replace the provider → backend factory
    pub fn use_backend_factory(&mut self, factory: BackendFactory) -> &mut Self {
        self.backend_factory = factory;
        self
    }

    /// The configured connection, if any
    pub fn settings(&self) -> Option<&ConnectionSettings> {
        self.settings.as_ref()
    }

    /// The current provider → backend factory
    pub fn backend_factory(&self) -> BackendFactory {
        Arc::clone(&self.backend_factory)
    }

    /// Materialize a database handle with a fresh backend
    ///
    /// # Errors
    ///
    /// `Configuration` if no connection was set; backend factory errors (an
    /// unsupported provider, for instance) are returned unchanged.
    pub fn build(&self) -> Result<KormDatabase> {
        let settings = self
            .settings
            .clone()
            .ok_or_else(|| DatabaseError::configuration("No connection configured, call use_connection first"))?;
        settings.validate()?;

        let backend = (self.backend_factory)(settings.provider())?;
        let model = self
            .configuration
            .as_deref()
            .map(Model::from_configuration)
            .unwrap_or_default();

        Ok(KormDatabase::new(settings, backend, model))
    }
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::ModelBuilder;

    struct People;

    impl DatabaseConfiguration for People {
        fn on_model_creating(&self, model: &mut ModelBuilder) {
            model.entity("Person").has_table_name("People");
        }
    }

    #[test]
    fn test_build_without_connection_fails() {
        let err = DatabaseBuilder::new().build().unwrap_err();
        assert!(matches!(err, DatabaseError::Configuration(_)));
    }

    #[test]
    fn test_build_unsupported_provider() {
        let settings = ConnectionSettings::new("host=db", DatabaseType::Postgres, false).unwrap();
        let err = DatabaseBuilder::new()
            .use_connection(settings)
            .build()
            .unwrap_err();
        assert!(matches!(err, DatabaseError::UnsupportedOperation(_)));
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_build_applies_configuration_and_connects_lazily() {
        let settings = ConnectionSettings::new(":memory:", DatabaseType::Sqlite, false).unwrap();
        let database = DatabaseBuilder::new()
            .use_connection(settings)
            .use_database_configuration(Arc::new(People))
            .build()
            .unwrap();

        assert_eq!(database.model().table_name("Person"), "People");
        assert!(!database.inner.backend.is_connected());

        database
            .execute("CREATE TABLE People (Id INTEGER PRIMARY KEY)")
            .await
            .unwrap();
        assert!(database.inner.backend.is_connected());

        let rows = database.query("SELECT * FROM People").await.unwrap();
        assert!(rows.is_empty());
    }
}
