//! Migrations runner
//!
//! Applies pending scripts in id order. Each script runs in its own
//! transaction together with the history row that records it, so a failing
//! script leaves neither its changes nor its history entry behind.

use super::options::MigrationOptions;
use super::providers::ScriptsProvider;
use super::script::ScriptInfo;
use crate::core::cache::MemoryCache;
use crate::core::error::{DatabaseError, Result};
use crate::core::korm_database::KormDatabase;
use crate::core::value::DatabaseValue;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Table recording applied migrations
pub const MIGRATIONS_HISTORY_TABLE: &str = "__KormMigrationsHistory";

/// Written into the history table next to every applied script
const PRODUCT_INFO: &str = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));

/// Runs database migrations
#[async_trait]
pub trait MigrationsRunner: Send + Sync {
    /// Apply every pending migration
    async fn migrate(&self) -> Result<()>;
}

/// Runner applying scripts from [`MigrationOptions`] to a [`KormDatabase`]
pub struct DatabaseMigrationsRunner {
    database: KormDatabase,
    options: MigrationOptions,
    cache: Arc<MemoryCache>,
}

impl DatabaseMigrationsRunner {
    /// Create a runner
    ///
    /// `cache` remembers connections already migrated by this process.
    pub fn new(database: KormDatabase, options: MigrationOptions, cache: Arc<MemoryCache>) -> Self {
        Self {
            database,
            options,
            cache,
        }
    }

    /// Options the runner was built with
    pub fn options(&self) -> &MigrationOptions {
        &self.options
    }

    fn cache_key(&self) -> String {
        format!(
            "{}:{}",
            MIGRATIONS_HISTORY_TABLE,
            self.database.settings().connection_string()
        )
    }

    async fn ensure_history_table(&self) -> Result<()> {
        let create_table_sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                MigrationId INTEGER PRIMARY KEY NOT NULL,
                MigrationName TEXT NOT NULL,
                ProductInfo TEXT NOT NULL,
                Updated TEXT NOT NULL
            )",
            MIGRATIONS_HISTORY_TABLE
        );
        self.database.execute(&create_table_sql).await?;
        Ok(())
    }

    /// Id of the last applied migration, if any
    pub async fn last_applied_id(&self) -> Result<Option<i64>> {
        self.ensure_history_table().await?;

        let query = format!(
            "SELECT MAX(MigrationId) AS LastId FROM {}",
            MIGRATIONS_HISTORY_TABLE
        );
        let rows = self.database.query(&query).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get("LastId"))
            .and_then(DatabaseValue::as_long))
    }

    /// Scripts above `last_applied`, sorted by id
    async fn pending_scripts(
        &self,
        last_applied: Option<i64>,
    ) -> Result<Vec<(ScriptInfo, Arc<dyn ScriptsProvider>)>> {
        let mut scripts: BTreeMap<i64, (ScriptInfo, Arc<dyn ScriptsProvider>)> = BTreeMap::new();

        for provider in self.options.providers() {
            for script in provider.scripts().await? {
                if let Some((existing, other)) = scripts.get(&script.id()) {
                    return Err(DatabaseError::migration(format!(
                        "Duplicate migration id {}: '{}' in {} and '{}' in {}",
                        script.id(),
                        existing.key(),
                        other.source(),
                        script.key(),
                        provider.source()
                    )));
                }
                scripts.insert(script.id(), (script, Arc::clone(provider)));
            }
        }

        Ok(scripts
            .into_values()
            .filter(|(script, _)| last_applied.map_or(true, |last| script.id() > last))
            .collect())
    }

    async fn apply(&self, script: &ScriptInfo, provider: &dyn ScriptsProvider) -> Result<()> {
        let body = provider.load(script).await?;
        let tx = self.database.begin_transaction().await?;

        let insert_sql = format!(
            "INSERT INTO {} (MigrationId, MigrationName, ProductInfo, Updated) VALUES (?, ?, ?, ?)",
            MIGRATIONS_HISTORY_TABLE
        );
        let timeout = self.options.timeout();

        let applied = async {
            tx.execute_batch_with_timeout(&body, timeout).await?;
            tx.execute_with_params(
                &insert_sql,
                &[
                    DatabaseValue::Long(script.id()),
                    DatabaseValue::from(script.name()),
                    DatabaseValue::from(PRODUCT_INFO),
                    DatabaseValue::String(chrono::Utc::now().to_rfc3339()),
                ],
            )
            .await
        }
        .await;

        match applied {
            Ok(_) => tx.commit().await,
            Err(e) => {
                if let Err(rollback_error) = tx.rollback().await {
                    tracing::warn!(error = %rollback_error, script = script.key(), "rollback of failed migration failed");
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl MigrationsRunner for DatabaseMigrationsRunner {
    async fn migrate(&self) -> Result<()> {
        let cache_key = self.cache_key();
        if self.cache.contains(&cache_key) {
            tracing::debug!("database already migrated by this process");
            return Ok(());
        }

        let last_applied = self.last_applied_id().await?;
        let pending = self.pending_scripts(last_applied).await?;
        tracing::info!(
            last_applied = ?last_applied,
            pending = pending.len(),
            "checking database migrations"
        );

        for (script, provider) in &pending {
            tracing::info!(id = script.id(), name = script.name(), "applying migration");
            self.apply(script, &**provider).await.map_err(|e| {
                tracing::error!(id = script.id(), error = %e, "migration failed");
                DatabaseError::migration(format!(
                    "Script '{}' from {} failed: {}",
                    script.key(),
                    provider.source(),
                    e
                ))
            })?;
        }

        self.cache.set(cache_key, true);
        Ok(())
    }
}
