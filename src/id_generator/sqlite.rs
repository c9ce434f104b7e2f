//! SQLite ID generator backed by an `IdStore` table

use super::{validate_batch_size, IdGenerator, IdGeneratorFactory};
use crate::core::error::{DatabaseError, Result};
use crate::core::korm_database::KormDatabase;
use crate::core::value::DatabaseValue;
use async_trait::async_trait;

/// Table holding the last reserved key per table name
pub const ID_STORE_TABLE: &str = "IdStore";

const CREATE_ID_STORE: &str = "CREATE TABLE IF NOT EXISTS IdStore (
    TableName TEXT PRIMARY KEY NOT NULL,
    LastId INTEGER NOT NULL
)";

const RESERVE_BATCH: &str = "INSERT INTO IdStore (TableName, LastId) VALUES (?, ?)
    ON CONFLICT(TableName) DO UPDATE SET LastId = LastId + excluded.LastId";

const SELECT_LAST_ID: &str = "SELECT LastId FROM IdStore WHERE TableName = ?";

/// Factory for generators sharing one SQLite database
pub struct SqliteIdGeneratorFactory {
    database: KormDatabase,
}

impl SqliteIdGeneratorFactory {
    /// Bind the factory to a database
    pub fn new(database: KormDatabase) -> Self {
        Self { database }
    }
}

impl IdGeneratorFactory for SqliteIdGeneratorFactory {
    fn get_generator(&self, table_name: &str, batch_size: usize) -> Result<Box<dyn IdGenerator>> {
        let batch_size = validate_batch_size(batch_size)?;
        Ok(Box::new(SqliteIdGenerator {
            database: self.database.clone(),
            table_name: table_name.to_string(),
            batch_size,
            next: 1,
            last: 0,
        }))
    }
}

/// Generator reserving `batch_size` keys per database round trip
pub struct SqliteIdGenerator {
    database: KormDatabase,
    table_name: String,
    batch_size: i64,
    next: i64,
    last: i64,
}

impl SqliteIdGenerator {
    /// Table the generator produces keys for
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn reserve_batch(&mut self) -> Result<()> {
        let tx = self.database.begin_transaction().await?;

        let reserved = async {
            tx.execute_with_params(
                RESERVE_BATCH,
                &[
                    DatabaseValue::from(self.table_name.as_str()),
                    DatabaseValue::Long(self.batch_size),
                ],
            )
            .await?;

            let rows = tx
                .query_with_params(SELECT_LAST_ID, &[DatabaseValue::from(self.table_name.as_str())])
                .await?;
            rows.first()
                .and_then(|row| row.get("LastId"))
                .and_then(DatabaseValue::as_long)
                .ok_or_else(|| DatabaseError::ColumnNotFound("LastId".to_string()))
        }
        .await;

        match reserved {
            Ok(last) => {
                tx.commit().await?;
                self.last = last;
                self.next = last - self.batch_size + 1;
                tracing::trace!(
                    table = %self.table_name,
                    first = self.next,
                    last = self.last,
                    "reserved id batch"
                );
                Ok(())
            }
            Err(e) => {
                if let Err(rollback_error) = tx.rollback().await {
                    tracing::warn!(error = %rollback_error, "rollback after failed id reservation failed");
                }
                Err(DatabaseError::id_generator(format!(
                    "Reserving ids for '{}' failed: {}",
                    self.table_name, e
                )))
            }
        }
    }
}

#[async_trait]
impl IdGenerator for SqliteIdGenerator {
    async fn next_id(&mut self) -> Result<i64> {
        if self.next > self.last {
            self.reserve_batch().await?;
        }
        let id = self.next;
        self.next += 1;
        Ok(id)
    }

    async fn init_database_for_id_generator(&self) -> Result<()> {
        tracing::debug!(table = ID_STORE_TABLE, "initializing id store");
        self.database.execute_batch(CREATE_ID_STORE).await
    }
}

impl Drop for SqliteIdGenerator {
    fn drop(&mut self) {
        tracing::trace!(table = %self.table_name, "id generator released");
    }
}
