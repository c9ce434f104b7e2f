//! Transaction guard for automatic rollback on drop
//!
//! This module provides RAII-style transaction management with automatic rollback.

use super::database::Database;
use super::error::{DatabaseError, Result};
use super::value::{DatabaseResult, DatabaseValue};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Transaction guard that automatically rolls back on drop if not committed
///
/// If the guard is dropped without calling `commit()` or `rollback()`, the
/// rollback is queued on the current tokio runtime. Migration scripts and ID
/// batch reservations both run through this guard.
///
/// # Example
///
/// ```ignore
/// let tx = TransactionGuard::begin(backend).await?;
/// tx.execute_batch("CREATE TABLE people (id INTEGER PRIMARY KEY)").await?;
/// tx.commit().await?;
/// ```
pub struct TransactionGuard {
    db: Arc<dyn Database>,
    committed: AtomicBool,
    rolled_back: AtomicBool,
    /// Held until the transaction ends so transactions on one connection
    /// never interleave
    exclusive: Option<OwnedMutexGuard<()>>,
}

impl TransactionGuard {
    /// Begin a new transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the database is not connected or a transaction is
    /// already active.
    pub async fn begin(db: Arc<dyn Database>) -> Result<Self> {
        Self::start(db, None).await
    }

    /// Begin a new transaction once no other transaction holds `lock`
    ///
    /// The lock stays held until the transaction is committed or rolled back.
    pub async fn begin_exclusive(db: Arc<dyn Database>, lock: Arc<Mutex<()>>) -> Result<Self> {
        let exclusive = lock.lock_owned().await;
        Self::start(db, Some(exclusive)).await
    }

    async fn start(db: Arc<dyn Database>, exclusive: Option<OwnedMutexGuard<()>>) -> Result<Self> {
        db.begin_transaction().await?;

        Ok(Self {
            db,
            committed: AtomicBool::new(false),
            rolled_back: AtomicBool::new(false),
            exclusive,
        })
    }

    fn ensure_active(&self) -> Result<()> {
        if self.committed.load(Ordering::Acquire) {
            return Err(DatabaseError::transaction(
                "Cannot use a committed transaction",
            ));
        }
        if self.rolled_back.load(Ordering::Acquire) {
            return Err(DatabaseError::transaction(
                "Cannot use a rolled back transaction",
            ));
        }
        Ok(())
    }

    /// Execute a statement within the transaction
    pub async fn execute(&self, query: &str) -> Result<u64> {
        self.ensure_active()?;
        self.db.execute(query).await
    }

    /// Execute a multi-statement script within the transaction
    pub async fn execute_batch(&self, script: &str) -> Result<()> {
        self.ensure_active()?;
        self.db.execute_batch(script).await
    }

    /// Execute a multi-statement script bounded by `timeout`
    pub async fn execute_batch_with_timeout(&self, script: &str, timeout: Duration) -> Result<()> {
        self.ensure_active()?;
        self.db.execute_batch_with_timeout(script, timeout).await
    }

    /// Execute a parameterized statement within the transaction
    pub async fn execute_with_params(&self, query: &str, params: &[DatabaseValue]) -> Result<u64> {
        self.ensure_active()?;
        self.db.execute_with_params(query, params).await
    }

    /// Query with parameters within the transaction
    pub async fn query_with_params(
        &self,
        query: &str,
        params: &[DatabaseValue],
    ) -> Result<DatabaseResult> {
        self.ensure_active()?;
        self.db.query_with_params(query, params).await
    }

    /// Commit the transaction
    ///
    /// After calling this method the guard will not roll back on drop.
    pub async fn commit(self) -> Result<()> {
        if self.rolled_back.load(Ordering::Acquire) {
            return Err(DatabaseError::transaction(
                "Cannot commit a rolled back transaction",
            ));
        }

        self.db.commit().await?;
        self.committed.store(true, Ordering::Release);
        Ok(())
    }

    /// Explicitly rollback the transaction
    pub async fn rollback(self) -> Result<()> {
        if self.committed.load(Ordering::Acquire) {
            return Err(DatabaseError::transaction(
                "Cannot rollback a committed transaction",
            ));
        }

        self.rolled_back.store(true, Ordering::Release);
        self.db.rollback().await
    }
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        if self.committed.load(Ordering::Acquire) || self.rolled_back.load(Ordering::Acquire) {
            return;
        }

        self.rolled_back.store(true, Ordering::Release);
        let db = Arc::clone(&self.db);
        let exclusive = self.exclusive.take();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = db.rollback().await {
                        tracing::error!(error = %e, "transaction auto-rollback failed");
                    }
                    drop(exclusive);
                });
                tracing::warn!("transaction guard dropped without commit or rollback, rollback queued");
            }
            Err(_) => {
                // The backend rolls back open transactions when the connection closes.
                tracing::warn!("transaction guard dropped outside a tokio runtime");
            }
        }
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::backends::SqliteDatabase;

    async fn connected() -> Arc<dyn Database> {
        let db = SqliteDatabase::new();
        db.connect(":memory:").await.unwrap();
        db.execute("CREATE TABLE test (id INTEGER PRIMARY KEY, value TEXT)")
            .await
            .unwrap();
        Arc::new(db)
    }

    #[tokio::test]
    async fn test_transaction_guard_commit() {
        let db = connected().await;

        let tx = TransactionGuard::begin(Arc::clone(&db)).await.unwrap();
        tx.execute("INSERT INTO test (value) VALUES ('test1')")
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let results = db.query("SELECT * FROM test").await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(!db.in_transaction());
    }

    #[tokio::test]
    async fn test_transaction_guard_explicit_rollback() {
        let db = connected().await;

        let tx = TransactionGuard::begin(Arc::clone(&db)).await.unwrap();
        tx.execute_batch("INSERT INTO test (value) VALUES ('a'); INSERT INTO test (value) VALUES ('b');")
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        let results = db.query("SELECT * FROM test").await.unwrap();
        assert_eq!(results.len(), 0);
    }

    #[tokio::test]
    async fn test_exclusive_transactions_wait_for_each_other() {
        let db = connected().await;
        let lock = Arc::new(Mutex::new(()));

        let first = TransactionGuard::begin_exclusive(Arc::clone(&db), Arc::clone(&lock))
            .await
            .unwrap();
        let second = tokio::spawn(TransactionGuard::begin_exclusive(
            Arc::clone(&db),
            Arc::clone(&lock),
        ));

        tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        assert!(!second.is_finished());

        first
            .execute("INSERT INTO test (value) VALUES ('first')")
            .await
            .unwrap();
        first.commit().await.unwrap();

        let second = second.await.unwrap().unwrap();
        second
            .execute("INSERT INTO test (value) VALUES ('second')")
            .await
            .unwrap();
        second.rollback().await.unwrap();

        let results = db.query("SELECT * FROM test").await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_transaction_guard_rollback_on_drop() {
        let db = connected().await;

        {
            let tx = TransactionGuard::begin(Arc::clone(&db)).await.unwrap();
            tx.execute("INSERT INTO test (value) VALUES ('test1')")
                .await
                .unwrap();
        }

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        let results = db.query("SELECT * FROM test").await.unwrap();
        assert_eq!(results.len(), 0);
    }
}
