//! Repository implementations for SQLite storage

pub mod attempt_log;
pub mod lock;

pub use attempt_log::SqliteAttemptLogRepository;
pub use lock::SqliteLockRepository;

use async_trait::async_trait;
use bastille_core::{
    Error,
    error::StorageError,
    repositories::{AttemptLogRepositoryProvider, LockRepositoryProvider, RepositoryProvider},
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Repository provider implementation for SQLite
///
/// This struct implements the individual repository provider traits as well
/// as the unified `RepositoryProvider` trait.
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    locks: Arc<SqliteLockRepository>,
    attempt_logs: Arc<SqliteAttemptLogRepository>,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        let locks = Arc::new(SqliteLockRepository::new(pool.clone()));
        let attempt_logs = Arc::new(SqliteAttemptLogRepository::new(pool.clone()));

        Self {
            pool,
            locks,
            attempt_logs,
        }
    }

    /// Connect to a SQLite database and wrap it in a provider.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let pool = SqlitePool::connect(url).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to SQLite database");
            StorageError::Connection("Failed to connect to SQLite database".to_string())
        })?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl LockRepositoryProvider for SqliteRepositoryProvider {
    type LockRepo = SqliteLockRepository;

    fn locks(&self) -> &Self::LockRepo {
        &self.locks
    }
}

impl AttemptLogRepositoryProvider for SqliteRepositoryProvider {
    type AttemptLogRepo = SqliteAttemptLogRepository;

    fn attempt_logs(&self) -> &Self::AttemptLogRepo {
        &self.attempt_logs
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        use crate::migrations::{
            CreateAttemptLogsTable, CreateLockRecordsTable, CreateLockoutIndexes,
            SqliteMigrationManager,
        };
        use bastille_migration::{Migration, MigrationManager};

        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager.initialize().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize migrations");
            Error::Storage(StorageError::Migration(
                "Failed to initialize migrations".to_string(),
            ))
        })?;

        let migrations: Vec<Box<dyn Migration<_>>> = vec![
            Box::new(CreateLockRecordsTable),
            Box::new(CreateAttemptLogsTable),
            Box::new(CreateLockoutIndexes),
        ];
        manager.up(&migrations).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            Error::Storage(StorageError::Migration(
                "Failed to run migrations".to_string(),
            ))
        })?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;
        Ok(())
    }
}
