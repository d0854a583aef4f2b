//! SQLite implementation of the attempt log repository.

use async_trait::async_trait;
use bastille_core::{
    Error, RequestContext, SubjectRef,
    error::StorageError,
    lock::AttemptLogEntry,
    repositories::AttemptLogRepository,
};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// SQLite repository for the append-only attempt log.
pub struct SqliteAttemptLogRepository {
    pool: SqlitePool,
}

impl SqliteAttemptLogRepository {
    /// Create a new SQLite attempt log repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteAttemptLogEntry {
    id: i64,
    identifier: String,
    subject_kind: Option<String>,
    subject_id: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    attempted_at: i64,
}

impl From<SqliteAttemptLogEntry> for AttemptLogEntry {
    fn from(row: SqliteAttemptLogEntry) -> Self {
        let subject = match (row.subject_kind, row.subject_id) {
            (Some(kind), Some(id)) => Some(SubjectRef::new(kind.as_str(), id)),
            _ => None,
        };

        AttemptLogEntry {
            id: row.id,
            identifier: row.identifier,
            subject,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            attempted_at: DateTime::from_timestamp(row.attempted_at, 0).expect("Invalid timestamp"),
        }
    }
}

#[async_trait]
impl AttemptLogRepository for SqliteAttemptLogRepository {
    async fn append(
        &self,
        identifier: &str,
        subject: Option<&SubjectRef>,
        context: &RequestContext,
    ) -> Result<AttemptLogEntry, Error> {
        let now = Utc::now().timestamp();

        let row = sqlx::query_as::<_, SqliteAttemptLogEntry>(
            r#"
            INSERT INTO attempt_logs
                (identifier, subject_kind, subject_id, ip_address, user_agent, attempted_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, identifier, subject_kind, subject_id, ip_address, user_agent, attempted_at
            "#,
        )
        .bind(identifier)
        .bind(subject.map(|s| s.kind.as_str().to_string()))
        .bind(subject.map(|s| s.id.clone()))
        .bind(&context.ip_address)
        .bind(&context.user_agent)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to append attempt log entry");
            StorageError::Database("Failed to append attempt log entry".to_string())
        })?;

        Ok(row.into())
    }

    async fn count_since(&self, identifier: &str, since: DateTime<Utc>) -> Result<u64, Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM attempt_logs WHERE identifier = ? AND attempted_at >= ?",
        )
        .bind(identifier)
        .bind(since.timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to count attempt log entries");
            StorageError::Database("Failed to count attempt log entries".to_string())
        })?;

        Ok(count as u64)
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM attempt_logs WHERE attempted_at < ?")
            .bind(cutoff.timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to prune attempt log entries");
                StorageError::Database("Failed to prune attempt log entries".to_string())
            })?;

        Ok(result.rows_affected())
    }
}
