//! SQLite implementation of the lock record repository.

use async_trait::async_trait;
use bastille_core::{
    Error, LockId, LockRecord, NewLock, SubjectRef, UnlockUpdate,
    error::StorageError,
    repositories::LockRepository,
};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// SQLite repository for persistent lock records.
pub struct SqliteLockRepository {
    pool: SqlitePool,
}

impl SqliteLockRepository {
    /// Create a new SQLite lock repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteLockRecord {
    id: String,
    subject_kind: String,
    subject_id: String,
    locked_at: i64,
    unlocked_at: Option<i64>,
    expires_at: Option<i64>,
    reason: Option<String>,
    meta: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl From<SqliteLockRecord> for LockRecord {
    fn from(row: SqliteLockRecord) -> Self {
        let meta = row.meta.as_deref().and_then(|raw| {
            serde_json::from_str(raw)
                .map_err(|e| {
                    tracing::warn!(error = %e, "Dropping unparseable lock meta");
                })
                .ok()
        });

        LockRecord {
            id: LockId::new(row.id),
            subject: SubjectRef::new(row.subject_kind.as_str(), row.subject_id),
            locked_at: timestamp(row.locked_at),
            unlocked_at: row.unlocked_at.map(timestamp),
            expires_at: row.expires_at.map(timestamp),
            reason: row.reason,
            meta,
            created_at: timestamp(row.created_at),
            updated_at: timestamp(row.updated_at),
        }
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).expect("Invalid timestamp")
}

const ACTIVE_LOCK_QUERY: &str = r#"
    SELECT id, subject_kind, subject_id, locked_at, unlocked_at, expires_at,
           reason, meta, created_at, updated_at
    FROM lock_records
    WHERE subject_kind = ? AND subject_id = ?
      AND unlocked_at IS NULL
      AND (expires_at IS NULL OR expires_at > ?)
    ORDER BY locked_at DESC
    LIMIT 1
    "#;

#[async_trait]
impl LockRepository for SqliteLockRepository {
    async fn create_lock(&self, subject: &SubjectRef, lock: NewLock) -> Result<LockRecord, Error> {
        let id = LockId::generate();
        let locked_at = lock.locked_at.unwrap_or_else(Utc::now).timestamp();
        let meta = lock
            .meta
            .as_ref()
            .map(|meta| serde_json::to_string(meta).unwrap_or_default());
        let now = Utc::now().timestamp();

        let row = sqlx::query_as::<_, SqliteLockRecord>(
            r#"
            INSERT INTO lock_records
                (id, subject_kind, subject_id, locked_at, expires_at, reason, meta, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, subject_kind, subject_id, locked_at, unlocked_at, expires_at,
                      reason, meta, created_at, updated_at
            "#,
        )
        .bind(id.as_str())
        .bind(subject.kind.as_str())
        .bind(&subject.id)
        .bind(locked_at)
        .bind(lock.expires_at.map(|t| t.timestamp()))
        .bind(&lock.reason)
        .bind(meta)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create lock record");
            StorageError::Database("Failed to create lock record".to_string())
        })?;

        Ok(row.into())
    }

    async fn find_active_lock(&self, subject: &SubjectRef) -> Result<Option<LockRecord>, Error> {
        let row = sqlx::query_as::<_, SqliteLockRecord>(ACTIVE_LOCK_QUERY)
            .bind(subject.kind.as_str())
            .bind(&subject.id)
            .bind(Utc::now().timestamp())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to query active lock");
                StorageError::Database("Failed to query active lock".to_string())
            })?;

        Ok(row.map(Into::into))
    }

    async fn has_active_lock(&self, subject: &SubjectRef) -> Result<bool, Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM lock_records
                WHERE subject_kind = ? AND subject_id = ?
                  AND unlocked_at IS NULL
                  AND (expires_at IS NULL OR expires_at > ?)
            )
            "#,
        )
        .bind(subject.kind.as_str())
        .bind(&subject.id)
        .bind(Utc::now().timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to check active lock");
            StorageError::Database("Failed to check active lock".to_string())
        })?;

        Ok(exists)
    }

    async fn mark_unlocked(
        &self,
        lock: &LockId,
        update: UnlockUpdate,
    ) -> Result<LockRecord, Error> {
        let row = sqlx::query_as::<_, SqliteLockRecord>(
            r#"
            SELECT id, subject_kind, subject_id, locked_at, unlocked_at, expires_at,
                   reason, meta, created_at, updated_at
            FROM lock_records
            WHERE id = ?
            "#,
        )
        .bind(lock.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load lock record");
            StorageError::Database("Failed to load lock record".to_string())
        })?
        .ok_or(StorageError::NotFound)?;

        let mut record: LockRecord = row.into();
        record.unlocked_at = Some(Utc::now());
        update.apply_to(&mut record);
        record.updated_at = Utc::now();

        let meta = record
            .meta
            .as_ref()
            .map(|meta| serde_json::to_string(meta).unwrap_or_default());

        sqlx::query(
            r#"
            UPDATE lock_records
            SET unlocked_at = ?, reason = ?, meta = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(record.unlocked_at.map(|t| t.timestamp()))
        .bind(&record.reason)
        .bind(meta)
        .bind(record.updated_at.timestamp())
        .bind(lock.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to persist unlock");
            StorageError::Database("Failed to persist unlock".to_string())
        })?;

        Ok(record)
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, Error> {
        let cutoff = cutoff.timestamp();

        // Only resolved records are prunable: explicitly unlocked before the
        // cutoff, or expired before it. Active never-expiring locks never match.
        let result = sqlx::query(
            r#"
            DELETE FROM lock_records
            WHERE (unlocked_at IS NOT NULL AND unlocked_at < ?)
               OR (expires_at IS NOT NULL AND expires_at < ?)
            "#,
        )
        .bind(cutoff)
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to prune lock records");
            StorageError::Database("Failed to prune lock records".to_string())
        })?;

        Ok(result.rows_affected())
    }
}
