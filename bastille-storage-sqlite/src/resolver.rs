//! SQL-backed identity resolver.

use async_trait::async_trait;
use bastille_core::{
    Error, IdentityResolver, Subject, SubjectKind, SubjectRef, error::StorageError,
};
use sqlx::SqlitePool;

/// Resolves identifiers against a host-application table.
///
/// The lookup is `SELECT <id_column> FROM <table> WHERE <login_column> = ?`,
/// with the reverse query for [`IdentityResolver::identifier_for`]. Table and
/// column names are operator-supplied configuration (they are interpolated
/// into the SQL, not bound), mirroring how the login field is configured —
/// never pass request data into them.
pub struct SqliteIdentityResolver {
    pool: SqlitePool,
    kind: SubjectKind,
    table: String,
    id_column: String,
    login_column: String,
}

impl SqliteIdentityResolver {
    pub fn new(
        pool: SqlitePool,
        kind: impl Into<SubjectKind>,
        table: impl Into<String>,
        id_column: impl Into<String>,
        login_column: impl Into<String>,
    ) -> Self {
        Self {
            pool,
            kind: kind.into(),
            table: table.into(),
            id_column: id_column.into(),
            login_column: login_column.into(),
        }
    }

    /// Conventional resolver for a `users(id, email, ...)` table.
    pub fn for_users(pool: SqlitePool) -> Self {
        Self::new(pool, "user", "users", "id", "email")
    }
}

#[async_trait]
impl IdentityResolver for SqliteIdentityResolver {
    async fn resolve(&self, identifier: &str) -> Result<Option<Subject>, Error> {
        let id: Option<String> = sqlx::query_scalar(
            format!(
                "SELECT {} FROM {} WHERE {} = ? LIMIT 1",
                self.id_column, self.table, self.login_column
            )
            .as_str(),
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to resolve identifier");
            StorageError::Database("Failed to resolve identifier".to_string())
        })?;

        Ok(id.map(|id| {
            Subject::new(SubjectRef {
                kind: self.kind.clone(),
                id,
            })
            .with_identifier(identifier)
        }))
    }

    async fn identifier_for(&self, subject: &SubjectRef) -> Result<Option<String>, Error> {
        if subject.kind != self.kind {
            return Ok(None);
        }

        let identifier: Option<String> = sqlx::query_scalar(
            format!(
                "SELECT {} FROM {} WHERE {} = ? LIMIT 1",
                self.login_column, self.table, self.id_column
            )
            .as_str(),
        )
        .bind(&subject.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to resolve subject identifier");
            StorageError::Database("Failed to resolve subject identifier".to_string())
        })?;

        Ok(identifier)
    }
}
