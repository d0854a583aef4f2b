//! Repository traits for the data access layer.
//!
//! Individual `*Repository` traits define the operations per data domain,
//! `*RepositoryProvider` traits expose each repository, and
//! [`RepositoryProvider`] is a supertrait combining the providers with
//! lifecycle methods. Storage backends implement the full stack; services
//! only ever see the traits.

pub mod attempt_log;
pub mod lock;

pub use attempt_log::AttemptLogRepository;
pub use lock::LockRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for lock record repository access.
pub trait LockRepositoryProvider: Send + Sync + 'static {
    /// The lock repository implementation type
    type LockRepo: LockRepository;

    /// Get the lock repository
    fn locks(&self) -> &Self::LockRepo;
}

/// Provider trait for attempt log repository access.
pub trait AttemptLogRepositoryProvider: Send + Sync + 'static {
    /// The attempt log repository implementation type
    type AttemptLogRepo: AttemptLogRepository;

    /// Get the attempt log repository
    fn attempt_logs(&self) -> &Self::AttemptLogRepo;
}

/// Provider trait that storage implementations must implement to provide all
/// repositories, plus migrations and health checks.
#[async_trait]
pub trait RepositoryProvider: LockRepositoryProvider + AttemptLogRepositoryProvider {
    /// Run migrations for all repositories
    async fn migrate(&self) -> Result<(), Error>;

    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}
