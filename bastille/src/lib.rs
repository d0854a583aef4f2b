//! # Bastille
//!
//! Bastille is an account-lockout and login-throttling toolkit. It tracks
//! failed authentication attempts per identifier in a decaying counter,
//! escalates repeated failures into a persistent lock record, and offers
//! unlock pathways: a signed, time-limited capability URL, a manual unlock,
//! or automatic expiry.
//!
//! The engine never becomes the reason your authentication pipeline breaks:
//! every side effect (lock persistence, notifications, event dispatch, audit
//! logging) is best-effort, and only the attempt counter itself is
//! load-bearing.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bastille::{Bastille, RequestContext};
//! use bastille_storage_sqlite::{SqliteIdentityResolver, SqliteRepositoryProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repositories = Arc::new(SqliteRepositoryProvider::connect("sqlite::memory:").await?);
//!     let resolver = Arc::new(SqliteIdentityResolver::for_users(repositories.pool().clone()));
//!
//!     let bastille = Bastille::builder(repositories)
//!         .with_resolver(resolver)
//!         .with_capability_secret(b"change-me", "https://app.example.com")
//!         .build()
//!         .await?;
//!     bastille.migrate().await?;
//!
//!     // On each failed login:
//!     let blocked = bastille
//!         .record_failure("user@example.com", &RequestContext::default())
//!         .await?;
//!     if blocked {
//!         // reject the request
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use bastille_core::services::{LockoutService, PrunerService};

pub mod builder;

pub use builder::{BastilleBuilder, BastilleBuilderError};

/// Re-export core types from bastille_core
///
/// These types are commonly used when working with the Bastille API.
pub use bastille_core::{
    AttemptCache, AttemptCounter, AttemptLogEntry, CapabilityAction, CapabilityClaims,
    CapabilityGateway, Error, Event, EventBus, EventHandler, IdentityResolver, Lockable, LockId,
    LockRecord, LockoutConfig, LockoutNotifier, MemoryAttemptCache, Messages, NewLock,
    PruneConfig, PruneReport, RepositoryProvider, RequestContext, SessionRevoker, Subject,
    SubjectKind, SubjectRef, TracingNotifier, UnlockUpdate,
};

/// Re-export storage backends
///
/// These storage implementations are available when the corresponding feature
/// is enabled.
#[cfg(feature = "sqlite")]
pub use bastille_storage_sqlite::{SqliteIdentityResolver, SqliteRepositoryProvider};

/// The main entry point: the lockout engine wired to its collaborators.
///
/// Construct one instance with [`Bastille::builder`], passing the storage
/// provider, cache, and identity resolver explicitly — there is no global
/// state. The instance is cheap to share behind an [`Arc`].
pub struct Bastille<R: RepositoryProvider> {
    repositories: Arc<R>,
    engine: LockoutService<R>,
    pruner: PrunerService<R>,
    gateway: Arc<CapabilityGateway>,
    resolver: Arc<dyn IdentityResolver>,
    config: LockoutConfig,
}

impl<R: RepositoryProvider> Bastille<R> {
    /// Start building a Bastille instance on top of a storage provider.
    pub fn builder(repositories: Arc<R>) -> BastilleBuilder<R> {
        BastilleBuilder::new(repositories)
    }

    pub(crate) fn new(
        repositories: Arc<R>,
        engine: LockoutService<R>,
        pruner: PrunerService<R>,
        gateway: Arc<CapabilityGateway>,
        resolver: Arc<dyn IdentityResolver>,
        config: LockoutConfig,
    ) -> Self {
        Self {
            repositories,
            engine,
            pruner,
            gateway,
            resolver,
            config,
        }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &LockoutConfig {
        &self.config
    }

    /// Get the capability gateway issuing signed lock/unlock URLs.
    pub fn gateway(&self) -> &CapabilityGateway {
        &self.gateway
    }

    /// Get the retention pruner.
    pub fn pruner(&self) -> &PrunerService<R> {
        &self.pruner
    }

    /// Get the event bus carrying lock/unlock events.
    pub fn events(&self) -> &EventBus {
        self.engine.events()
    }

    /// Run storage migrations.
    pub async fn migrate(&self) -> Result<(), Error> {
        self.repositories.migrate().await
    }

    /// Check that the storage backend is reachable.
    pub async fn health_check(&self) -> Result<(), Error> {
        self.repositories.health_check().await
    }

    /// Record a failed authentication attempt. Returns whether the
    /// identifier is blocked after this call.
    pub async fn record_failure(
        &self,
        identifier: &str,
        context: &RequestContext,
    ) -> Result<bool, Error> {
        self.engine.record_failure(identifier, context).await
    }

    /// Create a persistent lock for the subject. Returns `None` on failure.
    pub async fn lock<S>(&self, subject: &S, options: NewLock) -> Option<LockRecord>
    where
        S: Lockable + ?Sized,
    {
        self.engine.lock(subject, options).await
    }

    /// Release the subject's active lock. Returns the unlocked record, or
    /// `None` when no active lock exists or persistence fails.
    pub async fn unlock<S>(
        &self,
        subject: &S,
        update: UnlockUpdate,
        context: &RequestContext,
    ) -> Option<LockRecord>
    where
        S: Lockable + ?Sized,
    {
        self.engine.unlock(subject, update, context).await
    }

    /// Whether the subject is currently locked out (persistent lock or
    /// saturated attempt counter).
    pub async fn is_locked_out<S>(&self, subject: &S) -> bool
    where
        S: Lockable + ?Sized,
    {
        self.engine.is_locked_out(subject).await
    }

    /// Whether the identifier is currently locked out. Used by request-time
    /// guards; internal errors mean "not locked".
    pub async fn is_identifier_locked_out(&self, identifier: &str) -> bool {
        self.engine.is_identifier_locked_out(identifier).await
    }

    /// Current failed-attempt count for an identifier.
    pub async fn attempts(&self, identifier: &str) -> Result<u64, Error> {
        self.engine.attempts(identifier).await
    }

    /// Whether the identifier has reached the lockout threshold.
    pub async fn has_too_many_attempts(&self, identifier: &str) -> Result<bool, Error> {
        self.engine.has_too_many_attempts(identifier).await
    }

    /// Clear the attempt counter for an identifier. Best-effort.
    pub async fn clear_attempts(&self, identifier: &str) {
        self.engine.clear_attempts(identifier).await
    }

    /// Send the locked-account notification (with signed unlock URL) for an
    /// identifier. Policy-gated and best-effort.
    pub async fn send_lockout_notification(&self, identifier: &str) {
        self.engine.send_lockout_notification(identifier).await
    }

    /// React to a successful login (session revocation for locked-out
    /// subjects, optional login notification).
    pub async fn handle_login<S>(&self, subject: &S, context: &RequestContext)
    where
        S: Lockable + ?Sized,
    {
        self.engine.handle_login(subject, context).await
    }

    /// Resolve the subject for an identifier.
    pub async fn resolve(&self, identifier: &str) -> Result<Option<Subject>, Error> {
        self.resolver.resolve(identifier).await
    }

    /// Issue a signed unlock URL for an identifier, valid for the configured
    /// `unlock_link_minutes`.
    pub fn unlock_url(&self, identifier: &str) -> String {
        self.gateway.issue(
            CapabilityAction::Unlock,
            identifier,
            self.config.unlock_link_minutes,
        )
    }

    /// Issue a signed lock URL for an identifier, valid for the configured
    /// `lock_link_minutes`.
    pub fn lock_url(&self, identifier: &str) -> String {
        self.gateway.issue(
            CapabilityAction::Lock,
            identifier,
            self.config.lock_link_minutes,
        )
    }
}
