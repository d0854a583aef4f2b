//! Builder for constructing [`Bastille`] instances.
//!
//! The builder wires the engine's collaborators explicitly: storage provider,
//! attempt cache, identity resolver, capability signing, and the optional
//! notifier and session revoker. It also registers the default event
//! listeners (lock creation, lockout notification) on a fresh event bus.
//!
//! # Example
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use bastille::{Bastille, LockoutConfig};
//! # use bastille_storage_sqlite::{SqliteIdentityResolver, SqliteRepositoryProvider};
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repositories = Arc::new(SqliteRepositoryProvider::connect("sqlite::memory:").await?);
//! let resolver = Arc::new(SqliteIdentityResolver::for_users(repositories.pool().clone()));
//!
//! let bastille = Bastille::builder(repositories)
//!     .with_resolver(resolver)
//!     .with_capability_secret(b"change-me", "https://app.example.com")
//!     .with_config(LockoutConfig::default().with_max_attempts(3))
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use bastille_core::listeners::{MarkSubjectLocked, SendLockoutNotification};
use bastille_core::services::{LockoutService, NotificationService, PrunerService};
use bastille_core::{
    AttemptCache, AttemptCounter, CapabilityGateway, EventBus, IdentityResolver, LockoutConfig,
    LockoutNotifier, MemoryAttemptCache, RepositoryProvider, SessionRevoker, TracingNotifier,
};

use crate::Bastille;

/// Errors that can occur when building a Bastille instance.
#[derive(Debug, thiserror::Error)]
pub enum BastilleBuilderError {
    /// No identity resolver was provided
    #[error("An identity resolver is required; call with_resolver()")]
    MissingResolver,

    /// No capability signing secret was provided
    #[error("A capability secret and base URL are required; call with_capability_secret()")]
    MissingCapabilitySecret,
}

/// Builder collecting the engine's collaborators.
///
/// The storage provider is required up front; the resolver and the capability
/// secret are validated at [`BastilleBuilder::build`] time. The attempt cache
/// defaults to the in-process [`MemoryAttemptCache`] and the notifier to
/// [`TracingNotifier`].
pub struct BastilleBuilder<R: RepositoryProvider> {
    repositories: Arc<R>,
    cache: Option<Arc<dyn AttemptCache>>,
    resolver: Option<Arc<dyn IdentityResolver>>,
    revoker: Option<Arc<dyn SessionRevoker>>,
    notifier: Option<Arc<dyn LockoutNotifier>>,
    capability_secret: Option<Vec<u8>>,
    base_url: Option<String>,
    config: LockoutConfig,
}

impl<R: RepositoryProvider> BastilleBuilder<R> {
    pub fn new(repositories: Arc<R>) -> Self {
        Self {
            repositories,
            cache: None,
            resolver: None,
            revoker: None,
            notifier: None,
            capability_secret: None,
            base_url: None,
            config: LockoutConfig::default(),
        }
    }

    /// Use a specific attempt cache backend (defaults to in-process memory).
    pub fn with_cache(mut self, cache: Arc<dyn AttemptCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the identity resolver mapping identifiers to subjects. Required.
    pub fn with_resolver(mut self, resolver: Arc<dyn IdentityResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Set the session revoker used when `logout_on_lockout` is enabled.
    pub fn with_session_revoker(mut self, revoker: Arc<dyn SessionRevoker>) -> Self {
        self.revoker = Some(revoker);
        self
    }

    /// Set the notification target (defaults to log-only).
    pub fn with_notifier(mut self, notifier: Arc<dyn LockoutNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Set the HMAC secret and public base URL for signed capability URLs.
    /// Required.
    pub fn with_capability_secret(
        mut self,
        secret: impl AsRef<[u8]>,
        base_url: impl Into<String>,
    ) -> Self {
        self.capability_secret = Some(secret.as_ref().to_vec());
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the lockout configuration.
    pub fn with_config(mut self, config: LockoutConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the engine, registering the default event listeners.
    pub async fn build(self) -> Result<Bastille<R>, BastilleBuilderError> {
        let resolver = self.resolver.ok_or(BastilleBuilderError::MissingResolver)?;
        let secret = self
            .capability_secret
            .ok_or(BastilleBuilderError::MissingCapabilitySecret)?;
        let base_url = self
            .base_url
            .ok_or(BastilleBuilderError::MissingCapabilitySecret)?;

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(MemoryAttemptCache::new()));
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(TracingNotifier));

        let config = self.config;
        let gateway = Arc::new(CapabilityGateway::new(secret, base_url));
        let counter = Arc::new(AttemptCounter::new(
            cache,
            config.decay_minutes,
            config.max_attempts,
        ));

        let notifications = Arc::new(NotificationService::new(
            notifier,
            gateway.clone(),
            resolver.clone(),
            &config,
        ));

        let events = EventBus::new();
        events
            .register(Arc::new(MarkSubjectLocked::new(
                self.repositories.clone(),
                resolver.clone(),
                &config,
            )))
            .await;
        events
            .register(Arc::new(SendLockoutNotification::new(notifications.clone())))
            .await;

        let engine = LockoutService::new(
            self.repositories.clone(),
            counter,
            resolver.clone(),
            self.revoker,
            notifications,
            events,
            config.clone(),
        );

        let pruner = PrunerService::new(self.repositories.clone(), config.prune.clone());

        Ok(Bastille::new(
            self.repositories,
            engine,
            pruner,
            gateway,
            resolver,
            config,
        ))
    }
}
