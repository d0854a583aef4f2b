//! The lockout engine.
//!
//! Coordinates the transient attempt counter and the persistent lock store:
//! failures increment the counter, crossing the threshold emits
//! [`Event::EntityLocked`] exactly once, and unlocking releases the lock,
//! clears the counter, and emits [`Event::EntityUnlocked`].
//!
//! # Failure semantics
//!
//! The engine owns no state; it must never become the reason a host
//! application's authentication pipeline breaks. Every side-effect path
//! (lock creation, unlock persistence, attempt-log writes, counter clearing,
//! event dispatch, notification) is wrapped so its failure degrades the flow
//! instead of aborting it. Only the counter read/increment surfaces errors:
//! without the counter no lockout decision is possible.

use std::sync::Arc;

use crate::Error;
use crate::config::LockoutConfig;
use crate::counter::AttemptCounter;
use crate::events::{Event, EventBus};
use crate::lock::{LockRecord, NewLock, RequestContext, UnlockUpdate};
use crate::repositories::{
    AttemptLogRepository, AttemptLogRepositoryProvider, LockRepository, LockRepositoryProvider,
    RepositoryProvider,
};
use crate::resolver::{IdentityResolver, SessionRevoker};
use crate::services::NotificationService;
use crate::subject::Lockable;

/// Engine coordinating attempt counting, lock records, and side effects.
///
/// Constructed once with its collaborators and shared; it is thread-safe and
/// holds no mutable state of its own.
pub struct LockoutService<R: RepositoryProvider> {
    repositories: Arc<R>,
    counter: Arc<AttemptCounter>,
    resolver: Arc<dyn IdentityResolver>,
    revoker: Option<Arc<dyn SessionRevoker>>,
    notifications: Arc<NotificationService>,
    events: EventBus,
    config: LockoutConfig,
}

impl<R: RepositoryProvider> LockoutService<R> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repositories: Arc<R>,
        counter: Arc<AttemptCounter>,
        resolver: Arc<dyn IdentityResolver>,
        revoker: Option<Arc<dyn SessionRevoker>>,
        notifications: Arc<NotificationService>,
        events: EventBus,
        config: LockoutConfig,
    ) -> Self {
        Self {
            repositories,
            counter,
            resolver,
            revoker,
            notifications,
            events,
            config,
        }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &LockoutConfig {
        &self.config
    }

    /// Get the event bus used for lock/unlock events.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Record a failed authentication attempt for an identifier.
    ///
    /// Returns whether the identifier is blocked after this call. An
    /// already-blocked identifier short-circuits: no increment, no log entry,
    /// no repeated event, so side effects fire exactly once per crossing.
    ///
    /// # Errors
    ///
    /// Only counter reads/increments propagate. The attempt-log write and
    /// event dispatch are best-effort.
    pub async fn record_failure(
        &self,
        identifier: &str,
        context: &RequestContext,
    ) -> Result<bool, Error> {
        if self.counter.has_too_many_attempts(identifier).await? {
            return Ok(true);
        }

        self.counter.record(identifier).await?;

        if let Err(e) = self
            .repositories
            .attempt_logs()
            .append(identifier, None, context)
            .await
        {
            tracing::warn!(identifier = %identifier, error = %e, "Failed to append attempt log");
        }

        let blocked = self.counter.has_too_many_attempts(identifier).await?;

        if blocked {
            // The early return above guarantees this is the crossing call.
            self.events
                .emit(&Event::EntityLocked {
                    identifier: identifier.to_string(),
                    context: context.clone(),
                })
                .await;
        }

        Ok(blocked)
    }

    /// Create a persistent lock for the subject.
    ///
    /// Returns `None` when persistence fails; the failure is logged and never
    /// propagated.
    pub async fn lock<S>(&self, subject: &S, options: NewLock) -> Option<LockRecord>
    where
        S: Lockable + ?Sized,
    {
        let subject_ref = subject.subject_ref();
        match self
            .repositories
            .locks()
            .create_lock(&subject_ref, options)
            .await
        {
            Ok(lock) => Some(lock),
            Err(e) => {
                tracing::warn!(subject = %subject_ref, error = %e, "Failed to create lock record");
                None
            }
        }
    }

    /// Release the subject's active lock.
    ///
    /// Finds the most recent active lock, marks it unlocked (merging the
    /// optional reason/meta/actor), clears the attempt counter for the
    /// subject's identifier, and emits [`Event::EntityUnlocked`]. Returns the
    /// updated record, or `None` when there is no active lock or persistence
    /// fails. Idempotent: a second call finds no active lock and returns
    /// `None` without error.
    pub async fn unlock<S>(
        &self,
        subject: &S,
        update: UnlockUpdate,
        context: &RequestContext,
    ) -> Option<LockRecord>
    where
        S: Lockable + ?Sized,
    {
        let subject_ref = subject.subject_ref();

        let lock = match self.repositories.locks().find_active_lock(&subject_ref).await {
            Ok(Some(lock)) => lock,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(subject = %subject_ref, error = %e, "Failed to look up active lock");
                return None;
            }
        };

        let unlocked = match self.repositories.locks().mark_unlocked(&lock.id, update).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(lock = %lock.id, error = %e, "Failed to persist unlock");
                return None;
            }
        };

        let identifier = self.identifier_of(subject).await;
        if let Some(identifier) = &identifier {
            self.counter.clear(identifier).await;
        }

        self.events
            .emit(&Event::EntityUnlocked {
                subject: subject_ref,
                lock: unlocked.clone(),
                identifier,
                context: context.clone(),
            })
            .await;

        Some(unlocked)
    }

    /// Whether the subject is currently locked out.
    ///
    /// The persistent lock store takes priority; the attempt counter blocks
    /// as a fallback. Internal errors are treated as "not locked" — this
    /// check is a defense-in-depth gate, not the sole authority.
    pub async fn is_locked_out<S>(&self, subject: &S) -> bool
    where
        S: Lockable + ?Sized,
    {
        let subject_ref = subject.subject_ref();

        match self.repositories.locks().has_active_lock(&subject_ref).await {
            Ok(true) => return true,
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(subject = %subject_ref, error = %e, "Active lock check failed");
            }
        }

        match self.identifier_of(subject).await {
            Some(identifier) => self
                .counter
                .has_too_many_attempts(&identifier)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(identifier = %identifier, error = %e, "Attempt counter check failed");
                    false
                }),
            None => false,
        }
    }

    /// Whether the identifier maps to a locked-out subject or a saturated
    /// counter. Used by request-time guards; internal errors mean "not
    /// locked".
    pub async fn is_identifier_locked_out(&self, identifier: &str) -> bool {
        match self.resolver.resolve(identifier).await {
            Ok(Some(subject)) => {
                match self
                    .repositories
                    .locks()
                    .has_active_lock(&subject.subject_ref())
                    .await
                {
                    Ok(true) => return true,
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!(identifier = %identifier, error = %e, "Active lock check failed");
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(identifier = %identifier, error = %e, "Identity resolution failed");
            }
        }

        self.counter
            .has_too_many_attempts(identifier)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(identifier = %identifier, error = %e, "Attempt counter check failed");
                false
            })
    }

    /// Current failed-attempt count for an identifier.
    pub async fn attempts(&self, identifier: &str) -> Result<u64, Error> {
        Ok(self.counter.attempts(identifier).await?)
    }

    /// Whether the identifier has reached the lockout threshold.
    pub async fn has_too_many_attempts(&self, identifier: &str) -> Result<bool, Error> {
        Ok(self.counter.has_too_many_attempts(identifier).await?)
    }

    /// Clear the attempt counter for an identifier. Best-effort.
    pub async fn clear_attempts(&self, identifier: &str) {
        self.counter.clear(identifier).await;
    }

    /// Send the locked-account notification for an identifier. Policy gates
    /// and failure handling live in [`NotificationService`].
    pub async fn send_lockout_notification(&self, identifier: &str) {
        self.notifications.send_lockout_notification(identifier).await;
    }

    /// React to a successful login by the subject.
    ///
    /// When `logout_on_lockout` is enabled and the subject is locked out, its
    /// sessions are revoked. When `lock_on_login` is enabled, a login
    /// notification carrying a signed lock URL is sent so the account owner
    /// can lock the account if the login was not theirs. Both reactions are
    /// best-effort.
    pub async fn handle_login<S>(&self, subject: &S, _context: &RequestContext)
    where
        S: Lockable + ?Sized,
    {
        self.revoke_sessions_if_locked(subject).await;
        self.send_login_notification(subject).await;
    }

    async fn revoke_sessions_if_locked<S>(&self, subject: &S)
    where
        S: Lockable + ?Sized,
    {
        if !self.config.logout_on_lockout {
            return;
        }

        let Some(revoker) = &self.revoker else {
            return;
        };

        if !self.is_locked_out(subject).await {
            return;
        }

        let subject_ref = subject.subject_ref();
        match revoker.revoke_sessions(&subject_ref).await {
            Ok(count) => {
                tracing::info!(subject = %subject_ref, count = count, "Revoked sessions for locked-out subject");
            }
            Err(e) => {
                tracing::warn!(subject = %subject_ref, error = %e, "Failed to revoke sessions");
            }
        }
    }

    async fn send_login_notification<S>(&self, subject: &S)
    where
        S: Lockable + ?Sized,
    {
        if !self.config.lock_on_login {
            return;
        }

        let Some(identifier) = self.identifier_of(subject).await else {
            return;
        };

        self.notifications.send_login_notification(&identifier).await;
    }

    /// The subject's login-field value: taken from the subject when it knows
    /// it, resolved through the identity resolver otherwise. Best-effort.
    async fn identifier_of<S>(&self, subject: &S) -> Option<String>
    where
        S: Lockable + ?Sized,
    {
        if let Some(identifier) = subject.identifier() {
            return Some(identifier.to_string());
        }

        let subject_ref = subject.subject_ref();
        match self.resolver.identifier_for(&subject_ref).await {
            Ok(identifier) => identifier,
            Err(e) => {
                tracing::warn!(subject = %subject_ref, error = %e, "Failed to resolve identifier");
                None
            }
        }
    }
}
