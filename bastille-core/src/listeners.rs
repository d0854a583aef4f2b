//! Reactions to lockout events.
//!
//! Each listener is a single-responsibility [`EventHandler`] wrapped in its
//! own failure boundary: nothing here may surface an error into the flow
//! that emitted the event. Listeners are registered on the event bus in
//! order; [`MarkSubjectLocked`] should run before
//! [`SendLockoutNotification`] so the persistent lock exists by the time the
//! unlock link goes out.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::config::LockoutConfig;
use crate::error::EventError;
use crate::events::{Event, EventHandler};
use crate::lock::NewLock;
use crate::repositories::{LockRepository, LockRepositoryProvider, RepositoryProvider};
use crate::resolver::IdentityResolver;
use crate::services::NotificationService;
use crate::subject::Lockable;

/// Creates the persistent lock record when the threshold is crossed.
///
/// Idempotent: a subject that already has an active lock is left alone, so a
/// burst of crossings (or a replayed event) cannot stack locks. The
/// check-then-create pair is not serialized; a concurrent duplicate is
/// accepted and converges through most-recent-wins unlock resolution.
pub struct MarkSubjectLocked<R: RepositoryProvider> {
    repositories: Arc<R>,
    resolver: Arc<dyn IdentityResolver>,
    auto_unlock_hours: i64,
}

impl<R: RepositoryProvider> MarkSubjectLocked<R> {
    pub fn new(
        repositories: Arc<R>,
        resolver: Arc<dyn IdentityResolver>,
        config: &LockoutConfig,
    ) -> Self {
        Self {
            repositories,
            resolver,
            auto_unlock_hours: config.auto_unlock_hours,
        }
    }
}

#[async_trait]
impl<R: RepositoryProvider> EventHandler for MarkSubjectLocked<R> {
    async fn handle_event(&self, event: &Event) -> Result<(), EventError> {
        let Event::EntityLocked { identifier, .. } = event else {
            return Ok(());
        };

        let subject = match self.resolver.resolve(identifier).await {
            Ok(Some(subject)) => subject,
            Ok(None) => return Ok(()),
            Err(e) => {
                tracing::warn!(identifier = %identifier, error = %e, "Identity resolution failed");
                return Ok(());
            }
        };

        let subject_ref = subject.subject_ref();

        match self.repositories.locks().has_active_lock(&subject_ref).await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(subject = %subject_ref, error = %e, "Active lock check failed");
                return Ok(());
            }
        }

        let mut lock = NewLock::default();
        if self.auto_unlock_hours > 0 {
            lock = lock.with_expires_at(Utc::now() + Duration::hours(self.auto_unlock_hours));
        }

        if let Err(e) = self
            .repositories
            .locks()
            .create_lock(&subject_ref, lock)
            .await
        {
            tracing::warn!(subject = %subject_ref, error = %e, "Failed to create lock record");
        }

        Ok(())
    }
}

/// Sends the locked-account notification with a signed unlock URL.
///
/// Delegates to [`NotificationService`], which owns the policy gates
/// (notification toggle, email format, subject resolution) and swallows
/// delivery failures.
pub struct SendLockoutNotification {
    notifications: Arc<NotificationService>,
}

impl SendLockoutNotification {
    pub fn new(notifications: Arc<NotificationService>) -> Self {
        Self { notifications }
    }
}

#[async_trait]
impl EventHandler for SendLockoutNotification {
    async fn handle_event(&self, event: &Event) -> Result<(), EventError> {
        if let Event::EntityLocked { identifier, .. } = event {
            self.notifications.send_lockout_notification(identifier).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::RequestContext;
    use crate::subject::SubjectRef;
    use crate::test_support::{MockProvider, MockResolver};

    fn locked_event(identifier: &str) -> Event {
        Event::EntityLocked {
            identifier: identifier.to_string(),
            context: RequestContext::default(),
        }
    }

    fn resolver() -> Arc<MockResolver> {
        Arc::new(MockResolver::with_subject(
            "test@example.com",
            SubjectRef::new("user", "1"),
        ))
    }

    #[tokio::test]
    async fn test_mark_subject_locked_creates_lock() {
        let provider = Arc::new(MockProvider::new());
        let listener =
            MarkSubjectLocked::new(provider.clone(), resolver(), &LockoutConfig::default());

        listener
            .handle_event(&locked_event("test@example.com"))
            .await
            .unwrap();

        assert_eq!(provider.lock_record_count(), 1);
        let lock = provider
            .locks()
            .find_active_lock(&SubjectRef::new("user", "1"))
            .await
            .unwrap()
            .unwrap();
        // auto_unlock_hours = 0: manual unlock only
        assert!(lock.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_mark_subject_locked_sets_expiry_when_configured() {
        let provider = Arc::new(MockProvider::new());
        let config = LockoutConfig::default().with_auto_unlock_hours(3);
        let listener = MarkSubjectLocked::new(provider.clone(), resolver(), &config);

        listener
            .handle_event(&locked_event("test@example.com"))
            .await
            .unwrap();

        let lock = provider
            .locks()
            .find_active_lock(&SubjectRef::new("user", "1"))
            .await
            .unwrap()
            .unwrap();
        let expires_at = lock.expires_at.unwrap();
        let expected = Utc::now() + Duration::hours(3);
        assert!((expires_at - expected).num_seconds().abs() < 5);
    }

    #[tokio::test]
    async fn test_mark_subject_locked_skips_existing_active_lock() {
        let provider = Arc::new(MockProvider::new());
        let listener =
            MarkSubjectLocked::new(provider.clone(), resolver(), &LockoutConfig::default());

        let event = locked_event("test@example.com");
        listener.handle_event(&event).await.unwrap();
        listener.handle_event(&event).await.unwrap();

        assert_eq!(provider.lock_record_count(), 1);
    }

    #[tokio::test]
    async fn test_mark_subject_locked_unresolved_identifier_is_noop() {
        let provider = Arc::new(MockProvider::new());
        let listener =
            MarkSubjectLocked::new(provider.clone(), resolver(), &LockoutConfig::default());

        listener
            .handle_event(&locked_event("nobody@example.com"))
            .await
            .unwrap();

        assert_eq!(provider.lock_record_count(), 0);
    }
}
