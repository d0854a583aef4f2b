//! Notification boundary.
//!
//! Delivery and rendering are the host application's concern; the engine only
//! hands a payload to a [`LockoutNotifier`]. Implement the trait to route
//! notifications through mail, chat, or any other channel.

use async_trait::async_trait;

use crate::error::NotifyError;

/// Payload for the "your account was locked" notification.
///
/// Carries the signed unlock URL so the recipient can release the lock
/// without authenticating first.
#[derive(Debug, Clone)]
pub struct LockedNotification {
    pub identifier: String,
    /// Length of the throttle window, for display in the message.
    pub decay_minutes: i64,
    pub unlock_url: String,
}

/// Payload for the "new login to your account" notification.
///
/// Carries a signed lock URL so the recipient can lock the account if the
/// login was not theirs.
#[derive(Debug, Clone)]
pub struct LoginNotification {
    pub identifier: String,
    pub lock_url: String,
}

/// Pluggable notification target.
#[async_trait]
pub trait LockoutNotifier: Send + Sync + 'static {
    async fn account_locked(&self, notification: &LockedNotification) -> Result<(), NotifyError>;

    async fn account_logged_in(&self, notification: &LoginNotification)
    -> Result<(), NotifyError>;
}

/// Default notifier that records notifications in the log stream.
///
/// Useful in development and as a safe default when no delivery channel is
/// configured.
#[derive(Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl LockoutNotifier for TracingNotifier {
    async fn account_locked(&self, notification: &LockedNotification) -> Result<(), NotifyError> {
        tracing::info!(
            identifier = %notification.identifier,
            decay_minutes = notification.decay_minutes,
            "Account locked notification"
        );
        Ok(())
    }

    async fn account_logged_in(
        &self,
        notification: &LoginNotification,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            identifier = %notification.identifier,
            "Account login notification"
        );
        Ok(())
    }
}
