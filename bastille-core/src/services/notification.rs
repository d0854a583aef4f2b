//! Notification dispatch for lockout and login events.
//!
//! Owns the policy gates and the signed-URL minting so the engine, the event
//! listener, and the HTTP layer all share one implementation. Delivery
//! failures are logged and swallowed; a broken notification channel must
//! never affect the flow that triggered it.

use std::sync::Arc;

use crate::capability::{CapabilityAction, CapabilityGateway};
use crate::config::LockoutConfig;
use crate::notify::{LockedNotification, LockoutNotifier, LoginNotification};
use crate::resolver::IdentityResolver;
use crate::validation::validate_email;

/// Sends lockout-related notifications with embedded capability URLs.
pub struct NotificationService {
    notifier: Arc<dyn LockoutNotifier>,
    gateway: Arc<CapabilityGateway>,
    resolver: Arc<dyn IdentityResolver>,
    unlock_via_notification: bool,
    decay_minutes: i64,
    unlock_link_minutes: i64,
    lock_link_minutes: i64,
}

impl NotificationService {
    pub fn new(
        notifier: Arc<dyn LockoutNotifier>,
        gateway: Arc<CapabilityGateway>,
        resolver: Arc<dyn IdentityResolver>,
        config: &LockoutConfig,
    ) -> Self {
        Self {
            notifier,
            gateway,
            resolver,
            unlock_via_notification: config.unlock_via_notification,
            decay_minutes: config.decay_minutes,
            unlock_link_minutes: config.unlock_link_minutes,
            lock_link_minutes: config.lock_link_minutes,
        }
    }

    /// Send the locked-account notification carrying a signed unlock URL.
    ///
    /// Policy-gated, not an error path: skipped silently when
    /// `unlock_via_notification` is disabled, when the identifier is not a
    /// deliverable email address, or when no subject resolves for it.
    pub async fn send_lockout_notification(&self, identifier: &str) {
        if !self.unlock_via_notification {
            return;
        }

        if validate_email(identifier).is_err() {
            return;
        }

        match self.resolver.resolve(identifier).await {
            Ok(Some(_)) => {}
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(identifier = %identifier, error = %e, "Identity resolution failed");
                return;
            }
        }

        let unlock_url =
            self.gateway
                .issue(CapabilityAction::Unlock, identifier, self.unlock_link_minutes);

        let notification = LockedNotification {
            identifier: identifier.to_string(),
            decay_minutes: self.decay_minutes,
            unlock_url,
        };

        if let Err(e) = self.notifier.account_locked(&notification).await {
            tracing::warn!(identifier = %identifier, error = %e, "Failed to send lockout notification");
        }
    }

    /// Send the new-login notification carrying a signed lock URL.
    ///
    /// The `lock_on_login` gate is the caller's responsibility; this method
    /// only mints the URL and dispatches.
    pub async fn send_login_notification(&self, identifier: &str) {
        let lock_url =
            self.gateway
                .issue(CapabilityAction::Lock, identifier, self.lock_link_minutes);

        let notification = LoginNotification {
            identifier: identifier.to_string(),
            lock_url,
        };

        if let Err(e) = self.notifier.account_logged_in(&notification).await {
            tracing::warn!(identifier = %identifier, error = %e, "Failed to send login notification");
        }
    }
}
