//! Configuration for the lockout engine and its surrounding surfaces.
//!
//! All values have conservative defaults so `LockoutConfig::default()` yields
//! a working policy: five failures within a thirty minute decay window create
//! a persistent, manual-unlock-only lock and trigger an unlock notification.

use serde::{Deserialize, Serialize};

/// Configuration for the account lockout engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockoutConfig {
    /// Attribute used to resolve an identifier to a subject (e.g. "email").
    pub login_field: String,

    /// Number of failed attempts before a persistent lock is created.
    pub max_attempts: u32,

    /// TTL window (minutes) for the transient attempt counter.
    pub decay_minutes: i64,

    /// Whether a lock triggers a notification carrying a signed unlock URL.
    pub unlock_via_notification: bool,

    /// Lifetime (minutes) of the signed unlock capability URL.
    pub unlock_link_minutes: i64,

    /// Lifetime (minutes) of the signed lock capability URL sent on login.
    pub lock_link_minutes: i64,

    /// Hours until a created lock expires on its own. 0 means the lock has no
    /// expiry and must be unlocked manually.
    pub auto_unlock_hours: i64,

    /// Whether a successful login sends a "was this you?" notification with a
    /// signed lock URL.
    pub lock_on_login: bool,

    /// Whether a login by a locked-out subject revokes its sessions.
    pub logout_on_lockout: bool,

    /// Destination path for redirects after the lock/unlock HTTP actions.
    pub unlock_redirect_route: String,

    /// Retention pruning policy.
    pub prune: PruneConfig,

    /// User-facing message catalog.
    #[serde(default)]
    pub messages: Messages,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            login_field: "email".to_string(),
            max_attempts: 5,
            decay_minutes: 30,
            unlock_via_notification: true,
            unlock_link_minutes: 1440,
            lock_link_minutes: 1440,
            auto_unlock_hours: 0,
            lock_on_login: false,
            logout_on_lockout: false,
            unlock_redirect_route: "/login".to_string(),
            prune: PruneConfig::default(),
            messages: Messages::default(),
        }
    }
}

impl LockoutConfig {
    /// Set the lockout threshold.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the attempt counter decay window in minutes.
    pub fn with_decay_minutes(mut self, decay_minutes: i64) -> Self {
        self.decay_minutes = decay_minutes;
        self
    }

    /// Set the automatic lock expiry in hours (0 disables expiry).
    pub fn with_auto_unlock_hours(mut self, hours: i64) -> Self {
        self.auto_unlock_hours = hours;
        self
    }

    /// Set the attribute used to resolve identifiers to subjects.
    pub fn with_login_field(mut self, login_field: impl Into<String>) -> Self {
        self.login_field = login_field.into();
        self
    }

    /// Toggle the unlock notification sent when a lock is created.
    pub fn with_unlock_via_notification(mut self, enabled: bool) -> Self {
        self.unlock_via_notification = enabled;
        self
    }

    /// Set the retention pruning policy.
    pub fn with_prune(mut self, prune: PruneConfig) -> Self {
        self.prune = prune;
        self
    }
}

/// Retention policy for attempt logs and resolved lock records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruneConfig {
    /// When false, pruning is a no-op that reports success.
    pub enabled: bool,

    /// Days to retain attempt log entries.
    pub attempt_logs_days: i64,

    /// Days to retain resolved (unlocked or long-expired) lock records.
    pub lock_records_days: i64,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            attempt_logs_days: 90,
            lock_records_days: 365,
        }
    }
}

impl PruneConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// User-facing messages surfaced by the HTTP layer.
///
/// Host applications can replace any of these with translated strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Messages {
    /// Returned with a 429 when a locked subject is denied access.
    pub account_locked: String,

    /// Flash message after a successful unlock action.
    pub account_unlocked: String,

    /// Flash message after a successful lock action.
    pub lock_confirmed: String,

    /// Flash message when the identifier cannot be resolved to a subject.
    pub account_not_found: String,

    /// Generic flash message for unexpected failures.
    pub general_error: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            account_locked: "Your account has been locked due to too many failed login attempts."
                .to_string(),
            account_unlocked: "Your account has been unlocked. You can now log in.".to_string(),
            lock_confirmed: "Your account has been locked.".to_string(),
            account_not_found: "Account not found.".to_string(),
            general_error: "Something went wrong. Please try again later.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LockoutConfig::default();
        assert_eq!(config.login_field, "email");
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.decay_minutes, 30);
        assert!(config.unlock_via_notification);
        assert_eq!(config.unlock_link_minutes, 1440);
        assert_eq!(config.auto_unlock_hours, 0);
        assert!(!config.lock_on_login);
        assert!(config.prune.enabled);
    }

    #[test]
    fn test_builder_setters() {
        let config = LockoutConfig::default()
            .with_max_attempts(3)
            .with_decay_minutes(10)
            .with_auto_unlock_hours(3)
            .with_login_field("username")
            .with_unlock_via_notification(false)
            .with_prune(PruneConfig::disabled());

        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.decay_minutes, 10);
        assert_eq!(config.auto_unlock_hours, 3);
        assert_eq!(config.login_field, "username");
        assert!(!config.unlock_via_notification);
        assert!(!config.prune.enabled);
    }

    #[test]
    fn test_config_round_trips_through_serde() {
        let config = LockoutConfig::default().with_max_attempts(2);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: LockoutConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.max_attempts, 2);
        assert_eq!(parsed.prune.attempt_logs_days, 90);
    }
}
