//! Lock records and the append-only attempt log.
//!
//! A [`LockRecord`] is one row per lock lifecycle: created when a subject is
//! locked, mutated once to set `unlocked_at`, and otherwise immutable.
//! History is preserved; rows are only removed by retention pruning.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use rand::{TryRngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::subject::SubjectRef;

/// Identifier of a lock record, in the form `lck_<random>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockId(String);

impl LockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random lock ID with 96 bits of entropy.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 12];
        OsRng
            .try_fill_bytes(&mut bytes)
            .expect("OS RNG failure - system entropy source unavailable");
        Self(format!("lck_{}", BASE64_URL_SAFE_NO_PAD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persistent lock applied to a subject.
///
/// A record is *active* when `unlocked_at` is null and `expires_at` is either
/// null or in the future. Expiry never back-fills `unlocked_at`: an expired
/// record stays `unlocked_at = NULL` in storage and is simply no longer
/// active. Status checks must always go through [`LockRecord::is_active`]
/// (or the equivalent storage predicate), never `unlocked_at` alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockRecord {
    pub id: LockId,
    pub subject: SubjectRef,
    pub locked_at: DateTime<Utc>,
    pub unlocked_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub meta: Option<Map<String, Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LockRecord {
    /// Whether this lock is currently in force.
    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }

    /// Active predicate evaluated against an explicit clock.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        if self.unlocked_at.is_some() {
            return false;
        }

        match self.expires_at {
            None => true,
            Some(expires_at) => expires_at > now,
        }
    }
}

/// Attributes for a new lock record.
#[derive(Debug, Clone, Default)]
pub struct NewLock {
    /// Defaults to the storage clock when unset.
    pub locked_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub meta: Option<Map<String, Value>>,
}

impl NewLock {
    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Optional attributes merged into a lock record when it is unlocked.
///
/// `meta` entries are merged over the record's existing map; `actor` is
/// recorded under the `actor` meta key.
#[derive(Debug, Clone, Default)]
pub struct UnlockUpdate {
    pub reason: Option<String>,
    pub meta: Option<Map<String, Value>>,
    pub actor: Option<String>,
}

impl UnlockUpdate {
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Apply this update to a record, merging meta over existing entries.
    pub fn apply_to(&self, record: &mut LockRecord) {
        if let Some(reason) = &self.reason {
            record.reason = Some(reason.clone());
        }

        if self.meta.is_some() || self.actor.is_some() {
            let mut merged = record.meta.take().unwrap_or_default();
            if let Some(meta) = &self.meta {
                for (key, value) in meta {
                    merged.insert(key.clone(), value.clone());
                }
            }
            if let Some(actor) = &self.actor {
                merged.insert("actor".to_string(), Value::String(actor.clone()));
            }
            record.meta = Some(merged);
        }
    }
}

/// One failed authentication attempt, recorded for auditing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptLogEntry {
    pub id: i64,
    pub identifier: String,
    pub subject: Option<SubjectRef>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

/// Request metadata carried through failure recording and events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn new(ip_address: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            ip_address,
            user_agent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(
        unlocked_at: Option<DateTime<Utc>>,
        expires_at: Option<DateTime<Utc>>,
    ) -> LockRecord {
        let now = Utc::now();
        LockRecord {
            id: LockId::generate(),
            subject: SubjectRef::new("user", "1"),
            locked_at: now,
            unlocked_at,
            expires_at,
            reason: None,
            meta: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_lock_id_format() {
        let id = LockId::generate();
        assert!(id.as_str().starts_with("lck_"));
        assert_ne!(id, LockId::generate());
    }

    #[test]
    fn test_active_without_expiry() {
        assert!(record(None, None).is_active());
    }

    #[test]
    fn test_active_with_future_expiry() {
        let expires = Utc::now() + Duration::hours(1);
        assert!(record(None, Some(expires)).is_active());
    }

    #[test]
    fn test_inactive_with_past_expiry() {
        let expires = Utc::now() - Duration::hours(1);
        let lock = record(None, Some(expires));
        assert!(!lock.is_active());
        // Expiry does not back-fill unlocked_at
        assert!(lock.unlocked_at.is_none());
    }

    #[test]
    fn test_inactive_once_unlocked_regardless_of_expiry() {
        let unlocked = Some(Utc::now());
        assert!(!record(unlocked, None).is_active());
        assert!(!record(unlocked, Some(Utc::now() + Duration::hours(1))).is_active());
    }

    #[test]
    fn test_unlock_update_merges_meta_and_actor() {
        let mut lock = record(None, None);
        let mut existing = Map::new();
        existing.insert("source".to_string(), Value::String("engine".to_string()));
        lock.meta = Some(existing);

        let mut extra = Map::new();
        extra.insert("ticket".to_string(), Value::String("OPS-17".to_string()));

        UnlockUpdate::default()
            .with_reason("support request")
            .with_meta(extra)
            .with_actor("admin@example.com")
            .apply_to(&mut lock);

        assert_eq!(lock.reason.as_deref(), Some("support request"));
        let meta = lock.meta.unwrap();
        assert_eq!(meta["source"], Value::String("engine".to_string()));
        assert_eq!(meta["ticket"], Value::String("OPS-17".to_string()));
        assert_eq!(meta["actor"], Value::String("admin@example.com".to_string()));
    }

    #[test]
    fn test_unlock_update_without_fields_is_noop() {
        let mut lock = record(None, None);
        UnlockUpdate::default().apply_to(&mut lock);
        assert!(lock.reason.is_none());
        assert!(lock.meta.is_none());
    }
}
