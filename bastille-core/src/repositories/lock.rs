//! Repository trait for persistent lock records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Error;
use crate::lock::{LockId, LockRecord, NewLock, UnlockUpdate};
use crate::subject::SubjectRef;

/// Storage operations for lock records.
///
/// Records are history: they are inserted on lock, mutated once on unlock,
/// and removed only by retention pruning. "Active" always means the
/// predicate `unlocked_at IS NULL AND (expires_at IS NULL OR expires_at >
/// now)` — implementations must never infer lock status from `unlocked_at`
/// alone, because expired records keep a null `unlocked_at`.
///
/// # Concurrency
///
/// Creation is not serialized against concurrent creators. Two racing
/// lock-creation flows can briefly yield two active records for one subject;
/// both mean "locked", and [`LockRepository::find_active_lock`]'s
/// most-recent-first ordering makes unlock converge. This window is accepted
/// rather than closed with storage-level locking.
#[async_trait]
pub trait LockRepository: Send + Sync + 'static {
    /// Insert a new lock record for the subject.
    ///
    /// `locked_at` defaults to the current time when unset.
    async fn create_lock(&self, subject: &SubjectRef, lock: NewLock) -> Result<LockRecord, Error>;

    /// The most recent active lock for the subject, by `locked_at`
    /// descending, or `None`.
    async fn find_active_lock(&self, subject: &SubjectRef) -> Result<Option<LockRecord>, Error>;

    /// Existence-only variant of [`LockRepository::find_active_lock`].
    async fn has_active_lock(&self, subject: &SubjectRef) -> Result<bool, Error>;

    /// Set `unlocked_at = now` on the record and merge the update's
    /// reason/meta/actor, returning the updated record.
    ///
    /// Safe to call on an already-unlocked record; the row is simply saved
    /// again.
    async fn mark_unlocked(&self, lock: &LockId, update: UnlockUpdate) -> Result<LockRecord, Error>;

    /// Delete resolved records older than the cutoff: explicitly unlocked
    /// before it, or expired before it. An active, never-expiring lock is
    /// never deleted.
    ///
    /// Returns the number of records deleted.
    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, Error>;
}
