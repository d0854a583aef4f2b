//! Repository trait for the append-only attempt log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Error;
use crate::lock::{AttemptLogEntry, RequestContext};
use crate::subject::SubjectRef;

/// Storage operations for failed-attempt audit entries.
///
/// The log is supplementary audit data, never the decision source: one row
/// per recorded failure, including failures that do not cross the threshold.
/// Rows are removed only by retention pruning.
#[async_trait]
pub trait AttemptLogRepository: Send + Sync + 'static {
    /// Append one attempt for the identifier.
    ///
    /// Attempts are recorded for all identifiers, including ones that do not
    /// resolve to a subject, so the audit trail cannot be used for account
    /// enumeration.
    async fn append(
        &self,
        identifier: &str,
        subject: Option<&SubjectRef>,
        context: &RequestContext,
    ) -> Result<AttemptLogEntry, Error>;

    /// Number of attempts recorded for the identifier since the timestamp.
    async fn count_since(&self, identifier: &str, since: DateTime<Utc>) -> Result<u64, Error>;

    /// Delete entries with `attempted_at` before the cutoff, returning the
    /// number deleted.
    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, Error>;
}
