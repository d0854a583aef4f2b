//! Identity resolution and session revocation boundaries.

use async_trait::async_trait;

use crate::Error;
use crate::subject::{Subject, SubjectRef};

/// Maps identifiers to subjects and back.
///
/// The resolution strategy is fixed: one resolver, one configured login
/// field. The resolver looks subjects up by the login-field value and can
/// reverse the lookup so the engine can clear the attempt counter for a
/// subject it only knows by reference.
#[async_trait]
pub trait IdentityResolver: Send + Sync + 'static {
    /// Resolve the subject whose login field equals `identifier`.
    async fn resolve(&self, identifier: &str) -> Result<Option<Subject>, Error>;

    /// Resolve the login-field value for a known subject.
    async fn identifier_for(&self, subject: &SubjectRef) -> Result<Option<String>, Error>;
}

/// Terminates live sessions for a subject.
///
/// Called when a locked-out subject logs in and `logout_on_lockout` is
/// enabled. Session storage is the host application's concern; this trait is
/// the seam.
#[async_trait]
pub trait SessionRevoker: Send + Sync + 'static {
    /// Revoke all sessions for the subject, returning how many were ended.
    async fn revoke_sessions(&self, subject: &SubjectRef) -> Result<u64, Error>;
}
