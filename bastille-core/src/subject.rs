//! Subject references and the `Lockable` capability interface.
//!
//! A lock record can be attached to any entity kind. Instead of an untyped
//! "any model" reference, subjects are addressed by a `(kind, id)` pair, and
//! entity types opt into lockout handling by implementing [`Lockable`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of entity a lock can be attached to (e.g. `"user"`, `"admin"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectKind(String);

impl SubjectKind {
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SubjectKind {
    fn from(kind: &str) -> Self {
        Self::new(kind)
    }
}

/// Typed reference to the entity a lock record belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectRef {
    pub kind: SubjectKind,
    pub id: String,
}

impl SubjectRef {
    pub fn new(kind: impl Into<SubjectKind>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Capability interface for entities that participate in lockout handling.
///
/// Implementing this trait is the contract: the engine never probes for
/// optional behavior at runtime. `identifier` returns the value of the
/// configured login field when the implementor knows it; the engine falls
/// back to the identity resolver otherwise.
pub trait Lockable: Send + Sync {
    /// Stable reference used to attach lock records to this entity.
    fn subject_ref(&self) -> SubjectRef;

    /// Value of the configured login field, when known.
    fn identifier(&self) -> Option<&str>;
}

/// A resolved subject: the minimal [`Lockable`] produced by identity
/// resolution, carrying the identifier it was resolved from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub reference: SubjectRef,
    pub identifier: Option<String>,
}

impl Subject {
    pub fn new(reference: SubjectRef) -> Self {
        Self {
            reference,
            identifier: None,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

impl Lockable for Subject {
    fn subject_ref(&self) -> SubjectRef {
        self.reference.clone()
    }

    fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }
}
