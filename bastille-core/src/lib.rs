//! Core functionality for the bastille account lockout ecosystem.
//!
//! This crate contains the lockout engine and everything it coordinates: the
//! transient [`counter::AttemptCounter`] backed by a TTL cache, the
//! persistent lock-record and attempt-log repository traits, the domain
//! [`events::EventBus`] with its lock/notification listeners, the
//! [`capability::CapabilityGateway`] for signed lock/unlock URLs, and the
//! retention [`services::PrunerService`].
//!
//! Storage backends implement the traits in [`repositories`]; the main
//! `bastille` crate wires everything together for application code.

pub mod cache;
pub mod capability;
pub mod config;
pub mod counter;
pub mod error;
pub mod events;
pub mod listeners;
pub mod lock;
pub mod notify;
pub mod repositories;
pub mod resolver;
pub mod services;
pub mod subject;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::{AttemptCache, MemoryAttemptCache};
pub use capability::{CapabilityAction, CapabilityClaims, CapabilityGateway};
pub use config::{LockoutConfig, Messages, PruneConfig};
pub use counter::AttemptCounter;
pub use error::Error;
pub use events::{Event, EventBus, EventHandler};
pub use lock::{AttemptLogEntry, LockId, LockRecord, NewLock, RequestContext, UnlockUpdate};
pub use notify::{LockedNotification, LockoutNotifier, LoginNotification, TracingNotifier};
pub use repositories::RepositoryProvider;
pub use resolver::{IdentityResolver, SessionRevoker};
pub use services::{LockoutService, NotificationService, PruneReport, PrunerService};
pub use subject::{Lockable, Subject, SubjectKind, SubjectRef};
