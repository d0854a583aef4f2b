//! Service layer for lockout business logic.

pub mod lockout;
pub mod notification;
pub mod pruner;

pub use lockout::LockoutService;
pub use notification::NotificationService;
pub use pruner::{PruneReport, PrunerService};
