//! SQLite storage backend for the bastille account lockout ecosystem.
//!
//! Provides sqlx-backed implementations of the core repository traits, the
//! schema migrations for the two lockout tables, and a SQL identity resolver
//! for looking subjects up by their configured login field.

pub mod migrations;
pub mod repositories;
pub mod resolver;

pub use repositories::{
    SqliteAttemptLogRepository, SqliteLockRepository, SqliteRepositoryProvider,
};
pub use resolver::SqliteIdentityResolver;
