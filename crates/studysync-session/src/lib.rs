//! studysync session layer
//!
//! Everything that decides *who* the synchronizers work for:
//! - [`SessionScope`]: the bound [`Identity`], observed through a watch channel
//! - [`SessionController`]: binds/unbinds from the [`IdentityProvider`] feed,
//!   purges local residue on user change, sign-out and account deletion, and
//!   migrates legacy local blobs once per user
//! - [`LocalStore`] / [`Counters`]: durable local bookkeeping
//! - [`Notifier`] and [`SignalBus`]: fire-and-forget collaborator ports

#![warn(unreachable_pub)]

mod controller;
mod error;
mod local;
mod migrate;
mod ports;
mod scope;

pub use controller::SessionController;
pub use error::SessionError;
pub use local::{
    Counters, LocalKeys, LocalStore, MemoryLocalStore, COMPLETED_TASKS, LEGACY_GLOBAL_KEYS,
    LEGACY_USER_PREFIXES, MIGRATED, POMODORO_SESSIONS, STUDY_STREAK,
};
pub use migrate::MigrationReport;
pub use ports::{IdentityProvider, Notifier, Severity, Signal, SignalBus, TracingNotifier};
pub use scope::{Identity, SessionScope};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
