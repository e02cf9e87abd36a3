//! studysync core
//!
//! Wires the whole synchronization layer together:
//! - [`SyncConfig`]: tunables, loadable from TOML
//! - [`StudySync`]: one session controller and all eight synchronizers
//!   sharing a store, a clock and a notifier
//! - [`LocalIdentityProvider`]: in-memory accounts for offline use
//!
//! # Example
//!
//! ```rust,ignore
//! use studysync_core::prelude::*;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = Arc::new(LocalIdentityProvider::new());
//! let app = StudySync::new(
//!     SyncConfig::new(),
//!     Arc::new(MemoryStore::new()),
//!     provider.clone(),
//!     Arc::new(MemoryLocalStore::new()),
//!     Arc::new(TracingNotifier),
//!     Arc::new(SystemClock),
//! )?;
//! app.start();
//!
//! provider.sign_up("ada", "secret")?;
//! app.tasks().add(NewTask::titled("Read chapter 3")).await?;
//! println!("{} tasks", app.tasks().tasks().len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod app;
pub mod config;
pub mod provider;

pub use app::StudySync;
pub use config::{ConfigError, SyncConfig};
pub use provider::LocalIdentityProvider;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for embedding studysync
    pub use crate::{LocalIdentityProvider, StudySync, SyncConfig};
    pub use std::sync::Arc;
    pub use studysync_collections::{SyncState, SystemClock};
    pub use studysync_model::{NewClass, NewGrade, NewNotification, NewSubject, NewTask};
    pub use studysync_session::{MemoryLocalStore, TracingNotifier};
    pub use studysync_store::{MemoryStore, SyncError};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
