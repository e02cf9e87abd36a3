//! studysync collection synchronizers
//!
//! Keeps one local cache per user-scoped collection in step with the remote
//! store:
//! - [`Synchronizer`] / [`DocumentSync`]: generic mirrors of a collection or
//!   a single document, rebinding whenever the [`SessionScope`] changes
//! - [`entities`]: tasks, subjects, grades, timetable, achievements, daily
//!   stats, notifications and pomodoro settings
//! - [`Clock`] and [`Debouncer`]: time sources and trailing-edge write coalescing
//!
//! Mutations write through the store and never patch a cache in place; the
//! next snapshot is authoritative.
//!
//! [`SessionScope`]: studysync_session::SessionScope

#![warn(unreachable_pub)]

mod binding;
mod clock;
mod context;
mod debounce;
pub mod entities;
mod mount;
mod synchronizer;
#[cfg(test)]
mod testing;

pub use binding::{CacheView, SyncState};
pub use clock::{date_key, monday_index, Clock, ManualClock, SystemClock};
pub use context::SyncContext;
pub use debounce::Debouncer;
pub use entities::{
    AchievementSync, DailyStatsSync, GradeSync, NotificationSync, PomodoroSync, PomodoroTimer,
    SubjectSync, TaskSync, TimetableSync,
};
pub use mount::{follow_scope, MountHandle, Rebind};
pub use synchronizer::{DocumentSync, Noun, Synchronizer, Transform};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
