//! studysync entity model
//!
//! Typed shapes of every synchronized document:
//! - collections with client-generated ids: [`Task`], [`Subject`], [`Grade`],
//!   [`TimetableClass`], [`Achievement`], [`Notification`]
//! - singleton documents: [`DailyStats`], [`PomodoroSettings`],
//!   [`GradingPreferences`], [`NotificationSettings`]
//!
//! Each collection type comes with a `New*` draft (fields the caller supplies)
//! and, where updates are partial, a `*Patch` whose absent fields are never
//! written.

#![warn(unreachable_pub)]

mod achievement;
mod daily_stats;
mod grade;
mod notification;
mod pomodoro;
mod subject;
mod task;
mod timetable;

pub use achievement::{
    default_achievements, Achievement, EARLY_BIRD, FOCUS_MASTER, NIGHT_OWL, STREAK_MASTER,
    TASK_CRUSHER,
};
pub use daily_stats::{DailyStats, DAILY_STATS_COLLECTION};
pub use grade::{Grade, GradePatch, GradingPreferences, GradingSystem, NewGrade};
pub use notification::{
    NewNotification, Notification, NotificationKind, NotificationSettings,
    NotificationSettingsPatch,
};
pub use pomodoro::{
    PomodoroDurations, PomodoroMode, PomodoroSettings, MAX_PHASE_SECS, POMODORO_COLLECTION,
    POMODORO_SETTINGS_ID,
};
pub use subject::{
    NewNote, NewResource, NewSubject, NewTopic, Note, Resource, ResourceKind, Subject,
    SubjectPatch, Topic,
};
pub use task::{NewTask, Priority, Task, TaskPatch};
pub use timetable::{ClassPatch, NewClass, TimetableClass, DAYS_PER_WEEK};

/// Collection holding the preference documents
pub const SETTINGS_COLLECTION: &str = "settings";
/// Document id of [`GradingPreferences`]
pub const PREFERENCES_ID: &str = "preferences";
/// Document id of [`NotificationSettings`]
pub const NOTIFICATION_SETTINGS_ID: &str = "notificationSettings";

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
