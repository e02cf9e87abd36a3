//! The eight collection synchronizers

pub mod achievements;
pub mod daily_stats;
pub mod grades;
pub mod notifications;
pub mod pomodoro;
pub mod subjects;
pub mod tasks;
pub mod timetable;

pub use achievements::AchievementSync;
pub use daily_stats::{DailyStatsSync, DEFAULT_ROLLOVER_CHECK};
pub use grades::GradeSync;
pub use notifications::{NotificationSync, DEFAULT_NOTIFICATION_CAP};
pub use pomodoro::{
    PhaseEnd, PomodoroSync, PomodoroTimer, DEFAULT_MINUTES_DEBOUNCE, DEFAULT_SESSIONS_DEBOUNCE,
    LONG_BREAK_EVERY,
};
pub use subjects::SubjectSync;
pub use tasks::TaskSync;
pub use timetable::TimetableSync;
