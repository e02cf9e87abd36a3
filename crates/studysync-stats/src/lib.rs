//! studysync derived state
//!
//! Deterministic functions over synchronized collections. Nothing here does
//! I/O or fails: missing or malformed inputs degrade to neutral values
//! (0 %, [`Trend::Stable`], empty summaries).
//!
//! - [`gpa`]: percentage to GPA, letter grade and colour band
//! - [`grades`]: weighted/simple averages, trend, [`GradeStats`]
//! - [`study`]: study-time labels and streaks
//! - [`achievements`]: progress evaluation, claim gate, points

#![warn(unreachable_pub)]

pub mod achievements;
pub mod gpa;
pub mod grades;
pub mod study;

pub use achievements::{
    apply_progress, claimable, evaluate, total_points, unlocked_count, ProgressInputs,
};
pub use gpa::{letter_grade, percentage_to_gpa, ColorBand};
pub use grades::{average_percentage, grade_stats, trend, GradeStats, SubjectGrade, Trend};
pub use study::{study_hours_label, study_streak};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
