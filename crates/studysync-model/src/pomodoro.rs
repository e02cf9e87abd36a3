//! Pomodoro settings document

use serde::{Deserialize, Serialize};
use studysync_store::Record;

/// Collection holding the settings document
pub const POMODORO_COLLECTION: &str = "pomodoro";
/// Id of the single settings document
pub const POMODORO_SETTINGS_ID: &str = "settings";
/// Upper bound for any phase, in seconds
pub const MAX_PHASE_SECS: u32 = 60 * 60;

/// Timer phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PomodoroMode {
    /// Focus period
    #[default]
    Work,
    /// Short break
    Short,
    /// Long break
    Long,
}

/// Phase lengths in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroDurations {
    /// Focus period
    pub work: u32,
    /// Short break
    pub short: u32,
    /// Long break
    pub long: u32,
}

impl Default for PomodoroDurations {
    fn default() -> Self {
        Self {
            work: 30 * 60,
            short: 5 * 60,
            long: 15 * 60,
        }
    }
}

impl PomodoroDurations {
    /// Length of `mode`
    #[must_use]
    pub fn of(&self, mode: PomodoroMode) -> u32 {
        match mode {
            PomodoroMode::Work => self.work,
            PomodoroMode::Short => self.short,
            PomodoroMode::Long => self.long,
        }
    }

    /// Every phase clamped to `1..=MAX_PHASE_SECS`
    #[must_use]
    pub fn clamped(self) -> Self {
        let clamp = |secs: u32| secs.clamp(1, MAX_PHASE_SECS);
        Self {
            work: clamp(self.work),
            short: clamp(self.short),
            long: clamp(self.long),
        }
    }
}

/// `pomodoro/settings` document; every field may be written independently
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroSettings {
    /// Phase lengths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durations: Option<PomodoroDurations>,
    /// Lifetime completed work periods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions: Option<u32>,
    /// Lifetime focused minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_minutes: Option<f64>,
}

impl Record for PomodoroSettings {}
