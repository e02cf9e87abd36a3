//! Per-day study counters

use serde::{Deserialize, Serialize};
use studysync_store::Record;

/// Counters for one calendar day, stored at `dailyStats/{YYYY-MM-DD}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    /// Local calendar date `YYYY-MM-DD`
    pub date: String,
    /// Minutes studied
    #[serde(default)]
    pub study_minutes: u32,
    /// Completed pomodoro work periods
    #[serde(default)]
    pub focus_sessions: u32,
}

impl DailyStats {
    /// Zeroed counters for `date`
    pub fn empty(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            study_minutes: 0,
            focus_sessions: 0,
        }
    }
}

impl Record for DailyStats {}

/// Collection holding one document per day
pub const DAILY_STATS_COLLECTION: &str = "dailyStats";
