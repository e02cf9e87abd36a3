//! Study time formatting and streaks

use chrono::{Days, NaiveDate};
use std::collections::HashSet;
use studysync_model::DailyStats;

/// Human label for a minute count: `0h`, `45m`, `2h`, `1h 30m`
#[must_use]
pub fn study_hours_label(minutes: u32) -> String {
    let (hours, rest) = (minutes / 60, minutes % 60);
    match (hours, rest) {
        (0, 0) => "0h".to_string(),
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// Consecutive days with study time, ending today or yesterday
///
/// Days whose `date` does not parse as `YYYY-MM-DD` are ignored.
#[must_use]
pub fn study_streak(days: &[DailyStats], today: NaiveDate) -> u32 {
    let studied: HashSet<NaiveDate> = days
        .iter()
        .filter(|d| d.study_minutes > 0)
        .filter_map(|d| NaiveDate::parse_from_str(&d.date, "%Y-%m-%d").ok())
        .collect();

    let start = if studied.contains(&today) {
        Some(today)
    } else {
        today
            .checked_sub_days(Days::new(1))
            .filter(|y| studied.contains(y))
    };

    let mut streak = 0;
    let mut cursor = start;
    while let Some(day) = cursor.filter(|d| studied.contains(d)) {
        streak += 1;
        cursor = day.checked_sub_days(Days::new(1));
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(date: &str, minutes: u32) -> DailyStats {
        DailyStats {
            date: date.into(),
            study_minutes: minutes,
            focus_sessions: 0,
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn labels() {
        assert_eq!(study_hours_label(0), "0h");
        assert_eq!(study_hours_label(45), "45m");
        assert_eq!(study_hours_label(120), "2h");
        assert_eq!(study_hours_label(90), "1h 30m");
    }

    #[test]
    fn streak_may_end_yesterday() {
        let days = [day("2026-10-16", 10), day("2026-10-17", 30), day("2026-10-18", 5)];
        assert_eq!(study_streak(&days, date("2026-10-19")), 3);
        assert_eq!(study_streak(&days, date("2026-10-18")), 3);
        assert_eq!(study_streak(&days, date("2026-10-20")), 0);
    }

    #[test]
    fn zero_minute_day_breaks_streak() {
        let days = [day("2026-10-16", 10), day("2026-10-17", 0), day("2026-10-18", 5)];
        assert_eq!(study_streak(&days, date("2026-10-18")), 1);
    }
}
