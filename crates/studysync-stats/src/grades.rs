//! Grade averaging, trend detection and the per-subject summary

use crate::gpa::{letter_grade, percentage_to_gpa, ColorBand};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use studysync_model::Grade;

/// Entries per trend window
pub const TREND_WINDOW: usize = 5;
/// Percentage-point margin before a trend is reported
pub const TREND_MARGIN: f64 = 2.0;

/// Direction of recent performance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Recent mean above the older mean by more than the margin
    Improving,
    /// Recent mean below the older mean by more than the margin
    Declining,
    /// Anything else, including insufficient data
    #[default]
    Stable,
}

/// Average percentage of a set of grades
///
/// Weighted (`Σ weight·pct / Σ weight`) when any counted grade has a nonzero
/// weight, else the arithmetic mean. Grades with `max_score == 0` are left out
/// of both sums and logged. No counted grades yields 0.
#[must_use]
pub fn average_percentage(grades: &[Grade]) -> f64 {
    let counted: Vec<(f64, f64)> = grades
        .iter()
        .filter_map(|g| match g.percentage() {
            Some(pct) => Some((pct, g.weight)),
            None => {
                tracing::warn!(grade = %g.id, subject = %g.subject_id, "grade with max score 0 skipped");
                None
            }
        })
        .collect();
    if counted.is_empty() {
        return 0.0;
    }

    let total_weight: f64 = counted.iter().map(|(_, w)| w).sum();
    if total_weight > 0.0 {
        counted.iter().map(|(pct, w)| pct * w).sum::<f64>() / total_weight
    } else {
        #[allow(clippy::cast_precision_loss)]
        let n = counted.len() as f64;
        counted.iter().map(|(pct, _)| pct).sum::<f64>() / n
    }
}

/// Compare the newest five grades with the five before them
///
/// Only grades with a usable percentage count; fewer than ten yields
/// [`Trend::Stable`].
#[must_use]
pub fn trend(grades: &[Grade]) -> Trend {
    let mut dated: Vec<(Option<NaiveDateTime>, f64)> = grades
        .iter()
        .filter_map(|g| g.percentage().map(|pct| (parse_date(&g.date), pct)))
        .collect();
    if dated.len() < TREND_WINDOW * 2 {
        return Trend::Stable;
    }
    // Newest first; undated grades sort last.
    dated.sort_by(|a, b| b.0.cmp(&a.0));

    let mean = |window: &[(Option<NaiveDateTime>, f64)]| {
        #[allow(clippy::cast_precision_loss)]
        let n = window.len() as f64;
        window.iter().map(|(_, pct)| pct).sum::<f64>() / n
    };
    let recent = mean(&dated[..TREND_WINDOW]);
    let older = mean(&dated[TREND_WINDOW..TREND_WINDOW * 2]);

    if recent > older + TREND_MARGIN {
        Trend::Improving
    } else if recent < older - TREND_MARGIN {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_utc())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Summary of one subject's grades
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectGrade {
    /// Subject id
    pub subject_id: String,
    /// Subject name from the first grade, `Unknown` if blank
    pub subject_name: String,
    /// Grades of this subject
    pub grades: Vec<Grade>,
    /// Average percentage
    pub average: f64,
    /// Letter for `average`
    pub letter_grade: String,
    /// Colour band for `average`
    pub color: ColorBand,
}

/// Aggregate over all grades
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeStats {
    /// GPA of `overall_percentage`
    #[serde(rename = "overallGPA")]
    pub overall_gpa: f64,
    /// Mean of the subject averages
    pub overall_percentage: f64,
    /// Letter for `overall_percentage`
    pub letter_grade: String,
    /// Per-subject summaries, ordered by subject id
    pub subject_grades: Vec<SubjectGrade>,
    /// Recent performance direction
    pub trend: Trend,
}

impl Default for GradeStats {
    fn default() -> Self {
        grade_stats(&[])
    }
}

/// Group by subject and summarize
#[must_use]
pub fn grade_stats(grades: &[Grade]) -> GradeStats {
    let mut by_subject: BTreeMap<&str, Vec<Grade>> = BTreeMap::new();
    for grade in grades {
        by_subject
            .entry(grade.subject_id.as_str())
            .or_default()
            .push(grade.clone());
    }

    let subject_grades: Vec<SubjectGrade> = by_subject
        .into_iter()
        .map(|(subject_id, list)| {
            let average = average_percentage(&list);
            let subject_name = list
                .first()
                .map(|g| g.subject_name.clone())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Unknown".to_string());
            SubjectGrade {
                subject_id: subject_id.to_string(),
                subject_name,
                grades: list,
                average,
                letter_grade: letter_grade(average).to_string(),
                color: ColorBand::for_percentage(average),
            }
        })
        .collect();

    let overall_percentage = if subject_grades.is_empty() {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let n = subject_grades.len() as f64;
        subject_grades.iter().map(|s| s.average).sum::<f64>() / n
    };

    GradeStats {
        overall_gpa: percentage_to_gpa(overall_percentage),
        overall_percentage,
        letter_grade: letter_grade(overall_percentage).to_string(),
        subject_grades,
        trend: trend(grades),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grade(score: f64, max: f64, weight: f64) -> Grade {
        Grade {
            id: format!("g{score}"),
            subject_id: "s".into(),
            subject_name: String::new(),
            title: String::new(),
            score,
            max_score: max,
            weight,
            date: String::new(),
            kind: None,
        }
    }

    #[test]
    fn simple_mean_without_weights() {
        let avg = average_percentage(&[grade(80.0, 100.0, 0.0), grade(90.0, 100.0, 0.0)]);
        assert!((avg - 85.0).abs() < 1e-9);
    }

    #[test]
    fn weighted_mean_with_weights() {
        let avg = average_percentage(&[grade(80.0, 100.0, 1.0), grade(90.0, 100.0, 3.0)]);
        assert!((avg - 87.5).abs() < 1e-9);
    }

    #[test]
    fn zero_max_is_excluded_from_both_sums() {
        let avg = average_percentage(&[
            grade(80.0, 100.0, 1.0),
            grade(50.0, 0.0, 5.0),
            grade(90.0, 100.0, 3.0),
        ]);
        assert!((avg - 87.5).abs() < 1e-9);
        assert_eq!(average_percentage(&[grade(1.0, 0.0, 0.0)]), 0.0);
    }

    #[test]
    fn empty_stats_are_neutral() {
        let stats = grade_stats(&[]);
        assert_eq!(stats.overall_percentage, 0.0);
        assert_eq!(stats.overall_gpa, 0.0);
        assert_eq!(stats.letter_grade, "F");
        assert_eq!(stats.trend, Trend::Stable);
    }

    #[test]
    fn dates_parse_in_common_shapes() {
        assert!(parse_date("2026-03-01").is_some());
        assert!(parse_date("2026-03-01T10:00:00Z").is_some());
        assert!(parse_date("2026-03-01T10:00:00.000").is_some());
        assert!(parse_date("yesterday").is_none());
    }
}
