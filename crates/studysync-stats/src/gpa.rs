//! Percentage conversions: GPA steps, letter grades, colour bands

use serde::{Deserialize, Serialize};

/// GPA step table: (lower bound inclusive, GPA), highest first
const GPA_STEPS: [(f64, f64); 13] = [
    (95.0, 10.0),
    (90.0, 9.5),
    (85.0, 9.0),
    (80.0, 8.5),
    (75.0, 8.0),
    (70.0, 7.5),
    (65.0, 7.0),
    (60.0, 6.5),
    (55.0, 6.0),
    (50.0, 5.5),
    (45.0, 5.0),
    (40.0, 4.5),
    (35.0, 4.0),
];

/// Map a percentage onto the 10-point scale
///
/// Bands of 5 points from 95 down to 35 step by 0.5; below 35 the GPA is
/// `percentage / 10`. Non-finite input maps to 0.
#[must_use]
pub fn percentage_to_gpa(percentage: f64) -> f64 {
    if !percentage.is_finite() {
        return 0.0;
    }
    GPA_STEPS
        .iter()
        .find(|(floor, _)| percentage >= *floor)
        .map_or(percentage.max(0.0) / 10.0, |(_, gpa)| *gpa)
}

/// Letter for a percentage
#[must_use]
pub fn letter_grade(percentage: f64) -> &'static str {
    match percentage {
        p if p >= 90.0 => "A+",
        p if p >= 80.0 => "A",
        p if p >= 70.0 => "B",
        p if p >= 60.0 => "C",
        p if p >= 50.0 => "D",
        p if p >= 40.0 => "E",
        _ => "F",
    }
}

/// Display band for a subject average
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorBand {
    /// 90 and above
    Emerald,
    /// 80 to 90
    Blue,
    /// 70 to 80
    Amber,
    /// Below 70
    Red,
}

impl ColorBand {
    /// Band for a percentage
    #[must_use]
    pub fn for_percentage(percentage: f64) -> Self {
        match percentage {
            p if p >= 90.0 => Self::Emerald,
            p if p >= 80.0 => Self::Blue,
            p if p >= 70.0 => Self::Amber,
            _ => Self::Red,
        }
    }

    /// Colour name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Emerald => "emerald",
            Self::Blue => "blue",
            Self::Amber => "amber",
            Self::Red => "red",
        }
    }
}
