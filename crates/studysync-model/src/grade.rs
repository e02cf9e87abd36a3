//! Grades and grading preferences

use serde::{Deserialize, Serialize};
use studysync_store::{Entity, Record};

/// A scored assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    /// Document id
    pub id: String,
    /// Owning subject id
    pub subject_id: String,
    /// Owning subject display name
    #[serde(default)]
    pub subject_name: String,
    /// Assessment title
    #[serde(default)]
    pub title: String,
    /// Achieved score
    pub score: f64,
    /// Maximum score; zero marks an anomalous entry
    pub max_score: f64,
    /// Relative weight; zero everywhere means a simple mean
    #[serde(default)]
    pub weight: f64,
    /// Assessment date (ISO-8601)
    #[serde(default)]
    pub date: String,
    /// Assessment kind (exam, quiz, ...)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Grade {
    /// Score as a percentage, `None` when `max_score` is zero
    #[must_use]
    pub fn percentage(&self) -> Option<f64> {
        (self.max_score != 0.0).then(|| self.score / self.max_score * 100.0)
    }
}

impl Record for Grade {
    fn validate(&self) -> Result<(), String> {
        if !self.score.is_finite() || !self.max_score.is_finite() || !self.weight.is_finite() {
            return Err("grade numbers must be finite".to_string());
        }
        if self.max_score < 0.0 || self.weight < 0.0 {
            return Err("max score and weight must not be negative".to_string());
        }
        Ok(())
    }
}

impl Entity for Grade {
    const COLLECTION: &'static str = "grades";
    const ID_PREFIX: &'static str = "grade";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Caller-supplied fields of a new grade
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGrade {
    /// Owning subject id
    pub subject_id: String,
    /// Owning subject display name
    pub subject_name: String,
    /// Assessment title
    pub title: String,
    /// Achieved score
    pub score: f64,
    /// Maximum score
    pub max_score: f64,
    /// Relative weight
    pub weight: f64,
    /// Assessment date (ISO-8601)
    pub date: String,
    /// Assessment kind
    pub kind: Option<String>,
}

impl NewGrade {
    /// Materialize with an id
    #[must_use]
    pub fn into_grade(self, id: String) -> Grade {
        Grade {
            id,
            subject_id: self.subject_id,
            subject_name: self.subject_name,
            title: self.title,
            score: self.score,
            max_score: self.max_score,
            weight: self.weight,
            date: self.date,
            kind: self.kind,
        }
    }
}

/// Subset of mutable grade fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradePatch {
    /// New title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// New maximum score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
    /// New weight
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// New date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Preferred grading presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradingSystem {
    /// GPA on a 10-point scale
    #[default]
    College,
    /// Percentages and letters
    School,
}

/// `settings/preferences` document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingPreferences {
    /// Selected system; absent in documents written before the preference existed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grading_system: Option<GradingSystem>,
}

impl Record for GradingPreferences {}
