//! Achievements and the default catalogue

use serde::{Deserialize, Serialize};
use studysync_store::{Entity, Record};

/// Catalogue id: study before 08:00
pub const EARLY_BIRD: &str = "early_bird";
/// Catalogue id: study at or after 22:00
pub const NIGHT_OWL: &str = "night_owl";
/// Catalogue id: seven-day study streak
pub const STREAK_MASTER: &str = "streak_master";
/// Catalogue id: fifty completed tasks
pub const TASK_CRUSHER: &str = "task_crusher";
/// Catalogue id: one hundred pomodoro sessions
pub const FOCUS_MASTER: &str = "focus_master";

/// An unlockable goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    /// Catalogue id, also the document id
    pub id: String,
    /// Display name
    pub name: String,
    /// Icon glyph
    #[serde(default)]
    pub icon: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Unlocked flag; never reverts once set
    #[serde(default)]
    pub unlocked: bool,
    /// Claimed flag; only meaningful when unlocked
    #[serde(default)]
    pub claimed: bool,
    /// Progress towards `max_progress`
    #[serde(default)]
    pub progress: u32,
    /// Progress needed to unlock
    pub max_progress: u32,
    /// Grouping label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Points credited on claim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
}

impl Achievement {
    fn template(
        id: &str,
        name: &str,
        icon: &str,
        description: &str,
        max_progress: u32,
        category: &str,
        points: u32,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            description: description.to_string(),
            unlocked: false,
            claimed: false,
            progress: 0,
            max_progress,
            category: Some(category.to_string()),
            points: Some(points),
        }
    }
}

impl Record for Achievement {
    fn validate(&self) -> Result<(), String> {
        if self.max_progress == 0 {
            return Err("max progress must be positive".to_string());
        }
        Ok(())
    }
}

impl Entity for Achievement {
    const COLLECTION: &'static str = "achievements";
    const ID_PREFIX: &'static str = "achievement";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Catalogue seeded for users with no achievements yet
#[must_use]
pub fn default_achievements() -> Vec<Achievement> {
    vec![
        Achievement::template(EARLY_BIRD, "Early Bird", "🌅", "Study before 8 AM", 1, "time", 50),
        Achievement::template(NIGHT_OWL, "Night Owl", "🦉", "Study after 10 PM", 1, "time", 50),
        Achievement::template(
            STREAK_MASTER,
            "Streak Master",
            "🔥",
            "7 day study streak",
            7,
            "consistency",
            100,
        ),
        Achievement::template(
            TASK_CRUSHER,
            "Task Crusher",
            "✅",
            "Complete 50 tasks",
            50,
            "productivity",
            150,
        ),
        Achievement::template(
            FOCUS_MASTER,
            "Focus Master",
            "🎯",
            "Complete 100 Pomodoro sessions",
            100,
            "focus",
            200,
        ),
    ]
}
