//! In-app notifications and their settings

use serde::{Deserialize, Serialize};
use studysync_store::{Entity, Record};

/// Notification category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Task reminders
    Task,
    /// Pomodoro phase changes
    Pomodoro,
    /// Achievement unlocks
    Achievement,
    /// Weekly progress
    Progress,
    /// Anything else
    General,
}

/// A stored notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Document id
    pub id: String,
    /// Category
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Title
    pub title: String,
    /// Body
    #[serde(default)]
    pub message: String,
    /// Creation time in milliseconds since the epoch
    pub timestamp: i64,
    /// Read flag
    #[serde(default)]
    pub read: bool,
    /// Optional icon glyph
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Record for Notification {}

impl Entity for Notification {
    const COLLECTION: &'static str = "notifications";
    const ID_PREFIX: &'static str = "notif";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Caller-supplied fields of a new notification
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    /// Category
    pub kind: NotificationKind,
    /// Title
    pub title: String,
    /// Body
    pub message: String,
    /// Optional icon glyph
    pub icon: Option<String>,
}

impl NewNotification {
    /// Draft without an icon
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            icon: None,
        }
    }

    /// Materialize as unread
    #[must_use]
    pub fn into_notification(self, id: String, timestamp: i64) -> Notification {
        Notification {
            id,
            kind: self.kind,
            title: self.title,
            message: self.message,
            timestamp,
            read: false,
            icon: self.icon,
        }
    }
}

/// Per-category delivery switches, stored at `settings/notificationSettings`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    /// Task reminders (also gates general notifications)
    pub task_reminders: bool,
    /// Pomodoro breaks
    pub pomodoro_breaks: bool,
    /// Weekly progress
    pub weekly_progress: bool,
    /// Achievement unlocks
    pub achievement_unlocked: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            task_reminders: true,
            pomodoro_breaks: true,
            weekly_progress: true,
            achievement_unlocked: true,
        }
    }
}

impl NotificationSettings {
    /// Whether a notification of this kind may be stored
    #[must_use]
    pub fn allows(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::Task | NotificationKind::General => self.task_reminders,
            NotificationKind::Pomodoro => self.pomodoro_breaks,
            NotificationKind::Progress => self.weekly_progress,
            NotificationKind::Achievement => self.achievement_unlocked,
        }
    }
}

impl Record for NotificationSettings {}

/// Partial settings update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettingsPatch {
    /// Task reminders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_reminders: Option<bool>,
    /// Pomodoro breaks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pomodoro_breaks: Option<bool>,
    /// Weekly progress
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_progress: Option<bool>,
    /// Achievement unlocks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievement_unlocked: Option<bool>,
}

impl NotificationSettingsPatch {
    /// Apply on top of `base`
    #[must_use]
    pub fn apply(&self, mut base: NotificationSettings) -> NotificationSettings {
        if let Some(v) = self.task_reminders {
            base.task_reminders = v;
        }
        if let Some(v) = self.pomodoro_breaks {
            base.pomodoro_breaks = v;
        }
        if let Some(v) = self.weekly_progress {
            base.weekly_progress = v;
        }
        if let Some(v) = self.achievement_unlocked {
            base.achievement_unlocked = v;
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_follows_task_reminders() {
        let settings = NotificationSettingsPatch {
            task_reminders: Some(false),
            ..NotificationSettingsPatch::default()
        }
        .apply(NotificationSettings::default());
        assert!(!settings.allows(NotificationKind::General));
        assert!(!settings.allows(NotificationKind::Task));
        assert!(settings.allows(NotificationKind::Pomodoro));
    }

    #[test]
    fn partial_settings_document_fills_defaults() {
        let settings: NotificationSettings =
            serde_json::from_value(serde_json::json!({"weeklyProgress": false})).unwrap();
        assert!(settings.task_reminders);
        assert!(!settings.weekly_progress);
    }
}
