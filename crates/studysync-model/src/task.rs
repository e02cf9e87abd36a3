//! Tasks

use serde::{Deserialize, Serialize};
use studysync_store::{Entity, Record};

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low
    Low,
    /// Medium (default)
    #[default]
    Medium,
    /// High
    High,
}

/// A to-do item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Document id
    pub id: String,
    /// Short title
    pub title: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Completion flag
    #[serde(default)]
    pub completed: bool,
    /// Priority
    #[serde(default)]
    pub priority: Priority,
    /// Due date (ISO-8601), empty when none
    #[serde(default)]
    pub due_date: String,
    /// Category label
    #[serde(default)]
    pub category: String,
    /// Optional attached image reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Creation timestamp (RFC 3339), assigned on add
    #[serde(default)]
    pub created_at: String,
}

impl Record for Task {
    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("task title must not be empty".to_string());
        }
        Ok(())
    }
}

impl Entity for Task {
    const COLLECTION: &'static str = "tasks";
    const ID_PREFIX: &'static str = "task";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Caller-supplied fields of a new task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    /// Short title
    pub title: String,
    /// Free-form description
    pub description: String,
    /// Priority
    pub priority: Priority,
    /// Due date (ISO-8601), empty when none
    pub due_date: String,
    /// Category label
    pub category: String,
    /// Optional attached image reference
    pub image: Option<String>,
}

impl NewTask {
    /// Draft with a title and defaults elsewhere
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Materialize the stored task
    #[must_use]
    pub fn into_task(self, id: String, created_at: String) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            completed: false,
            priority: self.priority,
            due_date: self.due_date,
            category: self.category,
            image: self.image,
            created_at,
        }
    }
}

/// Subset of mutable task fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// New title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New completion flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    /// New priority
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// New due date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// New category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = TaskPatch {
            completed: Some(true),
            due_date: Some("2026-10-20".into()),
            ..TaskPatch::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"completed": true, "dueDate": "2026-10-20"})
        );
    }

    #[test]
    fn blank_title_fails_validation() {
        let task = NewTask::titled("  ").into_task("task_1".into(), String::new());
        assert!(task.validate().is_err());
    }

    #[test]
    fn legacy_documents_decode_with_defaults() {
        let task: Task = serde_json::from_value(json!({"id": "t", "title": "Read"})).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert!(!task.completed);
    }
}
