//! Subjects and their embedded notes, topics and resources
//!
//! Notes, topics and resources are not collections of their own: they are
//! arrays inside the owning subject document and are only ever written by
//! rewriting the whole subject.

use serde::{Deserialize, Serialize};
use studysync_store::{Entity, Record};

/// A note attached to a subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Note id (unique within the subject)
    pub id: String,
    /// Title
    pub title: String,
    /// Body
    #[serde(default)]
    pub content: String,
    /// Creation timestamp (RFC 3339)
    #[serde(default)]
    pub created_at: String,
}

/// A syllabus topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// Topic id (unique within the subject)
    pub id: String,
    /// Name
    pub name: String,
    /// Whether the topic has been covered
    #[serde(default)]
    pub completed: bool,
}

/// Kind of study resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Web link
    #[default]
    Link,
    /// Uploaded file
    File,
    /// Video
    Video,
}

/// A study resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Resource id (unique within the subject)
    pub id: String,
    /// Title
    pub title: String,
    /// Target URL
    #[serde(default)]
    pub url: String,
    /// Kind
    #[serde(rename = "type", default)]
    pub kind: ResourceKind,
    /// Original file name for uploads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Encoded file payload for uploads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_data: Option<String>,
}

/// A subject with its embedded material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Document id
    pub id: String,
    /// Name
    pub name: String,
    /// Display colour
    #[serde(default)]
    pub color: String,
    /// Notes
    #[serde(default)]
    pub notes: Vec<Note>,
    /// Topics
    #[serde(default)]
    pub topics: Vec<Topic>,
    /// Resources
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl Record for Subject {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("subject name must not be empty".to_string());
        }
        Ok(())
    }
}

impl Entity for Subject {
    const COLLECTION: &'static str = "subjects";
    const ID_PREFIX: &'static str = "subject";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Caller-supplied fields of a new subject
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewSubject {
    /// Name
    pub name: String,
    /// Display colour
    pub color: String,
}

impl NewSubject {
    /// Materialize an empty subject
    #[must_use]
    pub fn into_subject(self, id: String) -> Subject {
        Subject {
            id,
            name: self.name,
            color: self.color,
            notes: Vec::new(),
            topics: Vec::new(),
            resources: Vec::new(),
        }
    }
}

/// Subset of mutable top-level subject fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectPatch {
    /// New name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New colour
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Caller-supplied fields of a new note
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewNote {
    /// Title
    pub title: String,
    /// Body
    pub content: String,
}

/// Caller-supplied fields of a new topic
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTopic {
    /// Name
    pub name: String,
    /// Initial completion flag
    pub completed: bool,
}

/// Caller-supplied fields of a new resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewResource {
    /// Title
    pub title: String,
    /// Target URL
    pub url: String,
    /// Kind
    pub kind: ResourceKind,
    /// Original file name for uploads
    pub file_name: Option<String>,
    /// Encoded file payload for uploads
    pub file_data: Option<String>,
}

impl NewResource {
    /// Materialize with an id
    #[must_use]
    pub fn into_resource(self, id: String) -> Resource {
        Resource {
            id,
            title: self.title,
            url: self.url,
            kind: self.kind,
            file_name: self.file_name,
            file_data: self.file_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resource_kind_uses_type_field() {
        let res: Resource = serde_json::from_value(json!({
            "id": "r1", "title": "Lecture", "url": "https://example.org", "type": "video"
        }))
        .unwrap();
        assert_eq!(res.kind, ResourceKind::Video);
        assert!(res.file_name.is_none());
    }

    #[test]
    fn subject_without_nested_arrays_decodes_empty() {
        let subject: Subject =
            serde_json::from_value(json!({"id": "s1", "name": "Physics"})).unwrap();
        assert!(subject.notes.is_empty() && subject.topics.is_empty() && subject.resources.is_empty());
    }
}
