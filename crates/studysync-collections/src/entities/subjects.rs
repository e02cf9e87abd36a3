//! Subject synchronizer with embedded notes, topics and resources
//!
//! Nested mutations read the parent subject from the store, modify the
//! embedded array and write the whole parent back. Two concurrent nested
//! mutations of the same subject from different devices can race, and the
//! later write drops the other side's change; no version check guards the
//! read-modify-write.

use crate::binding::SyncState;
use crate::context::SyncContext;
use crate::mount::MountHandle;
use crate::synchronizer::{Noun, Synchronizer};
use std::sync::Arc;
use studysync_model::{
    NewNote, NewResource, NewSubject, NewTopic, Note, Subject, SubjectPatch, Topic,
};
use studysync_store::{Record, SyncError};

/// Mirror of the `subjects` collection
#[derive(Debug, Clone)]
pub struct SubjectSync {
    core: Synchronizer<Subject>,
}

impl SubjectSync {
    /// Unbound subject synchronizer
    pub fn new(ctx: SyncContext) -> Self {
        Self {
            core: Synchronizer::new(ctx, Noun::new("subject", "subjects")),
        }
    }

    /// Generic synchronizer underneath
    #[must_use]
    pub fn core(&self) -> &Synchronizer<Subject> {
        &self.core
    }

    /// Cached subjects
    #[must_use]
    pub fn subjects(&self) -> Arc<Vec<Subject>> {
        self.core.entities()
    }

    /// Lifecycle state
    #[must_use]
    pub fn state(&self) -> SyncState {
        self.core.state()
    }

    /// Follow the session scope
    pub fn mount(&self) -> MountHandle {
        self.core.mount()
    }

    /// Create an empty subject
    ///
    /// # Errors
    /// See [`Synchronizer::insert_with`].
    pub async fn add_subject(&self, draft: NewSubject) -> Result<String, SyncError> {
        self.core.insert_with(|id| draft.into_subject(id)).await
    }

    /// Update top-level fields
    ///
    /// # Errors
    /// See [`Synchronizer::update_fields`].
    pub async fn update_subject(&self, id: &str, patch: &SubjectPatch) -> Result<(), SyncError> {
        self.core.update_fields(id, patch).await
    }

    /// Delete a subject with everything embedded in it
    ///
    /// # Errors
    /// See [`Synchronizer::remove`].
    pub async fn delete_subject(&self, id: &str) -> Result<(), SyncError> {
        self.core.remove(id).await
    }

    /// Append a note; returns its id
    ///
    /// # Errors
    /// `NotFound` for a missing subject, else as [`Self::add_subject`].
    pub async fn add_note(&self, subject_id: &str, draft: NewNote) -> Result<String, SyncError> {
        let ctx = self.core.context();
        let id = ctx.new_id("note");
        let note = Note {
            id: id.clone(),
            title: draft.title,
            content: draft.content,
            created_at: ctx.clock.now().and_utc().to_rfc3339(),
        };
        self.modify("add note", subject_id, move |s| s.notes.push(note))
            .await?;
        Ok(id)
    }

    /// Remove a note
    ///
    /// # Errors
    /// `NotFound` for a missing subject.
    pub async fn delete_note(&self, subject_id: &str, note_id: &str) -> Result<(), SyncError> {
        self.modify("delete note", subject_id, |s| s.notes.retain(|n| n.id != note_id))
            .await
    }

    /// Append a topic; returns its id
    ///
    /// # Errors
    /// `NotFound` for a missing subject.
    pub async fn add_topic(&self, subject_id: &str, draft: NewTopic) -> Result<String, SyncError> {
        let id = self.core.context().new_id("topic");
        let topic = Topic {
            id: id.clone(),
            name: draft.name,
            completed: draft.completed,
        };
        self.modify("add topic", subject_id, move |s| s.topics.push(topic))
            .await?;
        Ok(id)
    }

    /// Remove a topic
    ///
    /// # Errors
    /// `NotFound` for a missing subject.
    pub async fn delete_topic(&self, subject_id: &str, topic_id: &str) -> Result<(), SyncError> {
        self.modify("delete topic", subject_id, |s| s.topics.retain(|t| t.id != topic_id))
            .await
    }

    /// Flip completion of a topic
    ///
    /// # Errors
    /// `NotFound` for a missing subject.
    pub async fn toggle_topic(&self, subject_id: &str, topic_id: &str) -> Result<(), SyncError> {
        self.modify("update topic", subject_id, |s| {
            for topic in s.topics.iter_mut().filter(|t| t.id == topic_id) {
                topic.completed = !topic.completed;
            }
        })
        .await
    }

    /// Append a resource; returns its id
    ///
    /// # Errors
    /// `NotFound` for a missing subject.
    pub async fn add_resource(&self, subject_id: &str, draft: NewResource) -> Result<String, SyncError> {
        let id = self.core.context().new_id("resource");
        let resource = draft.into_resource(id.clone());
        self.modify("add resource", subject_id, move |s| s.resources.push(resource))
            .await?;
        Ok(id)
    }

    /// Remove a resource
    ///
    /// # Errors
    /// `NotFound` for a missing subject.
    pub async fn delete_resource(&self, subject_id: &str, resource_id: &str) -> Result<(), SyncError> {
        self.modify("delete resource", subject_id, |s| {
            s.resources.retain(|r| r.id != resource_id);
        })
        .await
    }

    async fn modify<F>(&self, action: &str, subject_id: &str, edit: F) -> Result<(), SyncError>
    where
        F: FnOnce(&mut Subject) + Send,
    {
        let client = self.core.client_for(action)?;
        self.core
            .context()
            .guard(action, async {
                let mut subject = client
                    .get(subject_id)
                    .await?
                    .ok_or_else(|| SyncError::NotFound(subject_id.to_string()))?;
                edit(&mut subject);
                subject.validate().map_err(|reason| SyncError::Invalid {
                    id: subject_id.to_string(),
                    reason,
                })?;
                client.set(subject_id, &subject).await
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use studysync_model::ResourceKind;

    fn draft(name: &str) -> NewSubject {
        NewSubject {
            name: name.into(),
            color: "blue".into(),
        }
    }

    #[tokio::test]
    async fn nested_edits_rewrite_the_parent() {
        let h = Harness::signed_in("u1");
        let subjects = SubjectSync::new(h.ctx.clone());
        let _mount = subjects.mount();
        let sid = subjects.add_subject(draft("Physics")).await.unwrap();

        let note = subjects
            .add_note(
                &sid,
                NewNote {
                    title: "Optics".into(),
                    content: "Snell".into(),
                },
            )
            .await
            .unwrap();
        let topic = subjects
            .add_topic(
                &sid,
                NewTopic {
                    name: "Waves".into(),
                    completed: false,
                },
            )
            .await
            .unwrap();
        subjects
            .add_resource(
                &sid,
                NewResource {
                    title: "Lecture".into(),
                    url: "https://example.org/l1".into(),
                    kind: ResourceKind::Video,
                    ..NewResource::default()
                },
            )
            .await
            .unwrap();
        subjects.toggle_topic(&sid, &topic).await.unwrap();
        subjects.delete_note(&sid, &note).await.unwrap();

        let cached = subjects.subjects();
        let physics = &cached[0];
        assert!(physics.notes.is_empty());
        assert_eq!(physics.topics.len(), 1);
        assert!(physics.topics[0].completed);
        assert_eq!(physics.resources[0].kind, ResourceKind::Video);
    }

    #[tokio::test]
    async fn nested_edit_of_missing_subject_is_not_found() {
        let h = Harness::signed_in("u1");
        let subjects = SubjectSync::new(h.ctx.clone());
        let err = subjects
            .add_topic("subject_gone", NewTopic::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            h.notifier.errors(),
            vec!["Failed to add topic: it no longer exists.".to_string()]
        );
        assert_eq!(h.store.committed_writes(), 0);
    }

    #[tokio::test]
    async fn renaming_to_blank_is_rejected() {
        let h = Harness::signed_in("u1");
        let subjects = SubjectSync::new(h.ctx.clone());
        let _mount = subjects.mount();
        let sid = subjects.add_subject(draft("Maths")).await.unwrap();
        let writes = h.store.committed_writes();

        let patch = SubjectPatch {
            name: Some(String::new()),
            ..SubjectPatch::default()
        };
        let err = subjects.update_subject(&sid, &patch).await.unwrap_err();
        assert!(matches!(err, SyncError::Invalid { .. }));
        assert_eq!(h.store.committed_writes(), writes);
        assert_eq!(h.notifier.errors().len(), 1);
        assert_eq!(subjects.subjects()[0].name, "Maths");
    }

    #[tokio::test]
    async fn deleting_subject_drops_embedded_items() {
        let h = Harness::signed_in("u1");
        let subjects = SubjectSync::new(h.ctx.clone());
        let _mount = subjects.mount();
        let sid = subjects.add_subject(draft("Maths")).await.unwrap();
        subjects.add_note(&sid, NewNote::default()).await.unwrap();
        subjects.delete_subject(&sid).await.unwrap();
        assert!(subjects.subjects().is_empty());
    }
}
