//! Weekly timetable synchronizer

use crate::binding::SyncState;
use crate::context::SyncContext;
use crate::mount::MountHandle;
use crate::synchronizer::{Noun, Synchronizer};
use std::sync::Arc;
use studysync_model::{ClassPatch, NewClass, TimetableClass};
use studysync_store::SyncError;

/// Mirror of the `timetable` collection
#[derive(Debug, Clone)]
pub struct TimetableSync {
    core: Synchronizer<TimetableClass>,
}

impl TimetableSync {
    /// Unbound timetable synchronizer
    pub fn new(ctx: SyncContext) -> Self {
        Self {
            core: Synchronizer::new(ctx, Noun::new("class", "timetable")),
        }
    }

    /// Generic synchronizer underneath
    #[must_use]
    pub fn core(&self) -> &Synchronizer<TimetableClass> {
        &self.core
    }

    /// Cached classes
    #[must_use]
    pub fn classes(&self) -> Arc<Vec<TimetableClass>> {
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

    /// Schedule a class
    ///
    /// # Errors
    /// See [`Synchronizer::insert_with`]; a day outside `0..7` is `Invalid`.
    pub async fn add(&self, draft: NewClass) -> Result<String, SyncError> {
        self.core.insert_with(|id| draft.into_class(id)).await
    }

    /// Partial update
    ///
    /// # Errors
    /// See [`Synchronizer::update_fields`].
    pub async fn update(&self, id: &str, patch: &ClassPatch) -> Result<(), SyncError> {
        self.core.update_fields(id, patch).await
    }

    /// Delete
    ///
    /// # Errors
    /// See [`Synchronizer::remove`].
    pub async fn delete(&self, id: &str) -> Result<(), SyncError> {
        self.core.remove(id).await
    }

    /// Classes on `day` (Monday = 0), earliest first
    #[must_use]
    pub fn classes_on(&self, day: u8) -> Vec<TimetableClass> {
        let mut classes: Vec<_> = self
            .classes()
            .iter()
            .filter(|c| c.day == day)
            .cloned()
            .collect();
        classes.sort_by(|a, b| a.time.cmp(&b.time));
        classes
    }

    /// Classes on the clock's current weekday, earliest first
    #[must_use]
    pub fn today_classes(&self) -> Vec<TimetableClass> {
        self.classes_on(self.core.context().clock.weekday_index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use studysync_test_utils::at;

    fn class(day: u8, time: &str, subject: &str) -> NewClass {
        NewClass {
            day,
            time: time.into(),
            duration: 60,
            subject: subject.into(),
            kind: "lecture".into(),
            color: "red".into(),
        }
    }

    #[tokio::test]
    async fn sunday_class_only_shows_on_sunday() {
        let h = Harness::signed_in("u1");
        let timetable = TimetableSync::new(h.ctx.clone());
        let _mount = timetable.mount();
        timetable.add(class(6, "09:00", "Chess")).await.unwrap();
        timetable.add(class(0, "10:00", "Maths")).await.unwrap();

        // Monday
        let monday: Vec<_> = timetable.today_classes().into_iter().map(|c| c.subject).collect();
        assert_eq!(monday, vec!["Maths".to_string()]);

        h.clock.set(at("2026-10-18", 10));
        let sunday: Vec<_> = timetable.today_classes().into_iter().map(|c| c.subject).collect();
        assert_eq!(sunday, vec!["Chess".to_string()]);
    }

    #[tokio::test]
    async fn classes_are_sorted_by_start_time() {
        let h = Harness::signed_in("u1");
        let timetable = TimetableSync::new(h.ctx.clone());
        let _mount = timetable.mount();
        for (time, subject) in [("14:00", "c"), ("08:30", "a"), ("11:15", "b")] {
            timetable.add(class(2, time, subject)).await.unwrap();
        }
        let order: Vec<_> = timetable.classes_on(2).into_iter().map(|c| c.time).collect();
        assert_eq!(order, vec!["08:30", "11:15", "14:00"]);
    }

    #[tokio::test]
    async fn out_of_range_day_is_invalid() {
        let h = Harness::signed_in("u1");
        let timetable = TimetableSync::new(h.ctx.clone());
        let err = timetable.add(class(7, "09:00", "x")).await.unwrap_err();
        assert!(matches!(err, SyncError::Invalid { .. }));
    }
}
