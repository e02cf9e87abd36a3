//! Grade synchronizer and grading preference

use crate::binding::SyncState;
use crate::context::SyncContext;
use crate::mount::MountHandle;
use crate::synchronizer::{DocumentSync, Noun, Synchronizer};
use std::sync::Arc;
use studysync_model::{
    Grade, GradePatch, GradingPreferences, GradingSystem, NewGrade, PREFERENCES_ID,
    SETTINGS_COLLECTION,
};
use studysync_stats::{grade_stats, GradeStats};
use studysync_store::SyncError;

/// Mirror of the `grades` collection plus `settings/preferences`
#[derive(Debug, Clone)]
pub struct GradeSync {
    core: Synchronizer<Grade>,
    preferences: DocumentSync<GradingPreferences>,
}

impl GradeSync {
    /// Unbound grade synchronizer
    pub fn new(ctx: SyncContext) -> Self {
        let preferences = DocumentSync::new(
            ctx.clone(),
            SETTINGS_COLLECTION,
            PREFERENCES_ID,
            "grading preferences",
        );
        Self {
            core: Synchronizer::new(ctx, Noun::new("grade", "grades")),
            preferences,
        }
    }

    /// Generic synchronizer underneath
    #[must_use]
    pub fn core(&self) -> &Synchronizer<Grade> {
        &self.core
    }

    /// Cached grades
    #[must_use]
    pub fn grades(&self) -> Arc<Vec<Grade>> {
        self.core.entities()
    }

    /// Lifecycle state of the grade cache
    #[must_use]
    pub fn state(&self) -> SyncState {
        self.core.state()
    }

    /// Follow the session scope with both subscriptions
    pub fn mount(&self) -> MountHandle {
        MountHandle::group(vec![self.core.mount(), self.preferences.mount()])
    }

    /// Record a grade
    ///
    /// # Errors
    /// See [`Synchronizer::insert_with`].
    pub async fn add(&self, draft: NewGrade) -> Result<String, SyncError> {
        self.core.insert_with(|id| draft.into_grade(id)).await
    }

    /// Partial update
    ///
    /// # Errors
    /// See [`Synchronizer::update_fields`].
    pub async fn update(&self, id: &str, patch: &GradePatch) -> Result<(), SyncError> {
        self.core.update_fields(id, patch).await
    }

    /// Delete
    ///
    /// # Errors
    /// See [`Synchronizer::remove`].
    pub async fn delete(&self, id: &str) -> Result<(), SyncError> {
        self.core.remove(id).await
    }

    /// Cached grades of one subject
    #[must_use]
    pub fn subject_grades(&self, subject_id: &str) -> Vec<Grade> {
        self.grades()
            .iter()
            .filter(|g| g.subject_id == subject_id)
            .cloned()
            .collect()
    }

    /// Statistics over the cached grades
    #[must_use]
    pub fn grade_stats(&self) -> GradeStats {
        grade_stats(&self.grades())
    }

    /// Selected grading system; the default until one is stored
    #[must_use]
    pub fn grading_system(&self) -> GradingSystem {
        self.preferences
            .value()
            .and_then(|p| p.grading_system)
            .unwrap_or_default()
    }

    /// Persist the grading system
    ///
    /// # Errors
    /// `Unauthenticated` or the store error of the write.
    pub async fn set_grading_system(&self, system: GradingSystem) -> Result<(), SyncError> {
        let body = GradingPreferences {
            grading_system: Some(system),
        };
        self.preferences
            .merge("save grading preference", &body)
            .await?;
        tracing::info!(?system, "grading system changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use studysync_stats::Trend;

    fn draft(subject: &str, score: f64, max_score: f64, weight: f64) -> NewGrade {
        NewGrade {
            subject_id: subject.into(),
            subject_name: subject.to_uppercase(),
            title: "quiz".into(),
            score,
            max_score,
            weight,
            date: "2026-10-01".into(),
            kind: None,
        }
    }

    #[tokio::test]
    async fn stats_follow_the_cache() {
        let h = Harness::signed_in("u1");
        let grades = GradeSync::new(h.ctx.clone());
        let _mount = grades.mount();

        grades.add(draft("math", 80.0, 100.0, 1.0)).await.unwrap();
        grades.add(draft("math", 90.0, 100.0, 3.0)).await.unwrap();
        grades.add(draft("art", 5.0, 0.0, 1.0)).await.unwrap();

        let stats = grades.grade_stats();
        let math = stats
            .subject_grades
            .iter()
            .find(|s| s.subject_id == "math")
            .unwrap();
        assert!((math.average - 87.5).abs() < 1e-9);
        assert_eq!(stats.trend, Trend::Stable);
        assert_eq!(grades.subject_grades("math").len(), 2);
    }

    #[tokio::test]
    async fn grading_system_defaults_then_persists() {
        let h = Harness::signed_in("u1");
        let grades = GradeSync::new(h.ctx.clone());
        let _mount = grades.mount();
        assert_eq!(grades.grading_system(), GradingSystem::College);

        grades.set_grading_system(GradingSystem::School).await.unwrap();
        assert_eq!(grades.grading_system(), GradingSystem::School);
    }

    #[tokio::test]
    async fn negative_weight_update_keeps_the_grade() {
        let h = Harness::signed_in("u1");
        let grades = GradeSync::new(h.ctx.clone());
        let _mount = grades.mount();
        let id = grades.add(draft("math", 80.0, 100.0, 1.0)).await.unwrap();
        let writes = h.store.committed_writes();

        let patch = GradePatch {
            weight: Some(-1.0),
            ..GradePatch::default()
        };
        let err = grades.update(&id, &patch).await.unwrap_err();
        assert!(matches!(err, SyncError::Invalid { id: ref bad, .. } if *bad == id));
        assert_eq!(h.store.committed_writes(), writes);
        assert_eq!(h.notifier.errors().len(), 1);
        assert_eq!(grades.grades().len(), 1);
        assert!((grades.grades()[0].weight - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn non_finite_scores_are_rejected() {
        let h = Harness::signed_in("u1");
        let grades = GradeSync::new(h.ctx.clone());
        let err = grades
            .add(draft("math", f64::NAN, 100.0, 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Invalid { .. }));
        assert_eq!(h.store.committed_writes(), 0);
    }
}
