//! Task synchronizer

use crate::binding::SyncState;
use crate::context::SyncContext;
use crate::mount::MountHandle;
use crate::synchronizer::{Noun, Synchronizer};
use std::sync::Arc;
use studysync_model::{NewTask, Task, TaskPatch};
use studysync_session::{Severity, Signal, COMPLETED_TASKS};
use studysync_store::SyncError;

/// Mirror of the `tasks` collection
#[derive(Debug, Clone)]
pub struct TaskSync {
    core: Synchronizer<Task>,
}

impl TaskSync {
    /// Unbound task synchronizer
    pub fn new(ctx: SyncContext) -> Self {
        Self {
            core: Synchronizer::new(ctx, Noun::new("task", "tasks")),
        }
    }

    /// Generic synchronizer underneath
    #[must_use]
    pub fn core(&self) -> &Synchronizer<Task> {
        &self.core
    }

    /// Cached tasks
    #[must_use]
    pub fn tasks(&self) -> Arc<Vec<Task>> {
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

    /// Create a task; `created_at` is stamped now
    ///
    /// # Errors
    /// See [`Synchronizer::insert_with`].
    pub async fn add(&self, draft: NewTask) -> Result<String, SyncError> {
        let created_at = self.core.context().clock.now().and_utc().to_rfc3339();
        self.core
            .insert_with(|id| draft.into_task(id, created_at))
            .await
    }

    /// Partial update
    ///
    /// # Errors
    /// See [`Synchronizer::update_fields`].
    pub async fn update(&self, id: &str, patch: &TaskPatch) -> Result<(), SyncError> {
        self.core.update_fields(id, patch).await
    }

    /// Delete
    ///
    /// # Errors
    /// See [`Synchronizer::remove`].
    pub async fn delete(&self, id: &str) -> Result<(), SyncError> {
        self.core.remove(id).await
    }

    /// Flip completion of a cached task
    ///
    /// After the write is acknowledged the completed-task counters are
    /// adjusted (never below zero) and an achievement check is signalled.
    /// Returns the new completion flag.
    ///
    /// # Errors
    /// `Unauthenticated`, `NotFound` for a task missing from the cache, or
    /// the store error of the write.
    pub async fn toggle(&self, id: &str) -> Result<bool, SyncError> {
        let ctx = self.core.context();
        let uid = ctx.require_user("toggle tasks")?;
        let Some(task) = self.core.find(id) else {
            ctx.notifier
                .notify(Severity::Error, "Failed to update task: it no longer exists.");
            return Err(SyncError::NotFound(id.to_string()));
        };

        let completed = !task.completed;
        let patch = TaskPatch {
            completed: Some(completed),
            ..TaskPatch::default()
        };
        self.core.update_fields(id, &patch).await?;

        let total_key = ctx.counters.keys().user(&uid, COMPLETED_TASKS);
        let daily_key = ctx.counters.keys().tasks_completed_on(&uid, &ctx.clock.today_key());
        if completed {
            ctx.counters.increment_key(&total_key);
            ctx.counters.increment_key(&daily_key);
        } else {
            ctx.counters.decrement_key(&total_key);
            ctx.counters.decrement_key(&daily_key);
        }
        tracing::debug!(uid = %uid, id, completed, "task toggled");
        ctx.signals.emit(Signal::CheckAchievements);
        Ok(completed)
    }
}
