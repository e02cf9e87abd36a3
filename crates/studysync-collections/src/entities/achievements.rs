//! Achievement synchronizer
//!
//! While mounted it:
//! - seeds the default catalogue the first time a user's collection is empty
//! - re-evaluates progress whenever a [`Signal::CheckAchievements`] arrives

use crate::binding::SyncState;
use crate::context::SyncContext;
use crate::mount::MountHandle;
use crate::synchronizer::{Noun, Synchronizer};
use futures::future::join_all;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use studysync_model::{default_achievements, Achievement};
use studysync_session::{Severity, Signal, COMPLETED_TASKS, POMODORO_SESSIONS, STUDY_STREAK};
use studysync_stats::{apply_progress, claimable, evaluate, total_points, unlocked_count, ProgressInputs};
use studysync_store::{SyncError, UserId};
use tokio::sync::broadcast::error::RecvError;

/// Mirror of the `achievements` collection
#[derive(Debug, Clone)]
pub struct AchievementSync {
    core: Synchronizer<Achievement>,
    seeded: Arc<Mutex<HashSet<UserId>>>,
}

impl AchievementSync {
    /// Unbound achievement synchronizer
    pub fn new(ctx: SyncContext) -> Self {
        Self {
            core: Synchronizer::new(ctx, Noun::new("achievement", "achievements")),
            seeded: Arc::default(),
        }
    }

    /// Generic synchronizer underneath
    #[must_use]
    pub fn core(&self) -> &Synchronizer<Achievement> {
        &self.core
    }

    /// Cached achievements
    #[must_use]
    pub fn achievements(&self) -> Arc<Vec<Achievement>> {
        self.core.entities()
    }

    /// Lifecycle state
    #[must_use]
    pub fn state(&self) -> SyncState {
        self.core.state()
    }

    /// Points of claimed achievements
    #[must_use]
    pub fn total_points(&self) -> u32 {
        total_points(&self.achievements())
    }

    /// Number of unlocked achievements
    #[must_use]
    pub fn unlocked_count(&self) -> usize {
        unlocked_count(&self.achievements())
    }

    /// Follow the session scope, seed empty catalogues and answer signals
    pub fn mount(&self) -> MountHandle {
        let mut views = self.core.watch();
        let seeder = self.clone();
        let seed_task = tokio::spawn(async move {
            loop {
                let view = views.borrow_and_update().clone();
                if view.state == SyncState::Live && view.data.is_empty() {
                    seeder.seed_defaults().await;
                }
                if views.changed().await.is_err() {
                    break;
                }
            }
        });

        let mut signals = self.core.context().signals.subscribe();
        let checker = self.clone();
        let signal_task = tokio::spawn(async move {
            loop {
                match signals.recv().await {
                    Ok(Signal::CheckAchievements) => {
                        if checker.core.context().scope.current_uid().is_some() {
                            // Failures are already reported by the check.
                            let _ = checker.check_achievements().await;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "achievement signals coalesced");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        self.core.mount().with_task(seed_task).with_task(signal_task)
    }

    async fn seed_defaults(&self) {
        let ctx = self.core.context();
        let Some(uid) = ctx.scope.current_uid() else {
            return;
        };
        if !self.seeded.lock().insert(uid.clone()) {
            return;
        }
        let Ok(client) = self.core.client_for("initialize achievements") else {
            return;
        };

        tracing::info!(uid = %uid, "seeding default achievements");
        let catalogue = default_achievements();
        let result = ctx
            .guard("initialize achievements", async {
                join_all(catalogue.iter().map(|a| client.set(&a.id, a)))
                    .await
                    .into_iter()
                    .collect::<Result<Vec<()>, SyncError>>()
            })
            .await;
        if result.is_err() {
            self.seeded.lock().remove(&uid);
        }
    }

    /// Re-evaluate every cached achievement against the local counters and
    /// the clock; writes only the entries that changed
    ///
    /// Returns the number of updated achievements.
    ///
    /// # Errors
    /// `Unauthenticated` or the first store error among the writes.
    pub async fn check_achievements(&self) -> Result<usize, SyncError> {
        let ctx = self.core.context();
        let client = self.core.client_for("check achievements")?;
        let uid = client.path().user().clone();
        let inputs = ProgressInputs {
            hour: ctx.clock.hour(),
            completed_tasks: ctx.counters.get(&uid, COMPLETED_TASKS),
            study_streak: ctx.counters.get(&uid, STUDY_STREAK),
            focus_sessions: ctx.counters.get(&uid, POMODORO_SESSIONS),
        };

        let changed: Vec<(Achievement, bool)> = self
            .achievements()
            .iter()
            .filter_map(|a| evaluate(a, &inputs).map(|next| (next, !a.unlocked)))
            .collect();
        if changed.is_empty() {
            return Ok(0);
        }

        ctx.guard("update achievements", async {
            join_all(changed.iter().map(|(next, _)| client.set(&next.id, next)))
                .await
                .into_iter()
                .collect::<Result<Vec<()>, SyncError>>()
        })
        .await?;

        for (next, was_locked) in &changed {
            if *was_locked && next.unlocked {
                tracing::info!(uid = %uid, id = %next.id, "achievement unlocked");
                ctx.notifier.notify(
                    Severity::Success,
                    &format!("Achievement unlocked: {} {}", next.icon, next.name),
                );
            }
        }
        Ok(changed.len())
    }

    /// Set progress of one achievement, clamped, unlocking on completion
    ///
    /// # Errors
    /// `Unauthenticated`, `NotFound` when not cached, or the store error.
    pub async fn update_progress(&self, id: &str, progress: u32) -> Result<(), SyncError> {
        let current = self.cached("update achievement", id)?;
        let next = apply_progress(&current, progress);
        if next == current {
            return Ok(());
        }
        self.core.merge("update achievement", id, &next).await
    }

    /// Claim an unlocked achievement's points
    ///
    /// Returns `false` without writing when the achievement is locked or
    /// already claimed.
    ///
    /// # Errors
    /// `Unauthenticated`, `NotFound` when not cached, or the store error.
    pub async fn claim(&self, id: &str) -> Result<bool, SyncError> {
        let current = self.cached("claim achievement", id)?;
        if !claimable(&current) {
            tracing::debug!(id, unlocked = current.unlocked, "claim ignored");
            return Ok(false);
        }
        self.core
            .update_fields(id, &json!({ "claimed": true }))
            .await?;
        self.core.context().notifier.notify(
            Severity::Success,
            &format!(
                "Claimed {}: +{} points",
                current.name,
                current.points.unwrap_or(0)
            ),
        );
        Ok(true)
    }

    fn cached(&self, action: &str, id: &str) -> Result<Achievement, SyncError> {
        let ctx = self.core.context();
        ctx.require_user(action)?;
        self.core.find(id).ok_or_else(|| {
            ctx.notifier
                .notify(Severity::Error, &format!("Failed to {action}: it no longer exists."));
            SyncError::NotFound(id.to_string())
        })
    }
}
