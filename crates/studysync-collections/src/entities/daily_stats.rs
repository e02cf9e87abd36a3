//! Today's study counters
//!
//! Mirrors `dailyStats/{YYYY-MM-DD}` for the local date. A background check
//! notices when the date rolls over, makes sure the new day's document exists
//! remotely and only then moves the subscription to it.

use crate::binding::SyncState;
use crate::context::SyncContext;
use crate::mount::MountHandle;
use crate::synchronizer::DocumentSync;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use studysync_model::{DailyStats, DAILY_STATS_COLLECTION};
use studysync_session::STUDY_STREAK;
use studysync_stats::{study_hours_label, study_streak};
use studysync_store::{Query, SyncClient, SyncError, UserId};

/// Default interval of the date rollover check
pub const DEFAULT_ROLLOVER_CHECK: Duration = Duration::from_secs(60);

/// Mirror of today's `dailyStats` document
#[derive(Debug, Clone)]
pub struct DailyStatsSync {
    doc: DocumentSync<DailyStats>,
    rollover_every: Duration,
    initialized: Arc<Mutex<HashSet<(UserId, String)>>>,
}

impl DailyStatsSync {
    /// Unbound mirror of the clock's current date
    pub fn new(ctx: SyncContext) -> Self {
        let today = ctx.clock.today_key();
        Self {
            doc: DocumentSync::new(ctx, DAILY_STATS_COLLECTION, today, "daily stats"),
            rollover_every: DEFAULT_ROLLOVER_CHECK,
            initialized: Arc::default(),
        }
    }

    /// Set the rollover check interval
    #[must_use]
    pub fn with_rollover_interval(mut self, every: Duration) -> Self {
        self.rollover_every = every;
        self
    }

    /// Document synchronizer underneath
    #[must_use]
    pub fn document(&self) -> &DocumentSync<DailyStats> {
        &self.doc
    }

    /// Lifecycle state
    #[must_use]
    pub fn state(&self) -> SyncState {
        self.doc.state()
    }

    /// Counters of the mirrored date; zeros until the document exists
    #[must_use]
    pub fn stats(&self) -> DailyStats {
        let date = self.doc.doc_id();
        self.doc
            .value()
            .filter(|s| s.date == date)
            .unwrap_or_else(|| DailyStats::empty(date))
    }

    /// `0h`, `45m`, `2h` or `1h 30m`
    #[must_use]
    pub fn study_hours_label(&self) -> String {
        study_hours_label(self.stats().study_minutes)
    }

    /// Follow the session scope, initialize missing days and watch for rollover
    pub fn mount(&self) -> MountHandle {
        let mut views = self.doc.watch();
        let initializer = self.clone();
        let init_task = tokio::spawn(async move {
            loop {
                let view = views.borrow_and_update().clone();
                if view.state == SyncState::Live && view.data.is_none() {
                    initializer.initialize_current().await;
                }
                if views.changed().await.is_err() {
                    break;
                }
            }
        });

        let every = self.rollover_every;
        let checker = self.clone();
        let rollover_task = tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
            loop {
                ticks.tick().await;
                // Failures are already reported and retried on the next tick.
                let _ = checker.check_rollover().await;
            }
        });

        self.doc.mount().with_task(init_task).with_task(rollover_task)
    }

    async fn initialize_current(&self) {
        let ctx = self.doc.context();
        let Some(uid) = ctx.scope.current_uid() else {
            return;
        };
        let date = self.doc.doc_id();
        if !self.initialized.lock().insert((uid.clone(), date.clone())) {
            return;
        }
        tracing::debug!(uid = %uid, date, "initializing daily stats");
        if self
            .doc
            .merge("initialize daily stats", &DailyStats::empty(date.clone()))
            .await
            .is_err()
        {
            self.initialized.lock().remove(&(uid, date));
        }
    }

    /// Move to the clock's date if it changed
    ///
    /// When bound, the new day's zeroed document is written before the
    /// subscription moves, unless the document already exists. Returns
    /// whether a rollover happened.
    ///
    /// # Errors
    /// The store error of the reset; the subscription stays on the old date.
    pub async fn check_rollover(&self) -> Result<bool, SyncError> {
        let ctx = self.doc.context();
        let today = ctx.clock.today_key();
        if self.doc.doc_id() == today {
            return Ok(false);
        }

        if let Some(uid) = ctx.scope.current_uid() {
            let client = SyncClient::<DailyStats>::for_collection(ctx.store.clone(), uid.clone(), DAILY_STATS_COLLECTION);
            ctx.guard("reset daily stats", async {
                if client.get(&today).await?.is_none() {
                    client.set(&today, &DailyStats::empty(today.clone())).await?;
                }
                Ok(())
            })
            .await?;
            self.initialized.lock().insert((uid, today.clone()));
        }

        tracing::info!(from = %self.doc.doc_id(), to = %today, "daily stats rolled over");
        self.doc.retarget(today);
        Ok(true)
    }

    /// Credit study minutes to today
    ///
    /// # Errors
    /// `Unauthenticated` or the store error of the write.
    pub async fn add_study_time(&self, minutes: u32) -> Result<DailyStats, SyncError> {
        self.check_rollover().await?;
        let current = self.current("update study time").await?;
        let next = DailyStats {
            study_minutes: current.study_minutes.saturating_add(minutes),
            ..current
        };
        self.doc
            .merge(
                "update study time",
                &json!({ "date": next.date, "studyMinutes": next.study_minutes }),
            )
            .await?;
        self.refresh_streak().await;
        Ok(next)
    }

    /// Count one completed focus session today
    ///
    /// # Errors
    /// `Unauthenticated` or the store error of the write.
    pub async fn increment_focus_session(&self) -> Result<DailyStats, SyncError> {
        self.check_rollover().await?;
        let current = self.current("update focus sessions").await?;
        let next = DailyStats {
            focus_sessions: current.focus_sessions.saturating_add(1),
            ..current
        };
        self.doc
            .merge(
                "update focus sessions",
                &json!({ "date": next.date, "focusSessions": next.focus_sessions }),
            )
            .await?;
        Ok(next)
    }

    /// Counters to add to: the cache while live, else a fresh point read
    async fn current(&self, action: &str) -> Result<DailyStats, SyncError> {
        if self.state() == SyncState::Live {
            return Ok(self.stats());
        }
        let client = self.doc.client_for(action)?;
        let date = self.doc.doc_id();
        let stored = self.doc.context().guard(action, client.get(&date)).await?;
        Ok(stored.unwrap_or_else(|| DailyStats::empty(date)))
    }

    /// Recompute the study streak counter from every stored day
    async fn refresh_streak(&self) {
        let ctx = self.doc.context();
        let Some(uid) = ctx.scope.current_uid() else {
            return;
        };
        let client = SyncClient::<DailyStats>::for_collection(ctx.store.clone(), uid.clone(), DAILY_STATS_COLLECTION);
        match client.get_all(&Query::all()).await {
            Ok(days) => {
                let streak = study_streak(&days, ctx.clock.today());
                ctx.counters.set(&uid, STUDY_STREAK, streak);
                tracing::debug!(uid = %uid, streak, "study streak refreshed");
            }
            Err(e) => tracing::warn!(uid = %uid, error = %e, "study streak not refreshed"),
        }
    }
}
