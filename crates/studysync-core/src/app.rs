//! The [`StudySync`] facade
//!
//! Owns one instance of every synchronizer, all sharing a single
//! [`SyncContext`], plus the [`SessionController`] that drives their scope.

use crate::config::{ConfigError, SyncConfig};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use studysync_collections::{
    AchievementSync, Clock, DailyStatsSync, GradeSync, MountHandle, NotificationSync,
    PomodoroSync, SubjectSync, SyncContext, TaskSync, TimetableSync,
};
use studysync_session::{
    Counters, IdentityProvider, LocalKeys, LocalStore, Notifier, SessionController, SessionError,
    SessionScope, SignalBus,
};
use studysync_store::DocumentStore;
use tokio::task::JoinHandle;

/// Capacity of the cross-component signal channel
const SIGNAL_CAPACITY: usize = 16;

struct Running {
    mounts: Vec<(&'static str, MountHandle)>,
    tasks: Vec<JoinHandle<()>>,
}

/// Every synchronizer of one device, wired to one session
pub struct StudySync {
    config: SyncConfig,
    controller: Arc<SessionController>,
    ctx: SyncContext,
    tasks: TaskSync,
    subjects: SubjectSync,
    grades: GradeSync,
    timetable: TimetableSync,
    achievements: AchievementSync,
    daily_stats: DailyStatsSync,
    notifications: NotificationSync,
    pomodoro: PomodoroSync,
    running: Mutex<Option<Running>>,
}

impl fmt::Debug for StudySync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudySync")
            .field("config", &self.config)
            .field("scope", &self.ctx.scope)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl StudySync {
    /// Wire every component; nothing runs until [`start`](Self::start)
    ///
    /// # Errors
    /// The first violated [`SyncConfig`] constraint.
    pub fn new(
        config: SyncConfig,
        store: Arc<dyn DocumentStore>,
        provider: Arc<dyn IdentityProvider>,
        local: Arc<dyn LocalStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let scope = SessionScope::new();
        let keys = LocalKeys::new(config.namespace.clone());
        let controller = Arc::new(SessionController::new(
            scope.clone(),
            provider,
            local.clone(),
            keys.clone(),
            notifier.clone(),
        ));
        let ctx = SyncContext::new(
            store,
            scope,
            notifier,
            SignalBus::new(SIGNAL_CAPACITY),
            Counters::new(local, keys),
            clock,
        )
        .with_id_suffix_len(config.id_suffix_len);

        let daily_stats = DailyStatsSync::new(ctx.clone()).with_rollover_interval(config.rollover_check());
        let pomodoro = PomodoroSync::new(ctx.clone(), daily_stats.clone(), config.pomodoro)
            .with_debounce(config.sessions_debounce(), config.minutes_debounce());

        Ok(Self {
            tasks: TaskSync::new(ctx.clone()),
            subjects: SubjectSync::new(ctx.clone()),
            grades: GradeSync::new(ctx.clone()),
            timetable: TimetableSync::new(ctx.clone()),
            achievements: AchievementSync::new(ctx.clone()),
            notifications: NotificationSync::new(ctx.clone(), config.notification_cap),
            daily_stats,
            pomodoro,
            config,
            controller,
            ctx,
            running: Mutex::new(None),
        })
    }

    /// Mount every synchronizer, follow the identity feed and migrate legacy
    /// local data for each user that signs in
    ///
    /// Must be called inside a Tokio runtime. Returns `false` if already
    /// started.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock();
        if running.is_some() {
            tracing::debug!("already started");
            return false;
        }

        let mounts = vec![
            ("tasks", self.tasks.mount()),
            ("subjects", self.subjects.mount()),
            ("grades", self.grades.mount()),
            ("timetable", self.timetable.mount()),
            ("achievements", self.achievements.mount()),
            ("daily stats", self.daily_stats.mount()),
            ("notifications", self.notifications.mount()),
            ("pomodoro", self.pomodoro.mount()),
        ];
        let migration = self.spawn_migration();
        let feed = self.controller.clone().spawn();

        tracing::info!(synchronizers = mounts.len(), "studysync started");
        *running = Some(Running {
            mounts,
            tasks: vec![migration, feed],
        });
        true
    }

    fn spawn_migration(&self) -> JoinHandle<()> {
        let controller = self.controller.clone();
        let store = self.ctx.store.clone();
        let mut identities = self.ctx.scope.subscribe();
        tokio::spawn(async move {
            loop {
                let current = identities.borrow_and_update().clone();
                if let Some(identity) = current {
                    match controller.migrate_local_residue(&store, &identity.uid).await {
                        Ok(report) if report.skipped => {}
                        Ok(report) => tracing::info!(
                            uid = %identity.uid,
                            documents = report.documents(),
                            failures = report.failures.len(),
                            "legacy local data migrated"
                        ),
                        // The user changed while migrating; the next identity is handled below.
                        Err(SessionError::NotSignedIn) => {}
                        Err(e) => tracing::warn!(uid = %identity.uid, error = %e, "legacy migration aborted"),
                    }
                }
                if identities.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    /// Stop following the identity feed and unmount in reverse order
    ///
    /// Returns `false` if not running.
    pub fn shutdown(&self) -> bool {
        let Some(mut running) = self.running.lock().take() else {
            return false;
        };
        for task in running.tasks.drain(..) {
            task.abort();
        }
        while let Some((name, mount)) = running.mounts.pop() {
            mount.unmount();
            tracing::debug!(synchronizer = name, "unmounted");
        }
        tracing::info!("studysync stopped");
        true
    }

    /// Whether [`start`](Self::start) was called without a later shutdown
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Sign out through the session controller
    ///
    /// # Errors
    /// See [`SessionController::sign_out`].
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        self.controller.sign_out().await
    }

    /// Delete the signed-in account
    ///
    /// # Errors
    /// See [`SessionController::delete_account`].
    pub async fn delete_account(&self, password: &str) -> Result<(), SessionError> {
        self.controller.delete_account(password).await
    }

    /// Effective configuration
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Shared collaborators of every synchronizer
    #[must_use]
    pub fn context(&self) -> &SyncContext {
        &self.ctx
    }

    /// Bound identity
    #[must_use]
    pub fn scope(&self) -> &SessionScope {
        &self.ctx.scope
    }

    /// Session controller
    #[must_use]
    pub fn controller(&self) -> &Arc<SessionController> {
        &self.controller
    }

    /// Tasks
    #[must_use]
    pub fn tasks(&self) -> &TaskSync {
        &self.tasks
    }

    /// Subjects with their notes, topics and resources
    #[must_use]
    pub fn subjects(&self) -> &SubjectSync {
        &self.subjects
    }

    /// Grades and the grading preference
    #[must_use]
    pub fn grades(&self) -> &GradeSync {
        &self.grades
    }

    /// Weekly timetable
    #[must_use]
    pub fn timetable(&self) -> &TimetableSync {
        &self.timetable
    }

    /// Achievements
    #[must_use]
    pub fn achievements(&self) -> &AchievementSync {
        &self.achievements
    }

    /// Today's study counters
    #[must_use]
    pub fn daily_stats(&self) -> &DailyStatsSync {
        &self.daily_stats
    }

    /// In-app notifications
    #[must_use]
    pub fn notifications(&self) -> &NotificationSync {
        &self.notifications
    }

    /// Pomodoro timer and its settings
    #[must_use]
    pub fn pomodoro(&self) -> &PomodoroSync {
        &self.pomodoro
    }
}

impl Drop for StudySync {
    fn drop(&mut self) {
        self.shutdown();
    }
}
