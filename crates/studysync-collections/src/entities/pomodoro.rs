//! Pomodoro timer and settings synchronizer
//!
//! [`PomodoroTimer`] is a pure state machine advanced one second per
//! [`tick`](PomodoroTimer::tick). [`PomodoroSync`] owns one timer, drives it
//! while mounted and persists the `pomodoro/settings` document:
//! - durations are written immediately
//! - the session count is written after a short debounce window
//! - total focused minutes are written after a longer debounce window
//!
//! Remote snapshots update only the fields without a pending local write.

use crate::binding::SyncState;
use crate::context::SyncContext;
use crate::debounce::Debouncer;
use crate::entities::daily_stats::DailyStatsSync;
use crate::mount::MountHandle;
use crate::synchronizer::DocumentSync;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use studysync_model::{
    PomodoroDurations, PomodoroMode, PomodoroSettings, POMODORO_COLLECTION, POMODORO_SETTINGS_ID,
};
use studysync_session::{Severity, Signal, POMODORO_SESSIONS};
use studysync_store::{SyncClient, SyncError, UserId};

/// Default debounce window of the session count
pub const DEFAULT_SESSIONS_DEBOUNCE: Duration = Duration::from_millis(500);
/// Default debounce window of the total focused minutes
pub const DEFAULT_MINUTES_DEBOUNCE: Duration = Duration::from_millis(1000);
const SAVE_SETTINGS: &str = "save timer settings";

/// Every n-th completed work period is followed by a long break
pub const LONG_BREAK_EVERY: u32 = 4;

/// What a completed phase produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEnd {
    /// A work period finished
    Work {
        /// Lifetime completed work periods, this one included
        sessions: u32,
        /// Whole minutes of the finished period
        study_minutes: u32,
        /// Break that follows
        next: PomodoroMode,
    },
    /// A break finished; work is next
    Break(PomodoroMode),
}

/// Countdown state machine
#[derive(Debug, Clone, PartialEq)]
pub struct PomodoroTimer {
    durations: PomodoroDurations,
    mode: PomodoroMode,
    remaining: u32,
    running: bool,
    sessions: u32,
    total_minutes: f64,
}

impl Default for PomodoroTimer {
    fn default() -> Self {
        Self::new(PomodoroDurations::default())
    }
}

impl PomodoroTimer {
    /// Stopped timer at the start of a work period
    #[must_use]
    pub fn new(durations: PomodoroDurations) -> Self {
        let durations = durations.clamped();
        Self {
            durations,
            mode: PomodoroMode::Work,
            remaining: durations.work,
            running: false,
            sessions: 0,
            total_minutes: 0.0,
        }
    }

    /// Current phase
    #[must_use]
    pub fn mode(&self) -> PomodoroMode {
        self.mode
    }

    /// Seconds left in the phase
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Check if the countdown is running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Lifetime completed work periods
    #[must_use]
    pub fn sessions(&self) -> u32 {
        self.sessions
    }

    /// Lifetime focused minutes, fractional
    #[must_use]
    pub fn total_minutes(&self) -> f64 {
        self.total_minutes
    }

    /// Phase lengths
    #[must_use]
    pub fn durations(&self) -> PomodoroDurations {
        self.durations
    }

    /// Replace the phase lengths; a stopped timer restarts its phase
    pub fn set_durations(&mut self, durations: PomodoroDurations) {
        self.durations = durations.clamped();
        if !self.running {
            self.remaining = self.durations.of(self.mode);
        }
    }

    /// Start or pause
    pub fn toggle(&mut self) {
        self.running = !self.running;
    }

    /// Stop and restart the current phase
    pub fn reset(&mut self) {
        self.running = false;
        self.remaining = self.durations.of(self.mode);
    }

    /// Stop and move to `mode`
    pub fn switch_mode(&mut self, mode: PomodoroMode) {
        self.mode = mode;
        self.reset();
    }

    /// Advance one second
    ///
    /// Returns the finished phase when the countdown reaches zero; the timer
    /// is then stopped at the start of the next phase.
    pub fn tick(&mut self) -> Option<PhaseEnd> {
        if !self.running {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.mode == PomodoroMode::Work {
            self.total_minutes += 1.0 / 60.0;
        }
        if self.remaining > 0 {
            return None;
        }

        let end = match self.mode {
            PomodoroMode::Work => {
                self.sessions = self.sessions.saturating_add(1);
                let next = if self.sessions % LONG_BREAK_EVERY == 0 {
                    PomodoroMode::Long
                } else {
                    PomodoroMode::Short
                };
                PhaseEnd::Work {
                    sessions: self.sessions,
                    study_minutes: self.durations.work / 60,
                    next,
                }
            }
            finished => PhaseEnd::Break(finished),
        };
        self.switch_mode(match end {
            PhaseEnd::Work { next, .. } => next,
            PhaseEnd::Break(_) => PomodoroMode::Work,
        });
        Some(end)
    }

    fn adopt(&mut self, remote: &PomodoroSettings, durations: bool, sessions: bool, minutes: bool) {
        if durations {
            if let Some(d) = remote.durations {
                self.set_durations(d);
            }
        }
        if sessions {
            self.sessions = remote.sessions.unwrap_or(0);
        }
        if minutes {
            self.total_minutes = remote.total_minutes.unwrap_or(0.0);
        }
    }
}

/// Timer plus persistence of `pomodoro/settings`
#[derive(Debug, Clone)]
pub struct PomodoroSync {
    doc: DocumentSync<PomodoroSettings>,
    daily: DailyStatsSync,
    timer: Arc<Mutex<PomodoroTimer>>,
    bound: Arc<Mutex<Option<UserId>>>,
    defaults: PomodoroDurations,
    durations_in_flight: Arc<AtomicUsize>,
    sessions_debounce: Arc<Debouncer>,
    minutes_debounce: Arc<Debouncer>,
}

impl PomodoroSync {
    /// Unbound synchronizer crediting finished work periods to `daily`
    pub fn new(ctx: SyncContext, daily: DailyStatsSync, defaults: PomodoroDurations) -> Self {
        Self {
            doc: DocumentSync::new(ctx, POMODORO_COLLECTION, POMODORO_SETTINGS_ID, "timer settings"),
            daily,
            timer: Arc::new(Mutex::new(PomodoroTimer::new(defaults))),
            bound: Arc::default(),
            defaults,
            durations_in_flight: Arc::new(AtomicUsize::new(0)),
            sessions_debounce: Arc::new(Debouncer::new(DEFAULT_SESSIONS_DEBOUNCE)),
            minutes_debounce: Arc::new(Debouncer::new(DEFAULT_MINUTES_DEBOUNCE)),
        }
    }

    /// Set both debounce windows
    #[must_use]
    pub fn with_debounce(mut self, sessions: Duration, minutes: Duration) -> Self {
        self.sessions_debounce = Arc::new(Debouncer::new(sessions));
        self.minutes_debounce = Arc::new(Debouncer::new(minutes));
        self
    }

    /// Lifecycle state of the settings document
    #[must_use]
    pub fn state(&self) -> SyncState {
        self.doc.state()
    }

    /// Copy of the timer
    #[must_use]
    pub fn timer(&self) -> PomodoroTimer {
        self.timer.lock().clone()
    }

    /// Check if a debounced write is waiting
    #[must_use]
    pub fn has_pending_writes(&self) -> bool {
        self.sessions_debounce.is_pending() || self.minutes_debounce.is_pending()
    }

    /// Start or pause
    pub fn toggle(&self) {
        self.timer.lock().toggle();
    }

    /// Stop and restart the current phase
    pub fn reset(&self) {
        self.timer.lock().reset();
    }

    /// Stop and move to `mode`
    pub fn switch_mode(&self, mode: PomodoroMode) {
        self.timer.lock().switch_mode(mode);
    }

    /// Follow the session scope, adopt remote settings and tick every second
    pub fn mount(&self) -> MountHandle {
        let mut views = self.doc.watch();
        let adopter = self.clone();
        let adopt_task = tokio::spawn(async move {
            loop {
                let view = views.borrow_and_update().clone();
                adopter.on_view(view.state, (*view.data).as_ref());
                if views.changed().await.is_err() {
                    break;
                }
            }
        });

        let ticker = self.clone();
        let tick_task = tokio::spawn(async move {
            let mut seconds = tokio::time::interval(Duration::from_secs(1));
            seconds.tick().await;
            loop {
                seconds.tick().await;
                ticker.tick().await;
            }
        });

        self.doc.mount().with_task(adopt_task).with_task(tick_task)
    }

    fn on_view(&self, state: SyncState, remote: Option<&PomodoroSettings>) {
        let uid = self.doc.context().scope.current_uid();
        {
            let mut bound = self.bound.lock();
            if *bound != uid {
                self.sessions_debounce.cancel();
                self.minutes_debounce.cancel();
                *self.timer.lock() = PomodoroTimer::new(self.defaults);
                tracing::debug!(from = ?*bound, to = ?uid, "pomodoro timer reset for new identity");
                *bound = uid;
            }
        }
        if let (SyncState::Live, Some(remote)) = (state, remote) {
            let durations = self.durations_in_flight.load(Ordering::Acquire) == 0;
            let sessions = !self.sessions_debounce.is_pending();
            let minutes = !self.minutes_debounce.is_pending();
            self.timer.lock().adopt(remote, durations, sessions, minutes);
        }
    }

    /// Persist new phase lengths immediately
    ///
    /// # Errors
    /// `Unauthenticated` or the store error of the write.
    pub async fn set_durations(&self, durations: PomodoroDurations) -> Result<(), SyncError> {
        self.doc.context().require_user(SAVE_SETTINGS)?;
        let durations = durations.clamped();
        self.timer.lock().set_durations(durations);
        let body = PomodoroSettings {
            durations: Some(durations),
            ..PomodoroSettings::default()
        };
        self.durations_in_flight.fetch_add(1, Ordering::AcqRel);
        let result = self.doc.merge(SAVE_SETTINGS, &body).await;
        self.durations_in_flight.fetch_sub(1, Ordering::AcqRel);
        result
    }

    /// Advance the timer one second and react to a finished phase
    pub async fn tick(&self) -> Option<PhaseEnd> {
        let (end, was_working, snapshot) = {
            let mut timer = self.timer.lock();
            let was_working = timer.is_running() && timer.mode() == PomodoroMode::Work;
            let end = timer.tick();
            (end, was_working, timer.clone())
        };
        if was_working {
            self.persist_minutes(snapshot.total_minutes());
        }

        match end? {
            PhaseEnd::Work {
                sessions,
                study_minutes,
                next,
            } => self.finish_work(sessions, study_minutes, next).await,
            PhaseEnd::Break(_) => {
                self.doc.context().notifier.notify(
                    Severity::Success,
                    "Break over! Ready for another work session?",
                );
            }
        }
        end
    }

    async fn finish_work(&self, sessions: u32, study_minutes: u32, next: PomodoroMode) {
        let ctx = self.doc.context();
        self.persist_sessions(sessions);
        if let Some(uid) = ctx.scope.current_uid() {
            let key = ctx.counters.keys().user(&uid, POMODORO_SESSIONS);
            ctx.counters.increment_key(&key);
        }
        // Failures are reported by the daily stats synchronizer.
        let _ = self.daily.add_study_time(study_minutes).await;
        let _ = self.daily.increment_focus_session().await;
        ctx.signals.emit(Signal::CheckAchievements);

        let message = match next {
            PomodoroMode::Long => "Great work! Time for a long break!",
            _ => "Work session complete! Take a short break.",
        };
        ctx.notifier.notify(Severity::Success, message);
    }

    fn settings_client(&self) -> Option<SyncClient<PomodoroSettings>> {
        let ctx = self.doc.context();
        let uid = ctx.scope.current_uid()?;
        Some(SyncClient::for_collection(ctx.store.clone(), uid, POMODORO_COLLECTION))
    }

    fn persist_sessions(&self, sessions: u32) {
        let body = PomodoroSettings {
            sessions: Some(sessions),
            ..PomodoroSettings::default()
        };
        self.persist_later(&self.sessions_debounce, body);
    }

    fn persist_minutes(&self, total_minutes: f64) {
        let body = PomodoroSettings {
            total_minutes: Some(total_minutes),
            ..PomodoroSettings::default()
        };
        self.persist_later(&self.minutes_debounce, body);
    }

    /// Debounced merge of `body`; a failed write is reported like any mutation
    fn persist_later(&self, debouncer: &Debouncer, body: PomodoroSettings) {
        let Some(client) = self.settings_client() else {
            return;
        };
        let ctx = self.doc.context().clone();
        debouncer.schedule(async move {
            let _ = ctx
                .guard(SAVE_SETTINGS, client.set(POMODORO_SETTINGS_ID, &body))
                .await;
        });
    }
}
