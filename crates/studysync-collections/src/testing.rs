//! Unit-test wiring

use crate::clock::ManualClock;
use crate::context::SyncContext;
use std::sync::Arc;
use studysync_session::{Counters, Identity, LocalKeys, MemoryLocalStore, SessionScope, SignalBus};
use studysync_store::MemoryStore;
use studysync_test_utils::{at, RecordingNotifier};

pub(crate) struct Harness {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) scope: SessionScope,
    pub(crate) notifier: Arc<RecordingNotifier>,
    pub(crate) clock: Arc<ManualClock>,
    pub(crate) ctx: SyncContext,
}

impl Harness {
    /// Unbound harness at Monday 2026-10-19 10:00
    pub(crate) fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let scope = SessionScope::new();
        let notifier = RecordingNotifier::new();
        let clock = Arc::new(ManualClock::at(at("2026-10-19", 10)));
        let counters = Counters::new(Arc::new(MemoryLocalStore::new()), LocalKeys::default());
        let ctx = SyncContext::new(
            store.clone(),
            scope.clone(),
            notifier.clone(),
            SignalBus::default(),
            counters,
            clock.clone(),
        );
        Self {
            store,
            scope,
            notifier,
            clock,
            ctx,
        }
    }

    pub(crate) fn signed_in(uid: &str) -> Self {
        let h = Self::new();
        h.scope.bind(Identity::new(uid));
        h
    }
}
