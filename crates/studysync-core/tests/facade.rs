//! End-to-end behavior of the wired facade

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use studysync_collections::{ManualClock, SyncState};
use studysync_core::{ConfigError, LocalIdentityProvider, StudySync, SyncConfig};
use studysync_model::{default_achievements, NewTask, PomodoroDurations};
use studysync_session::{LocalStore, MemoryLocalStore, SessionError, Severity, COMPLETED_TASKS};
use studysync_store::{MemoryStore, UserId};
use studysync_test_utils::{at, init_tracing, RecordingNotifier, ScriptedIdentityProvider};

struct Fixture {
    store: Arc<MemoryStore>,
    provider: Arc<ScriptedIdentityProvider>,
    local: Arc<MemoryLocalStore>,
    notifier: Arc<RecordingNotifier>,
    app: StudySync,
}

fn fixture(config: SyncConfig) -> Fixture {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let provider = ScriptedIdentityProvider::new().with_account("alice", "pw");
    let local = Arc::new(MemoryLocalStore::new());
    let notifier = RecordingNotifier::new();
    let app = StudySync::new(
        config,
        store.clone(),
        provider.clone(),
        local.clone(),
        notifier.clone(),
        Arc::new(ManualClock::at(at("2026-10-19", 10))),
    )
    .unwrap();
    Fixture {
        store,
        provider,
        local,
        notifier,
        app,
    }
}

async fn eventually(what: &str, condition: impl Fn() -> bool) {
    let reached = tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(reached.is_ok(), "timed out waiting for {what}");
}

#[tokio::test]
async fn sign_in_brings_every_synchronizer_live() {
    let f = fixture(SyncConfig::new());
    assert!(f.app.start());
    assert!(!f.app.start());
    assert_eq!(f.app.tasks().state(), SyncState::Unbound);

    f.provider.sign_in("alice");
    eventually("achievements seeded", || {
        f.app.achievements().achievements().len() == default_achievements().len()
    })
    .await;

    eventually("collections live", || {
        [f.app.tasks().state(), f.app.grades().state(), f.app.notifications().state()]
            .iter()
            .all(|s| *s == SyncState::Live)
    })
    .await;
    eventually("daily stats initialized", || {
        f.app.daily_stats().document().value().is_some()
    })
    .await;

    f.app.tasks().add(NewTask::titled("Read chapter 3")).await.unwrap();
    assert_eq!(f.app.tasks().tasks().len(), 1);
}

#[tokio::test]
async fn shutdown_unmounts_everything() {
    let f = fixture(SyncConfig::new());
    f.app.start();
    f.provider.sign_in("alice");
    eventually("tasks live", || f.app.tasks().state() == SyncState::Live).await;
    assert!(f.store.listener_count() > 0);

    assert!(f.app.shutdown());
    assert!(!f.app.shutdown());
    assert!(!f.app.is_running());
    assert_eq!(f.store.listener_count(), 0);
    assert_eq!(f.app.tasks().state(), SyncState::Unbound);
}

#[tokio::test]
async fn legacy_blobs_are_migrated_on_first_sign_in() {
    let f = fixture(SyncConfig::new());
    f.local.set(
        "eduorganize-tasks",
        r#"[{"id":"task_legacy","title":"Old notes","completed":true,"priority":"low"}]"#,
    );
    f.app.start();
    f.provider.sign_in("alice");

    eventually("legacy task visible", || {
        f.app.tasks().tasks().iter().any(|t| t.id == "task_legacy")
    })
    .await;
    assert!(f.app.controller().is_migrated(&UserId::new("alice")));
}

#[tokio::test]
async fn switching_users_drops_the_previous_cache_and_counters() {
    let f = fixture(SyncConfig::new());
    f.app.start();
    f.provider.sign_in("alice");
    eventually("tasks live", || f.app.tasks().state() == SyncState::Live).await;

    let id = f.app.tasks().add(NewTask::titled("mine")).await.unwrap();
    f.app.tasks().toggle(&id).await.unwrap();
    let alice = UserId::new("alice");
    assert_eq!(f.app.context().counters.get(&alice, COMPLETED_TASKS), 1);

    f.provider.sign_in("bob");
    eventually("bob bound", || f.app.scope().is_bound_to(&UserId::new("bob"))).await;
    eventually("empty cache", || {
        f.app.tasks().state() == SyncState::Live && f.app.tasks().tasks().is_empty()
    })
    .await;
    assert_eq!(f.app.context().counters.get(&alice, COMPLETED_TASKS), 0);
}

#[tokio::test]
async fn wrong_password_keeps_the_account() {
    let f = fixture(SyncConfig::new());
    f.app.start();
    f.provider.sign_in("alice");
    eventually("alice bound", || f.app.scope().current_uid().is_some()).await;

    let err = f.app.delete_account("nope").await.unwrap_err();
    assert!(err.needs_password());
    assert!(f.notifier.contains("Incorrect password"));
    assert!(f.provider.deleted().is_empty());
    assert!(f.app.scope().is_bound_to(&UserId::new("alice")));

    f.app.delete_account("pw").await.unwrap();
    assert_eq!(f.provider.deleted(), vec!["alice".to_string()]);
    assert!(f.app.scope().current().is_none());
}

#[tokio::test]
async fn sign_out_without_a_session_still_unbinds() {
    let f = fixture(SyncConfig::new());
    f.app.start();
    f.app.sign_out().await.unwrap();
    assert_eq!(f.provider.sign_out_calls(), 1);
    assert_eq!(f.notifier.count(Severity::Success), 1);
    assert!(f.app.scope().current().is_none());
}

#[tokio::test]
async fn config_reaches_the_synchronizers() {
    let durations = PomodoroDurations {
        work: 1500,
        short: 300,
        long: 600,
    };
    let f = fixture(SyncConfig::new().with_pomodoro(durations).with_id_suffix_len(6));
    f.app.start();
    f.provider.sign_in("alice");
    eventually("tasks live", || f.app.tasks().state() == SyncState::Live).await;

    assert_eq!(f.app.pomodoro().timer().durations(), durations);
    assert_eq!(f.app.pomodoro().timer().remaining(), 1500);
    let id = f.app.tasks().add(NewTask::titled("x")).await.unwrap();
    assert_eq!(id.rsplit('_').next().map(str::len), Some(6));
}

#[tokio::test]
async fn invalid_config_is_rejected_up_front() {
    let provider = Arc::new(LocalIdentityProvider::new());
    let result = StudySync::new(
        SyncConfig::new().with_id_suffix_len(2),
        Arc::new(MemoryStore::new()),
        provider,
        Arc::new(MemoryLocalStore::new()),
        RecordingNotifier::new(),
        Arc::new(ManualClock::at(at("2026-10-19", 10))),
    );
    assert!(matches!(result, Err(ConfigError::IdSuffixTooShort(2))));
}

#[tokio::test]
async fn local_provider_drives_the_facade() {
    let provider = Arc::new(LocalIdentityProvider::new());
    let app = StudySync::new(
        SyncConfig::new(),
        Arc::new(MemoryStore::new()),
        provider.clone(),
        Arc::new(MemoryLocalStore::new()),
        RecordingNotifier::new(),
        Arc::new(ManualClock::at(at("2026-10-19", 10))),
    )
    .unwrap();
    app.start();

    provider.sign_up("ada", "secret").unwrap();
    eventually("ada bound", || app.scope().is_bound_to(&UserId::new("ada"))).await;
    assert!(matches!(
        app.delete_account("wrong").await,
        Err(SessionError::Reauthentication(_))
    ));
    app.delete_account("secret").await.unwrap();
    assert!(provider.sign_in("ada", "secret").is_err());
}
