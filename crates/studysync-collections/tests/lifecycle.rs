//! Subscription lifecycle across identity changes

use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use studysync_collections::{DailyStatsSync, ManualClock, SyncContext, SyncState, TaskSync};
use studysync_model::{NewTask, Task, DAILY_STATS_COLLECTION};
use studysync_session::{Counters, Identity, LocalKeys, MemoryLocalStore, SessionScope, Severity, SignalBus};
use studysync_store::{
    CollectionPath, DocumentStore, Entity, ErrorKind, MemoryStore, RawDocument, StoreError, UserId,
};
use studysync_test_utils::{at, init_tracing, HeldStore, LeakyStore, RecordingNotifier};

fn context(store: Arc<dyn DocumentStore>, scope: &SessionScope, notifier: Arc<RecordingNotifier>) -> SyncContext {
    SyncContext::new(
        store,
        scope.clone(),
        notifier,
        SignalBus::default(),
        Counters::new(Arc::new(MemoryLocalStore::new()), LocalKeys::default()),
        Arc::new(ManualClock::at(at("2026-10-19", 9))),
    )
}

async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

fn raw_task(id: &str, title: &str) -> RawDocument {
    let data = json!({ "title": title, "completed": false, "priority": "medium" });
    RawDocument::new(id, data.as_object().cloned().unwrap())
}

#[tokio::test]
async fn late_frame_of_previous_identity_is_dropped() {
    init_tracing();
    let store = LeakyStore::new();
    let scope = SessionScope::new();
    let tasks = TaskSync::new(context(store.clone(), &scope, RecordingNotifier::new()));
    let _mount = tasks.mount();

    scope.bind(Identity::new("alice"));
    settle().await;
    tasks.add(NewTask::titled("alice's task")).await.unwrap();
    assert_eq!(tasks.tasks().len(), 1);

    scope.bind(Identity::new("bob"));
    settle().await;
    assert_eq!(tasks.state(), SyncState::Live);
    assert!(tasks.tasks().is_empty());

    let alice_tasks = CollectionPath::new(UserId::new("alice"), Task::COLLECTION);
    store.replay_collection(&alice_tasks, vec![raw_task("task_late", "leaked")]);
    assert!(tasks.tasks().is_empty());
}

#[tokio::test]
async fn data_of_one_user_never_reaches_another() {
    let store = Arc::new(MemoryStore::new());
    let scope = SessionScope::new();
    let tasks = TaskSync::new(context(store.clone(), &scope, RecordingNotifier::new()));
    let _mount = tasks.mount();

    scope.bind(Identity::new("alice"));
    settle().await;
    tasks.add(NewTask::titled("private")).await.unwrap();

    scope.bind(Identity::new("bob"));
    settle().await;
    assert!(tasks.tasks().is_empty());
    tasks.add(NewTask::titled("bob's")).await.unwrap();
    let titles: Vec<_> = tasks.tasks().iter().map(|t| t.title.clone()).collect();
    assert_eq!(titles, vec!["bob's".to_string()]);

    scope.clear();
    settle().await;
    assert_eq!(tasks.state(), SyncState::Unbound);
    assert!(tasks.tasks().is_empty());
}

#[tokio::test]
async fn subscription_error_notifies_once_and_freezes_cache() {
    let store = Arc::new(MemoryStore::new());
    let scope = SessionScope::new();
    let notifier = RecordingNotifier::new();
    scope.bind(Identity::new("alice"));
    let tasks = TaskSync::new(context(store.clone(), &scope, notifier.clone()));
    let _mount = tasks.mount();
    tasks.add(NewTask::titled("kept")).await.unwrap();

    let path = CollectionPath::new(UserId::new("alice"), Task::COLLECTION);
    let outage = StoreError::new(ErrorKind::Unavailable, "backend unreachable");
    store.broadcast_error(&path, &outage);
    store.broadcast_error(&path, &outage);

    assert_eq!(tasks.state(), SyncState::Errored);
    assert_eq!(tasks.tasks().len(), 1);
    assert_eq!(
        notifier.errors(),
        vec!["Failed to load tasks. Please check your connection.".to_string()]
    );

    tasks.add(NewTask::titled("after recovery")).await.unwrap();
    assert_eq!(tasks.state(), SyncState::Live);
    assert_eq!(tasks.tasks().len(), 2);
    assert_eq!(notifier.count(Severity::Error), 1);
}

#[tokio::test]
async fn unprovisioned_user_sees_an_empty_live_cache() {
    let store = Arc::new(MemoryStore::new());
    store.deny(&UserId::new("new-user"));
    let scope = SessionScope::new();
    let notifier = RecordingNotifier::new();
    scope.bind(Identity::new("new-user"));
    let tasks = TaskSync::new(context(store.clone(), &scope, notifier.clone()));
    let _mount = tasks.mount();

    assert_eq!(tasks.state(), SyncState::Live);
    assert!(tasks.tasks().is_empty());
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn unmount_releases_listeners() {
    let store = Arc::new(MemoryStore::new());
    let scope = SessionScope::new();
    scope.bind(Identity::new("alice"));
    let tasks = TaskSync::new(context(store.clone(), &scope, RecordingNotifier::new()));

    let mount = tasks.mount();
    assert_eq!(store.listener_count(), 1);
    mount.unmount();
    assert_eq!(store.listener_count(), 0);
    assert_eq!(tasks.state(), SyncState::Unbound);
}

#[tokio::test]
async fn mutations_without_identity_are_rejected_once() {
    let store = Arc::new(MemoryStore::new());
    let scope = SessionScope::new();
    let notifier = RecordingNotifier::new();
    let tasks = TaskSync::new(context(store.clone(), &scope, notifier.clone()));

    assert!(tasks.add(NewTask::titled("x")).await.is_err());
    assert!(tasks.delete("task_1").await.is_err());
    assert_eq!(notifier.count(Severity::Error), 2);
    assert_eq!(store.committed_writes(), 0);
}

#[tokio::test]
async fn counters_written_before_the_first_snapshot_build_on_stored_values() {
    let store = HeldStore::new();
    let scope = SessionScope::new();
    let notifier = RecordingNotifier::new();
    let daily = DailyStatsSync::new(context(store.clone(), &scope, notifier.clone()));
    let today = CollectionPath::new(UserId::new("alice"), DAILY_STATS_COLLECTION).doc("2026-10-19");
    let stored = json!({ "date": "2026-10-19", "studyMinutes": 90, "focusSessions": 2 });
    store
        .inner()
        .set_merge(&today, stored.as_object().cloned().unwrap())
        .await
        .unwrap();

    let _mount = daily.mount();
    scope.bind(Identity::new("alice"));
    settle().await;
    assert_eq!(daily.state(), SyncState::Binding);

    assert_eq!(daily.add_study_time(10).await.unwrap().study_minutes, 100);
    assert_eq!(daily.increment_focus_session().await.unwrap().focus_sessions, 3);
    let body = store.inner().peek(&today).unwrap();
    assert_eq!(body.get("studyMinutes"), Some(&json!(100)));
    assert_eq!(body.get("focusSessions"), Some(&json!(3)));

    store.release();
    assert_eq!(daily.state(), SyncState::Live);
    assert_eq!(daily.stats().study_minutes, 100);
    assert!(notifier.errors().is_empty());
}
