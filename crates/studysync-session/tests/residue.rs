//! Residue purge and legacy migration against the in-memory store

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use studysync_session::{
    Identity, IdentityProvider, LocalKeys, LocalStore, MemoryLocalStore, SessionController,
    SessionError, SessionScope, TracingNotifier,
};
use studysync_store::{CollectionPath, DocumentStore, MemoryStore, SyncError, UserId};
use tokio::sync::watch;

struct StaticProvider(watch::Sender<Option<Identity>>);

#[async_trait]
impl IdentityProvider for StaticProvider {
    fn identity_feed(&self) -> watch::Receiver<Option<Identity>> {
        self.0.subscribe()
    }

    async fn sign_out(&self) -> Result<(), SessionError> {
        self.0.send_replace(None);
        Ok(())
    }

    async fn reauthenticate(&self, _password: &str) -> Result<(), SessionError> {
        Ok(())
    }

    async fn delete_user(&self) -> Result<(), SessionError> {
        Ok(())
    }
}

fn setup() -> (Arc<MemoryLocalStore>, SessionController) {
    let local = Arc::new(MemoryLocalStore::new());
    let (tx, _rx) = watch::channel(None);
    let ctl = SessionController::new(
        SessionScope::new(),
        Arc::new(StaticProvider(tx)),
        local.clone(),
        LocalKeys::default(),
        Arc::new(TracingNotifier),
    );
    (local, ctl)
}

#[tokio::test]
async fn sign_out_leaves_no_residue_for_next_user() {
    let (local, ctl) = setup();
    ctl.apply(Some(Identity::new("a")));
    local.set("studysync:a:completed_tasks", "9");
    local.set("pomodoroSessions", "3");
    local.set("studyStreak_a", "2");

    ctl.sign_out().await.unwrap();
    assert!(ctl.scope().current().is_none());

    ctl.apply(Some(Identity::new("b")));
    let leftovers: Vec<String> = local
        .keys()
        .into_iter()
        .filter(|k| k != "studysync:current_user")
        .collect();
    assert_eq!(leftovers, Vec::<String>::new());
}

#[tokio::test]
async fn migration_moves_blobs_and_reports_malformed_ones() {
    let (local, ctl) = setup();
    let uid = UserId::new("m");
    ctl.apply(Some(Identity::new("m")));

    local.set(
        "eduorganize-tasks",
        &json!([{"id": "t1", "title": "Read"}, {"title": "no id"}]).to_string(),
    );
    local.set("grades_m", "{not json");
    local.set(
        "dailyStats_m",
        &json!({"date": "2026-10-01", "studyMinutes": 30, "focusSessions": 1}).to_string(),
    );
    local.set("gradingSystem_m", "school");
    local.set("pomodoroSessions", "7");

    let memory = Arc::new(MemoryStore::new());
    let store: Arc<dyn DocumentStore> = memory.clone();
    let report = ctl.migrate_local_residue(&store, &uid).await.unwrap();

    assert_eq!(report.failures.len(), 1);
    assert!(matches!(&report.failures[0], SyncError::Malformed { key, .. } if key == "grades_m"));
    assert_eq!(report.documents(), 4);

    let tasks = CollectionPath::new(uid.clone(), "tasks");
    assert_eq!(memory.peek(&tasks.doc("t1")).unwrap()["title"], json!("Read"));
    let stats = CollectionPath::new(uid.clone(), "dailyStats");
    assert_eq!(memory.peek(&stats.doc("2026-10-01")).unwrap()["studyMinutes"], json!(30));
    let settings = CollectionPath::new(uid.clone(), "settings");
    assert_eq!(
        memory.peek(&settings.doc("preferences")).unwrap()["gradingSystem"],
        json!("school")
    );
    let pomodoro = CollectionPath::new(uid.clone(), "pomodoro");
    assert_eq!(memory.peek(&pomodoro.doc("settings")).unwrap()["sessions"], json!(7));

    let again = ctl.migrate_local_residue(&store, &uid).await.unwrap();
    assert!(again.skipped);
}

#[tokio::test]
async fn migration_requires_the_bound_user() {
    let (_local, ctl) = setup();
    ctl.apply(Some(Identity::new("a")));
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let err = ctl
        .migrate_local_residue(&store, &UserId::new("b"))
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::NotSignedIn);
}
