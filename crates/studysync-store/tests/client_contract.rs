//! Contract tests for the typed sync client over the in-memory backend.
//!
//! These cover the read/write semantics every synchronizer relies on:
//! merge upserts, strict updates, idempotent deletes, user scoping, and the
//! soft-fail policy for access-denied reads.

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use studysync_store::{
    CollectionPath, Direction, Entity, MemoryStore, Query, Record, StoreError, SyncClient,
    SyncError, UserId,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Card {
    id: String,
    #[serde(default)]
    a: Option<i64>,
    #[serde(default)]
    b: Option<i64>,
}

impl Record for Card {}

impl Entity for Card {
    const COLLECTION: &'static str = "cards";
    const ID_PREFIX: &'static str = "card";

    fn id(&self) -> &str {
        &self.id
    }
}

fn client(store: &Arc<MemoryStore>, uid: &str) -> SyncClient<Card> {
    SyncClient::scoped(store.clone(), UserId::new(uid))
}

#[tokio::test]
async fn set_twice_merges_fields() {
    let store = Arc::new(MemoryStore::new());
    let cards = client(&store, "alice");

    cards.set("c1", &json!({"a": 1})).await.unwrap();
    cards.set("c1", &json!({"b": 2})).await.unwrap();

    let card = cards.get("c1").await.unwrap().unwrap();
    assert_eq!(
        card,
        Card {
            id: "c1".into(),
            a: Some(1),
            b: Some(2)
        }
    );
}

#[tokio::test]
async fn update_on_missing_document_is_not_found_but_set_succeeds() {
    let store = Arc::new(MemoryStore::new());
    let cards = client(&store, "alice");

    let err = cards.update("ghost", &json!({"a": 1})).await.unwrap_err();
    assert!(matches!(err, SyncError::NotFound(_)));

    cards.set("ghost", &json!({"a": 1})).await.unwrap();
    assert!(cards.get("ghost").await.unwrap().is_some());
}

#[tokio::test]
async fn delete_twice_is_not_an_error() {
    let store = Arc::new(MemoryStore::new());
    let cards = client(&store, "alice");
    cards.set("c1", &json!({"a": 1})).await.unwrap();

    cards.delete("c1").await.unwrap();
    cards.delete("c1").await.unwrap();
}

#[tokio::test]
async fn writes_under_one_user_are_invisible_to_another() {
    let store = Arc::new(MemoryStore::new());
    let alice = client(&store, "alice");
    let bob = client(&store, "bob");

    alice.set("c1", &json!({"a": 1})).await.unwrap();

    assert!(bob.get("c1").await.unwrap().is_none());
    assert!(bob.get_all(&Query::all()).await.unwrap().is_empty());

    let seen = Arc::new(Mutex::new(None));
    let s = seen.clone();
    let _sub = bob.subscribe_collection(move |all| *s.lock() = Some(all.len()), |_| {});
    assert_eq!(*seen.lock(), Some(0));
}

#[tokio::test]
async fn denied_reads_soft_fail() {
    let store = Arc::new(MemoryStore::new());
    let fresh = UserId::new("fresh");
    store.deny(&fresh);
    let cards = client(&store, "fresh");

    assert_eq!(cards.get("c1").await.unwrap(), None);
    assert!(cards.get_all(&Query::all()).await.unwrap().is_empty());

    let data = Arc::new(Mutex::new(Vec::new()));
    let errors = Arc::new(Mutex::new(0));
    let (d, e) = (data.clone(), errors.clone());
    let _sub = cards.subscribe_collection(
        move |all| d.lock().push(all.len()),
        move |_| *e.lock() += 1,
    );
    assert_eq!(*data.lock(), vec![0]);
    assert_eq!(*errors.lock(), 0);

    let err = cards.set("c1", &json!({"a": 1})).await.unwrap_err();
    assert!(err.is_soft_fail());
}

#[tokio::test]
async fn transient_errors_surface_to_callers() {
    let store = Arc::new(MemoryStore::new());
    let cards = client(&store, "alice");
    store.fail_next(StoreError::unavailable("offline"));

    let err = cards.get_all(&Query::all()).await.unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn subscription_errors_route_to_on_error() {
    let store = Arc::new(MemoryStore::new());
    let cards = client(&store, "alice");

    let errors = Arc::new(Mutex::new(Vec::new()));
    let e = errors.clone();
    let _sub = cards.subscribe_collection(|_| {}, move |err| e.lock().push(err));

    store.broadcast_error(
        &CollectionPath::new(UserId::new("alice"), "cards"),
        &StoreError::unavailable("stream reset"),
    );
    assert_eq!(errors.lock().len(), 1);
    assert!(errors.lock()[0].is_retryable());
}

#[tokio::test]
async fn malformed_documents_are_quarantined_from_snapshots() {
    let store = Arc::new(MemoryStore::new());
    let cards = client(&store, "alice");
    cards.set("good", &json!({"a": 1})).await.unwrap();
    cards.set("bad", &json!({"a": "not a number"})).await.unwrap();

    let all = cards.get_all(&Query::all()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, "good");

    assert!(matches!(
        cards.get("bad").await,
        Err(SyncError::Invalid { .. })
    ));
}

#[tokio::test]
async fn document_subscription_delivers_none_when_absent() {
    let store = Arc::new(MemoryStore::new());
    let cards = client(&store, "alice");

    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    let _sub = cards.subscribe_document(
        "c1",
        move |card: Option<Card>| s.lock().push(card.map(|c| c.a)),
        |_| {},
    );
    cards.set("c1", &json!({"a": 7})).await.unwrap();
    cards.delete("c1").await.unwrap();

    assert_eq!(*seen.lock(), vec![None, Some(Some(7)), None]);
}

#[tokio::test]
async fn get_all_honours_query() {
    let store = Arc::new(MemoryStore::new());
    let cards = client(&store, "alice");
    for (id, a) in [("x", 3), ("y", 1), ("z", 2)] {
        cards.set(id, &json!({"a": a, "b": 0})).await.unwrap();
    }

    let top = cards
        .get_all(&Query::all().where_eq("b", 0).order_by("a", Direction::Descending).limit(2))
        .await
        .unwrap();
    let ids: Vec<_> = top.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["x", "z"]);
}
