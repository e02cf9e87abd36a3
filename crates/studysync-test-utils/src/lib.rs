//! Testing utilities for the studysync workspace
//!
//! Shared fakes and fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use studysync_model::{Grade, NewTask};
use studysync_session::{Identity, IdentityProvider, Notifier, SessionError, Severity};
use studysync_store::{
    CollectionListener, CollectionPath, Document, DocumentListener, DocumentPath, DocumentStore,
    MemoryStore, Query, RawDocument, StoreError, Subscription,
};
use tokio::sync::watch;

/// Route `tracing` output through the test harness; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Local date-time from `YYYY-MM-DD` and an hour
pub fn at(date: &str, hour: u32) -> NaiveDateTime {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

/// Notifier remembering every message
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(Severity, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<(Severity, String)> {
        self.messages.lock().clone()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.messages
            .lock()
            .iter()
            .filter(|(s, _)| *s == severity)
            .count()
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|(s, _)| *s == Severity::Error)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages.lock().iter().any(|(_, m)| m.contains(needle))
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        self.messages.lock().push((severity, message.to_string()));
    }
}

/// Store whose listeners outlive their subscriptions
///
/// Every listener ever registered is retained, so a test can deliver a late
/// frame to a subscription that was already torn down, as a real backend may
/// do while an unsubscribe is in flight.
#[derive(Default)]
pub struct LeakyStore {
    inner: MemoryStore,
    collection_listeners: Mutex<Vec<(CollectionPath, CollectionListener)>>,
    document_listeners: Mutex<Vec<(DocumentPath, DocumentListener)>>,
}

impl LeakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Deliver `docs` to every listener ever attached to `path`
    pub fn replay_collection(&self, path: &CollectionPath, docs: Vec<RawDocument>) {
        let listeners: Vec<_> = self
            .collection_listeners
            .lock()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(Ok(docs.clone()));
        }
    }

    /// Deliver `doc` to every listener ever attached to `path`
    pub fn replay_document(&self, path: &DocumentPath, doc: Option<RawDocument>) {
        let listeners: Vec<_> = self
            .document_listeners
            .lock()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(Ok(doc.clone()));
        }
    }
}

#[async_trait]
impl DocumentStore for LeakyStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        self.inner.get(path).await
    }

    async fn query(&self, path: &CollectionPath, query: &Query) -> Result<Vec<RawDocument>, StoreError> {
        self.inner.query(path, query).await
    }

    async fn set_merge(&self, path: &DocumentPath, data: Document) -> Result<(), StoreError> {
        self.inner.set_merge(path, data).await
    }

    async fn update(&self, path: &DocumentPath, data: Document) -> Result<(), StoreError> {
        self.inner.update(path, data).await
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        self.inner.delete(path).await
    }

    fn listen_collection(&self, path: &CollectionPath, listener: CollectionListener) -> Subscription {
        self.collection_listeners
            .lock()
            .push((path.clone(), listener.clone()));
        self.inner.listen_collection(path, listener)
    }

    fn listen_document(&self, path: &DocumentPath, listener: DocumentListener) -> Subscription {
        self.document_listeners
            .lock()
            .push((path.clone(), listener.clone()));
        self.inner.listen_document(path, listener)
    }
}

enum Held {
    Collection(CollectionPath, CollectionListener),
    Document(DocumentPath, DocumentListener),
}

/// Store that attaches listeners only on [`HeldStore::release`]
///
/// Until then a subscription stays in `Binding`, as with a backend whose
/// first snapshot has not arrived yet. Reads and writes go straight through.
#[derive(Default)]
pub struct HeldStore {
    inner: MemoryStore,
    held: Mutex<Vec<Held>>,
    attached: Mutex<Vec<Subscription>>,
}

impl HeldStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Attach every held listener; each gets its initial snapshot now
    pub fn release(&self) {
        let held: Vec<Held> = self.held.lock().drain(..).collect();
        for entry in held {
            let subscription = match entry {
                Held::Collection(path, listener) => self.inner.listen_collection(&path, listener),
                Held::Document(path, listener) => self.inner.listen_document(&path, listener),
            };
            self.attached.lock().push(subscription);
        }
    }
}

#[async_trait]
impl DocumentStore for HeldStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        self.inner.get(path).await
    }

    async fn query(&self, path: &CollectionPath, query: &Query) -> Result<Vec<RawDocument>, StoreError> {
        self.inner.query(path, query).await
    }

    async fn set_merge(&self, path: &DocumentPath, data: Document) -> Result<(), StoreError> {
        self.inner.set_merge(path, data).await
    }

    async fn update(&self, path: &DocumentPath, data: Document) -> Result<(), StoreError> {
        self.inner.update(path, data).await
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        self.inner.delete(path).await
    }

    fn listen_collection(&self, path: &CollectionPath, listener: CollectionListener) -> Subscription {
        self.held.lock().push(Held::Collection(path.clone(), listener));
        Subscription::detached()
    }

    fn listen_document(&self, path: &DocumentPath, listener: DocumentListener) -> Subscription {
        self.held.lock().push(Held::Document(path.clone(), listener));
        Subscription::detached()
    }
}

/// Identity provider driven by the test
#[derive(Debug)]
pub struct ScriptedIdentityProvider {
    feed: watch::Sender<Option<Identity>>,
    passwords: Mutex<HashMap<String, String>>,
    deleted: Mutex<Vec<String>>,
    sign_outs: AtomicUsize,
}

impl Default for ScriptedIdentityProvider {
    fn default() -> Self {
        let (feed, _rx) = watch::channel(None);
        Self {
            feed,
            passwords: Mutex::new(HashMap::new()),
            deleted: Mutex::new(Vec::new()),
            sign_outs: AtomicUsize::new(0),
        }
    }
}

impl ScriptedIdentityProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register an account's password
    pub fn with_account(self: Arc<Self>, uid: &str, password: &str) -> Arc<Self> {
        self.passwords
            .lock()
            .insert(uid.to_string(), password.to_string());
        self
    }

    /// Publish a signed-in identity on the feed
    pub fn sign_in(&self, uid: &str) {
        self.feed.send_replace(Some(Identity::new(uid)));
    }

    /// Publish a signed-out state on the feed
    pub fn expire(&self) {
        self.feed.send_replace(None);
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().clone()
    }

    fn current_uid(&self) -> Option<String> {
        self.feed
            .borrow()
            .as_ref()
            .map(|identity| identity.uid.as_str().to_string())
    }
}

#[async_trait]
impl IdentityProvider for ScriptedIdentityProvider {
    fn identity_feed(&self) -> watch::Receiver<Option<Identity>> {
        self.feed.subscribe()
    }

    async fn sign_out(&self) -> Result<(), SessionError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        self.feed.send_replace(None);
        Ok(())
    }

    async fn reauthenticate(&self, password: &str) -> Result<(), SessionError> {
        let uid = self.current_uid().ok_or(SessionError::NotSignedIn)?;
        match self.passwords.lock().get(&uid) {
            Some(expected) if expected == password => Ok(()),
            _ => Err(SessionError::Reauthentication("wrong-password".into())),
        }
    }

    async fn delete_user(&self) -> Result<(), SessionError> {
        let uid = self.current_uid().ok_or(SessionError::NotSignedIn)?;
        self.deleted.lock().push(uid);
        self.feed.send_replace(None);
        Ok(())
    }
}

/// Grade for `subject` scoring `score` out of 100
pub fn grade(id: &str, subject: &str, score: f64, weight: f64, date: &str) -> Grade {
    Grade {
        id: id.to_string(),
        subject_id: subject.to_string(),
        subject_name: subject.to_uppercase(),
        title: format!("assessment {id}"),
        score,
        max_score: 100.0,
        weight,
        date: date.to_string(),
        kind: None,
    }
}

/// Task draft with a title and nothing else
pub fn new_task(title: &str) -> NewTask {
    NewTask::titled(title)
}

/// Fields of a stored document as JSON
pub fn json_of(doc: Option<Document>) -> serde_json::Value {
    doc.map_or(serde_json::Value::Null, serde_json::Value::Object)
}
