//! In-memory [`DocumentStore`] backend
//!
//! Holds every user's collections in process and fans snapshots out to
//! listeners synchronously after each committed write. Listeners are invoked
//! with the state lock released, so a listener may call back into the store.
//!
//! Besides serving as a local emulator, the store can simulate two backend
//! conditions: users whose data path is not provisioned yet (every access is
//! `PermissionDenied`) and one-shot transport failures.

use crate::document::{merge_into, overwrite_fields, Document, Query, RawDocument};
use crate::error::StoreError;
use crate::path::{CollectionPath, DocumentPath, UserId};
use crate::remote::{CollectionListener, DocumentListener, DocumentStore, Subscription};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::{Arc, Weak};

struct CollectionWatch {
    id: u64,
    path: CollectionPath,
    listener: CollectionListener,
}

struct DocumentWatch {
    id: u64,
    path: DocumentPath,
    listener: DocumentListener,
}

#[derive(Default)]
struct MemoryState {
    collections: HashMap<CollectionPath, BTreeMap<String, Document>>,
    collection_watches: Vec<CollectionWatch>,
    document_watches: Vec<DocumentWatch>,
    next_watch: u64,
    denied: HashSet<UserId>,
    faults: VecDeque<StoreError>,
    committed_writes: u64,
}

impl MemoryState {
    fn admit(&mut self, user: &UserId) -> Result<(), StoreError> {
        if let Some(fault) = self.faults.pop_front() {
            return Err(fault);
        }
        if self.denied.contains(user) {
            return Err(StoreError::permission_denied(format!(
                "users/{user} is not readable by the current credential"
            )));
        }
        Ok(())
    }

    fn snapshot(&self, path: &CollectionPath) -> Vec<RawDocument> {
        self.collections
            .get(path)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| RawDocument::new(id.clone(), data.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn document(&self, path: &DocumentPath) -> Option<RawDocument> {
        self.collections
            .get(path.parent())
            .and_then(|docs| docs.get(path.id()))
            .map(|data| RawDocument::new(path.id(), data.clone()))
    }

    /// Collect the snapshots owed to listeners after `path` changed
    fn pending_for(&self, path: &DocumentPath) -> Vec<Delivery> {
        let mut out = Vec::new();

        let collection_listeners: Vec<_> = self
            .collection_watches
            .iter()
            .filter(|w| &w.path == path.parent())
            .map(|w| w.listener.clone())
            .collect();
        if !collection_listeners.is_empty() {
            let snapshot = self.snapshot(path.parent());
            for listener in collection_listeners {
                out.push(Delivery::Collection(listener, Ok(snapshot.clone())));
            }
        }

        let document = self.document(path);
        for watch in self.document_watches.iter().filter(|w| &w.path == path) {
            out.push(Delivery::Document(watch.listener.clone(), Ok(document.clone())));
        }

        out
    }
}

enum Delivery {
    Collection(CollectionListener, Result<Vec<RawDocument>, StoreError>),
    Document(DocumentListener, Result<Option<RawDocument>, StoreError>),
}

fn deliver(pending: Vec<Delivery>) {
    for delivery in pending {
        match delivery {
            Delivery::Collection(listener, payload) => listener(payload),
            Delivery::Document(listener, payload) => listener(payload),
        }
    }
}

/// In-process document store
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat every access to `user`'s data as `PermissionDenied`
    pub fn deny(&self, user: &UserId) {
        self.state.lock().denied.insert(user.clone());
    }

    /// Lift a previous [`deny`](Self::deny)
    pub fn allow(&self, user: &UserId) {
        self.state.lock().denied.remove(user);
    }

    /// Fail the next read or write with `err`
    pub fn fail_next(&self, err: StoreError) {
        self.state.lock().faults.push_back(err);
    }

    /// Push `err` to every listener of `path` (collection and documents in it)
    pub fn broadcast_error(&self, path: &CollectionPath, err: &StoreError) {
        let pending: Vec<Delivery> = {
            let state = self.state.lock();
            let collections = state
                .collection_watches
                .iter()
                .filter(|w| &w.path == path)
                .map(|w| Delivery::Collection(w.listener.clone(), Err(err.clone())));
            let documents = state
                .document_watches
                .iter()
                .filter(|w| w.path.parent() == path)
                .map(|w| Delivery::Document(w.listener.clone(), Err(err.clone())));
            collections.chain(documents).collect()
        };
        deliver(pending);
    }

    /// Number of attached listeners (collection + document)
    #[must_use]
    pub fn listener_count(&self) -> usize {
        let state = self.state.lock();
        state.collection_watches.len() + state.document_watches.len()
    }

    /// Number of successful writes since creation
    #[must_use]
    pub fn committed_writes(&self) -> u64 {
        self.state.lock().committed_writes
    }

    /// Inspect a stored document without access checks
    #[must_use]
    pub fn peek(&self, path: &DocumentPath) -> Option<Document> {
        self.state.lock().document(path).map(|d| d.data)
    }

    fn commit<F>(&self, path: &DocumentPath, op: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, Document>) -> Result<(), StoreError>,
    {
        let pending = {
            let mut state = self.state.lock();
            state.admit(path.parent().user())?;
            let docs = state.collections.entry(path.parent().clone()).or_default();
            op(docs)?;
            state.committed_writes += 1;
            state.pending_for(path)
        };
        deliver(pending);
        Ok(())
    }

    fn detach_handle(&self, id: u64) -> Subscription {
        let weak: Weak<Mutex<MemoryState>> = Arc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = weak.upgrade() {
                let mut state = state.lock();
                state.collection_watches.retain(|w| w.id != id);
                state.document_watches.retain(|w| w.id != id);
            }
        })
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryStore")
            .field("collections", &state.collections.len())
            .field("collection_watches", &state.collection_watches.len())
            .field("document_watches", &state.document_watches.len())
            .field("committed_writes", &state.committed_writes)
            .finish()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let mut state = self.state.lock();
        state.admit(path.parent().user())?;
        Ok(state.document(path).map(|d| d.data))
    }

    async fn query(
        &self,
        path: &CollectionPath,
        query: &Query,
    ) -> Result<Vec<RawDocument>, StoreError> {
        let mut state = self.state.lock();
        state.admit(path.user())?;
        Ok(query.apply(state.snapshot(path)))
    }

    async fn set_merge(&self, path: &DocumentPath, data: Document) -> Result<(), StoreError> {
        self.commit(path, |docs| {
            merge_into(docs.entry(path.id().to_string()).or_default(), data);
            Ok(())
        })
    }

    async fn update(&self, path: &DocumentPath, data: Document) -> Result<(), StoreError> {
        self.commit(path, |docs| match docs.get_mut(path.id()) {
            Some(existing) => {
                overwrite_fields(existing, data);
                Ok(())
            }
            None => Err(StoreError::not_found(path.to_string())),
        })
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        self.commit(path, |docs| {
            docs.remove(path.id());
            Ok(())
        })
    }

    fn listen_collection(&self, path: &CollectionPath, listener: CollectionListener) -> Subscription {
        let (initial, id) = {
            let mut state = self.state.lock();
            if state.denied.contains(path.user()) {
                drop(state);
                listener(Err(StoreError::permission_denied(path.to_string())));
                return Subscription::detached();
            }
            state.next_watch += 1;
            let id = state.next_watch;
            state.collection_watches.push(CollectionWatch {
                id,
                path: path.clone(),
                listener: listener.clone(),
            });
            (state.snapshot(path), id)
        };

        listener(Ok(initial));
        self.detach_handle(id)
    }

    fn listen_document(&self, path: &DocumentPath, listener: DocumentListener) -> Subscription {
        let (initial, id) = {
            let mut state = self.state.lock();
            if state.denied.contains(path.parent().user()) {
                drop(state);
                listener(Err(StoreError::permission_denied(path.to_string())));
                return Subscription::detached();
            }
            state.next_watch += 1;
            let id = state.next_watch;
            state.document_watches.push(DocumentWatch {
                id,
                path: path.clone(),
                listener: listener.clone(),
            });
            (state.document(path), id)
        };

        listener(Ok(initial));
        self.detach_handle(id)
    }
}
