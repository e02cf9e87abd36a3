//! Generic collection and document synchronizers
//!
//! [`Synchronizer`] mirrors one user-scoped collection, [`DocumentSync`] one
//! document. Both:
//! - re-subscribe from scratch whenever the bound identity changes
//! - replace the cache wholesale on every snapshot
//! - never splice local writes into the cache; a write is visible once the
//!   store echoes it through the subscription

use crate::binding::{Binder, CacheView, SyncState};
use crate::context::SyncContext;
use crate::mount::{follow_scope, MountHandle, Rebind};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use studysync_session::Identity;
use studysync_store::{patched, Entity, Query, Record, SyncClient, SyncError, UserId};
use tokio::sync::watch;

/// Post-processing applied to every collection snapshot
pub type Transform<E> = Arc<dyn Fn(Vec<E>) -> Vec<E> + Send + Sync>;

/// Singular and plural names used in log fields and user messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Noun {
    /// e.g. `task`
    pub one: &'static str,
    /// e.g. `tasks`
    pub many: &'static str,
}

impl Noun {
    /// Names for one and many
    #[must_use]
    pub const fn new(one: &'static str, many: &'static str) -> Self {
        Self { one, many }
    }
}

/// Mirror of one collection of the bound user
pub struct Synchronizer<E: Entity> {
    ctx: SyncContext,
    noun: Noun,
    binder: Arc<Binder<Vec<E>>>,
    transform: Option<Transform<E>>,
}

impl<E: Entity> Clone for Synchronizer<E> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            noun: self.noun,
            binder: self.binder.clone(),
            transform: self.transform.clone(),
        }
    }
}

impl<E: Entity> fmt::Debug for Synchronizer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synchronizer")
            .field("collection", &E::COLLECTION)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<E: Entity> Synchronizer<E> {
    /// Unbound synchronizer for `E::COLLECTION`
    pub fn new(ctx: SyncContext, noun: Noun) -> Self {
        let binder = Binder::new(ctx.scope.clone(), ctx.notifier.clone(), noun.many);
        Self {
            ctx,
            noun,
            binder,
            transform: None,
        }
    }

    /// Reshape every snapshot before it is cached
    #[must_use]
    pub fn with_transform(mut self, transform: impl Fn(Vec<E>) -> Vec<E> + Send + Sync + 'static) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Shared collaborators
    #[must_use]
    pub fn context(&self) -> &SyncContext {
        &self.ctx
    }

    /// Names of the entity
    #[must_use]
    pub fn noun(&self) -> Noun {
        self.noun
    }

    /// Latest cached snapshot
    #[must_use]
    pub fn entities(&self) -> Arc<Vec<E>> {
        self.binder.view().data
    }

    /// Find one cached entity
    #[must_use]
    pub fn find(&self, id: &str) -> Option<E> {
        self.entities().iter().find(|e| e.id() == id).cloned()
    }

    /// Lifecycle state
    #[must_use]
    pub fn state(&self) -> SyncState {
        self.binder.view().state
    }

    /// Change feed of the cache
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<CacheView<Vec<E>>> {
        self.binder.watch()
    }

    /// Follow the session scope until the handle is dropped
    pub fn mount(&self) -> MountHandle {
        follow_scope(&self.ctx.scope, self.clone())
    }

    /// Client for the bound user, or an `Unauthenticated` rejection of `action`
    ///
    /// # Errors
    /// [`SyncError::Unauthenticated`] when nobody is bound.
    pub fn client_for(&self, action: &str) -> Result<SyncClient<E>, SyncError> {
        let uid = self.ctx.require_user(action)?;
        Ok(self.client(uid))
    }

    fn client(&self, uid: UserId) -> SyncClient<E> {
        SyncClient::scoped(self.ctx.store.clone(), uid)
    }

    /// Validate and write a new entity under a fresh id; returns the id
    ///
    /// # Errors
    /// `Unauthenticated`, `Invalid` for an entity failing validation, or the
    /// store error of the write.
    pub async fn insert_with(&self, build: impl FnOnce(String) -> E) -> Result<String, SyncError> {
        let action = format!("add {}", self.noun.one);
        let client = self.client_for(&action)?;
        let entity = build(self.ctx.new_id(E::ID_PREFIX));
        let id = entity.id().to_string();
        self.ctx
            .guard(&action, async {
                entity.validate().map_err(|reason| SyncError::Invalid {
                    id: id.clone(),
                    reason,
                })?;
                client.set(&id, &entity).await
            })
            .await?;
        tracing::debug!(collection = E::COLLECTION, id, "added");
        Ok(id)
    }

    /// Strict partial update of an existing entity
    ///
    /// The stored entity with `patch` applied must still validate; nothing
    /// is written otherwise.
    ///
    /// # Errors
    /// `Unauthenticated`, `NotFound` if the entity does not exist, `Invalid`
    /// for a patch that breaks validation, or the store error of the write.
    pub async fn update_fields<P>(&self, id: &str, patch: &P) -> Result<(), SyncError>
    where
        P: Serialize + Sync + ?Sized,
    {
        let action = format!("update {}", self.noun.one);
        let client = self.client_for(&action)?;
        self.ctx
            .guard(&action, async {
                let current = client
                    .get(id)
                    .await?
                    .ok_or_else(|| SyncError::NotFound(id.to_string()))?;
                patched(id, &current, patch)?;
                client.update(id, patch).await
            })
            .await
    }

    /// Merge-write a body under `id`
    ///
    /// # Errors
    /// `Unauthenticated` or the store error of the write.
    pub async fn merge<P>(&self, action: &str, id: &str, body: &P) -> Result<(), SyncError>
    where
        P: Serialize + Sync + ?Sized,
    {
        let client = self.client_for(action)?;
        self.ctx.guard(action, client.set(id, body)).await
    }

    /// Idempotent removal
    ///
    /// # Errors
    /// `Unauthenticated` or the store error of the delete.
    pub async fn remove(&self, id: &str) -> Result<(), SyncError> {
        let action = format!("delete {}", self.noun.one);
        let client = self.client_for(&action)?;
        self.ctx.guard(&action, client.delete(id)).await
    }

    /// Fresh bulk read, bypassing the cache
    ///
    /// # Errors
    /// `Unauthenticated` or a transport error.
    pub async fn fetch(&self, query: &Query) -> Result<Vec<E>, SyncError> {
        let action = format!("load {}", self.noun.many);
        let client = self.client_for(&action)?;
        client.get_all(query).await
    }
}

impl<E: Entity> Rebind for Synchronizer<E> {
    fn rebind(&self, identity: Option<&Identity>) {
        let store = self.ctx.store.clone();
        let transform = self.transform.clone();
        self.binder.rebind(identity, move |uid, sink| {
            let on_error = sink.clone();
            SyncClient::<E>::scoped(store, uid.clone()).subscribe_collection(
                move |items| {
                    let items = match &transform {
                        Some(t) => t(items),
                        None => items,
                    };
                    sink.data(items);
                },
                move |err| on_error.error(&err),
            )
        });
    }
}

/// Mirror of one document of the bound user
///
/// The document id may be moved with [`retarget`](Self::retarget).
pub struct DocumentSync<R: Record> {
    ctx: SyncContext,
    collection: &'static str,
    doc_id: Arc<Mutex<String>>,
    binder: Arc<Binder<Option<R>>>,
}

impl<R: Record> Clone for DocumentSync<R> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            collection: self.collection,
            doc_id: self.doc_id.clone(),
            binder: self.binder.clone(),
        }
    }
}

impl<R: Record> fmt::Debug for DocumentSync<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentSync")
            .field("collection", &self.collection)
            .field("doc_id", &*self.doc_id.lock())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<R: Record> DocumentSync<R> {
    /// Unbound mirror of `collection/doc_id`
    pub fn new(
        ctx: SyncContext,
        collection: &'static str,
        doc_id: impl Into<String>,
        what: &'static str,
    ) -> Self {
        let binder = Binder::new(ctx.scope.clone(), ctx.notifier.clone(), what);
        Self {
            ctx,
            collection,
            doc_id: Arc::new(Mutex::new(doc_id.into())),
            binder,
        }
    }

    /// Shared collaborators
    #[must_use]
    pub fn context(&self) -> &SyncContext {
        &self.ctx
    }

    /// Id of the mirrored document
    #[must_use]
    pub fn doc_id(&self) -> String {
        self.doc_id.lock().clone()
    }

    /// Latest cached document; `None` while absent or unbound
    #[must_use]
    pub fn value(&self) -> Option<R> {
        (*self.binder.view().data).clone()
    }

    /// Lifecycle state
    #[must_use]
    pub fn state(&self) -> SyncState {
        self.binder.view().state
    }

    /// Change feed of the cache
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<CacheView<Option<R>>> {
        self.binder.watch()
    }

    /// Follow the session scope until the handle is dropped
    pub fn mount(&self) -> MountHandle {
        follow_scope(&self.ctx.scope, self.clone())
    }

    /// Mirror another document id and re-subscribe for the bound identity
    pub fn retarget(&self, doc_id: impl Into<String>) {
        let doc_id = doc_id.into();
        tracing::debug!(collection = self.collection, doc_id, "retargeting document subscription");
        *self.doc_id.lock() = doc_id;
        self.rebind(self.ctx.scope.current().as_ref());
    }

    /// Client for the bound user, or an `Unauthenticated` rejection of `action`
    ///
    /// # Errors
    /// [`SyncError::Unauthenticated`] when nobody is bound.
    pub fn client_for(&self, action: &str) -> Result<SyncClient<R>, SyncError> {
        let uid = self.ctx.require_user(action)?;
        Ok(SyncClient::for_collection(self.ctx.store.clone(), uid, self.collection))
    }

    /// Merge-write `body` into the mirrored document
    ///
    /// # Errors
    /// `Unauthenticated` or the store error of the write.
    pub async fn merge<P>(&self, action: &str, body: &P) -> Result<(), SyncError>
    where
        P: Serialize + Sync + ?Sized,
    {
        let client = self.client_for(action)?;
        let id = self.doc_id();
        self.ctx.guard(action, client.set(&id, body)).await
    }
}

impl<R: Record> Rebind for DocumentSync<R> {
    fn rebind(&self, identity: Option<&Identity>) {
        let store = self.ctx.store.clone();
        let collection = self.collection;
        let doc_id = self.doc_id.clone();
        self.binder.rebind(identity, move |uid, sink| {
            // Read under the slot lock so a concurrent retarget is never undone.
            let doc_id = doc_id.lock().clone();
            let on_error = sink.clone();
            SyncClient::<R>::for_collection(store, uid.clone(), collection).subscribe_document(
                &doc_id,
                move |doc| {
                    sink.data(doc);
                },
                move |err| on_error.error(&err),
            )
        });
    }
}
