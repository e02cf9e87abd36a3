//! Typed gateway to one user's collection
//!
//! [`SyncClient`] wraps a [`DocumentStore`] for a single `users/{uid}/{collection}`
//! path and applies the read-path policy:
//! - `PermissionDenied` on reads degrades to `None` / empty (new users have no
//!   provisioned data path yet)
//! - documents that fail to decode are quarantined: logged and left out of
//!   collection snapshots
//! - every other error is surfaced unchanged; there is no internal retry

use crate::document::{Document, Query, RawDocument};
use crate::entity::{decode, Entity, Record};
use crate::error::{ErrorKind, SyncError};
use crate::path::{CollectionPath, UserId};
use crate::remote::{DocumentStore, Subscription};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Typed CRUD + subscribe client for one collection
pub struct SyncClient<T> {
    store: Arc<dyn DocumentStore>,
    path: CollectionPath,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for SyncClient<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            path: self.path.clone(),
            _record: PhantomData,
        }
    }
}

impl<T> fmt::Debug for SyncClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncClient").field("path", &self.path).finish()
    }
}

impl<T: Entity> SyncClient<T> {
    /// Client for the entity's own collection
    #[inline]
    pub fn scoped(store: Arc<dyn DocumentStore>, user: UserId) -> Self {
        Self::for_collection(store, user, T::COLLECTION)
    }
}

impl<T: Record> SyncClient<T> {
    /// Client for an explicitly named collection
    #[inline]
    pub fn for_collection(
        store: Arc<dyn DocumentStore>,
        user: UserId,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            store,
            path: CollectionPath::new(user, collection),
            _record: PhantomData,
        }
    }

    /// Remote path served by this client
    #[inline]
    #[must_use]
    pub fn path(&self) -> &CollectionPath {
        &self.path
    }

    /// Point read
    ///
    /// # Errors
    /// Transport errors and [`SyncError::Invalid`] for a document of the wrong shape.
    /// Access denial yields `Ok(None)`.
    pub async fn get(&self, id: &str) -> Result<Option<T>, SyncError> {
        match self.store.get(&self.path.doc(id)).await {
            Ok(Some(data)) => decode(RawDocument::new(id, data)).map(Some),
            Ok(None) => Ok(None),
            Err(e) if e.kind == ErrorKind::PermissionDenied => {
                tracing::warn!(path = %self.path, "permission denied on read; user may not have data yet");
                Ok(None)
            }
            Err(e) => {
                tracing::error!(path = %self.path, id, error = %e, "point read failed");
                Err(e.into())
            }
        }
    }

    /// Bulk read; access denial yields an empty list
    ///
    /// # Errors
    /// Transport errors. Undecodable documents are skipped, not reported.
    pub async fn get_all(&self, query: &Query) -> Result<Vec<T>, SyncError> {
        match self.store.query(&self.path, query).await {
            Ok(docs) => Ok(decode_all(&self.path, docs)),
            Err(e) if e.kind == ErrorKind::PermissionDenied => {
                tracing::warn!(path = %self.path, "permission denied on read; user may not have data yet");
                Ok(Vec::new())
            }
            Err(e) => {
                tracing::error!(path = %self.path, error = %e, "bulk read failed");
                Err(e.into())
            }
        }
    }

    /// Upsert with field-level merge
    ///
    /// # Errors
    /// Transport and permission errors; [`SyncError::Internal`] if `data` is not a JSON object.
    pub async fn set<P: Serialize + ?Sized>(&self, id: &str, data: &P) -> Result<(), SyncError> {
        let body = to_document(data)?;
        self.store
            .set_merge(&self.path.doc(id), body)
            .await
            .map_err(|e| {
                tracing::error!(path = %self.path, id, error = %e, "set failed");
                e.into()
            })
    }

    /// Merge into an existing document
    ///
    /// # Errors
    /// [`SyncError::NotFound`] when the document does not exist.
    pub async fn update<P: Serialize + ?Sized>(&self, id: &str, data: &P) -> Result<(), SyncError> {
        let body = to_document(data)?;
        self.store
            .update(&self.path.doc(id), body)
            .await
            .map_err(|e| {
                tracing::error!(path = %self.path, id, error = %e, "update failed");
                e.into()
            })
    }

    /// Idempotent removal
    ///
    /// # Errors
    /// Transport and permission errors.
    pub async fn delete(&self, id: &str) -> Result<(), SyncError> {
        self.store.delete(&self.path.doc(id)).await.map_err(|e| {
            tracing::error!(path = %self.path, id, error = %e, "delete failed");
            e.into()
        })
    }

    /// Subscribe to full collection snapshots
    ///
    /// `on_data` fires immediately with the present state and again on every
    /// change. Access denial is delivered as an empty snapshot; other errors go
    /// to `on_error`.
    pub fn subscribe_collection<D, E>(&self, on_data: D, on_error: E) -> Subscription
    where
        D: Fn(Vec<T>) + Send + Sync + 'static,
        E: Fn(SyncError) + Send + Sync + 'static,
    {
        let path = self.path.clone();
        self.store.listen_collection(
            &self.path,
            Arc::new(move |snapshot| match snapshot {
                Ok(docs) => on_data(decode_all(&path, docs)),
                Err(e) if e.kind == ErrorKind::PermissionDenied => {
                    tracing::warn!(path = %path, "permission denied on subscription; delivering empty snapshot");
                    on_data(Vec::new());
                }
                Err(e) => {
                    tracing::error!(path = %path, error = %e, "collection subscription error");
                    on_error(e.into());
                }
            }),
        )
    }

    /// Subscribe to one document; `None` is delivered while it is absent
    pub fn subscribe_document<D, E>(&self, id: &str, on_data: D, on_error: E) -> Subscription
    where
        D: Fn(Option<T>) + Send + Sync + 'static,
        E: Fn(SyncError) + Send + Sync + 'static,
    {
        let path = self.path.clone();
        self.store.listen_document(
            &self.path.doc(id),
            Arc::new(move |snapshot| match snapshot {
                Ok(Some(raw)) => match decode(raw) {
                    Ok(record) => on_data(Some(record)),
                    Err(e) => {
                        tracing::warn!(path = %path, error = %e, "quarantined document");
                        on_error(e);
                    }
                },
                Ok(None) => on_data(None),
                Err(e) if e.kind == ErrorKind::PermissionDenied => {
                    tracing::warn!(path = %path, "permission denied on subscription; delivering empty snapshot");
                    on_data(None);
                }
                Err(e) => {
                    tracing::error!(path = %path, error = %e, "document subscription error");
                    on_error(e.into());
                }
            }),
        )
    }
}

fn decode_all<T: Record>(path: &CollectionPath, docs: Vec<RawDocument>) -> Vec<T> {
    docs.into_iter()
        .filter_map(|raw| match decode(raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "quarantined document");
                None
            }
        })
        .collect()
}

pub(crate) fn to_document<P: Serialize + ?Sized>(data: &P) -> Result<Document, SyncError> {
    match serde_json::to_value(data)? {
        Value::Object(map) => Ok(map),
        other => Err(SyncError::Internal(format!(
            "document body must be an object, got {other}"
        ))),
    }
}
