//! Remote document store port
//!
//! The backend contract consumed by [`SyncClient`](crate::SyncClient). Backends
//! deliver *full snapshots* to listeners, never deltas, and must invoke a new
//! listener once with the present state.

use crate::document::{Document, Query, RawDocument};
use crate::error::StoreError;
use crate::path::{CollectionPath, DocumentPath};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Listener for collection snapshots
pub type CollectionListener = Arc<dyn Fn(Result<Vec<RawDocument>, StoreError>) + Send + Sync>;

/// Listener for single-document snapshots (`None` when absent)
pub type DocumentListener = Arc<dyn Fn(Result<Option<RawDocument>, StoreError>) + Send + Sync>;

/// Handle of a live listener.
///
/// Removing the handle (explicitly or by dropping it) detaches the listener
/// immediately. A frame already in flight may still reach the callback once.
#[must_use = "dropping a Subscription detaches the listener"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Wrap a detach closure
    pub fn new(detach: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Subscription with nothing to release
    #[must_use]
    pub fn detached() -> Self {
        Self { detach: None }
    }

    /// Detach the listener now
    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Check if the listener is still attached
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.detach.is_some()
    }

    fn release(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Per-user remote document store
///
/// Retry and backoff belong to the backend's own client library; callers see
/// transient failures as [`ErrorKind::Unavailable`](crate::ErrorKind::Unavailable).
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Point read; `Ok(None)` when the document does not exist
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError>;

    /// Bulk read of a collection
    async fn query(
        &self,
        path: &CollectionPath,
        query: &Query,
    ) -> Result<Vec<RawDocument>, StoreError>;

    /// Upsert, merging `data` into any existing document
    async fn set_merge(&self, path: &DocumentPath, data: Document) -> Result<(), StoreError>;

    /// Overwrite the given fields of an existing document
    ///
    /// # Errors
    /// `NotFound` when the document is absent
    async fn update(&self, path: &DocumentPath, data: Document) -> Result<(), StoreError>;

    /// Remove a document; removing an absent document succeeds
    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError>;

    /// Listen to full snapshots of a collection
    fn listen_collection(&self, path: &CollectionPath, listener: CollectionListener) -> Subscription;

    /// Listen to snapshots of one document
    fn listen_document(&self, path: &DocumentPath, listener: DocumentListener) -> Subscription;
}
