//! Subscription lifecycle shared by every synchronizer
//!
//! A [`Binder`] owns one cached value, its [`SyncState`] and at most one live
//! [`Subscription`]. Rebinding follows a strict order:
//! 1. bump the generation so frames of the old subscription become stale
//! 2. detach the old subscription
//! 3. reset the view (`Unbound`, or `Binding` with an empty value)
//! 4. open the new subscription
//!
//! Every delivery carries the generation it was opened under and the user it
//! was opened for. It is applied only if both still match, checked under the
//! view lock, so a late frame of a previous identity can never land in the
//! cache.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use studysync_session::{Identity, Notifier, SessionScope, Severity};
use studysync_store::{Subscription, SyncError, UserId};
use tokio::sync::watch;

/// Lifecycle of a synchronizer's cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SyncState {
    /// No identity; cache empty
    #[default]
    Unbound,
    /// Subscription opened, no snapshot yet
    Binding,
    /// Cache mirrors the latest snapshot
    Live,
    /// Subscription reported an error; cache frozen
    Errored,
}

/// Cached value plus lifecycle state
#[derive(Debug)]
pub struct CacheView<V> {
    /// Latest applied snapshot
    pub data: Arc<V>,
    /// Lifecycle state
    pub state: SyncState,
}

impl<V> Clone for CacheView<V> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            state: self.state,
        }
    }
}

impl<V: Default> CacheView<V> {
    fn reset(state: SyncState) -> Self {
        Self {
            data: Arc::new(V::default()),
            state,
        }
    }
}

pub(crate) struct Binder<V> {
    view: watch::Sender<CacheView<V>>,
    slot: Mutex<Option<Subscription>>,
    generation: AtomicU64,
    scope: SessionScope,
    notifier: Arc<dyn Notifier>,
    what: &'static str,
}

impl<V: Default + Send + Sync + 'static> Binder<V> {
    pub(crate) fn new(scope: SessionScope, notifier: Arc<dyn Notifier>, what: &'static str) -> Arc<Self> {
        let (view, _rx) = watch::channel(CacheView::reset(SyncState::Unbound));
        Arc::new(Self {
            view,
            slot: Mutex::new(None),
            generation: AtomicU64::new(0),
            scope,
            notifier,
            what,
        })
    }

    pub(crate) fn view(&self) -> CacheView<V> {
        self.view.borrow().clone()
    }

    pub(crate) fn watch(&self) -> watch::Receiver<CacheView<V>> {
        self.view.subscribe()
    }

    /// Tear down the current subscription, then open one for `identity`
    pub(crate) fn rebind<F>(self: &Arc<Self>, identity: Option<&Identity>, open: F)
    where
        F: FnOnce(&UserId, Sink<V>) -> Subscription,
    {
        // Held across the whole rebind; deliveries never take it.
        let mut slot = self.slot.lock();
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        if let Some(old) = slot.take() {
            old.unsubscribe();
        }

        let Some(identity) = identity else {
            self.view.send_replace(CacheView::reset(SyncState::Unbound));
            tracing::debug!(what = self.what, "unbound");
            return;
        };

        self.view.send_replace(CacheView::reset(SyncState::Binding));
        tracing::debug!(what = self.what, uid = %identity.uid, generation, "binding");
        let sink = Sink {
            binder: Arc::downgrade(self),
            generation,
            uid: identity.uid.clone(),
        };
        *slot = Some(open(&identity.uid, sink));
    }

    fn is_current(&self, generation: u64, uid: &UserId) -> bool {
        self.generation.load(Ordering::Acquire) == generation && self.scope.is_bound_to(uid)
    }
}

/// Delivery handle given to one subscription
pub(crate) struct Sink<V> {
    binder: Weak<Binder<V>>,
    generation: u64,
    uid: UserId,
}

impl<V> Clone for Sink<V> {
    fn clone(&self) -> Self {
        Self {
            binder: self.binder.clone(),
            generation: self.generation,
            uid: self.uid.clone(),
        }
    }
}

impl<V: Default + Send + Sync + 'static> Sink<V> {
    /// Apply a snapshot; returns whether it was current
    pub(crate) fn data(&self, value: V) -> bool {
        let Some(binder) = self.binder.upgrade() else {
            return false;
        };
        let mut value = Some(value);
        let applied = binder.view.send_if_modified(|view| {
            if !binder.is_current(self.generation, &self.uid) {
                return false;
            }
            if let Some(value) = value.take() {
                view.data = Arc::new(value);
            }
            view.state = SyncState::Live;
            true
        });
        if !applied {
            tracing::debug!(what = binder.what, uid = %self.uid, "stale snapshot dropped");
        }
        applied
    }

    /// Record a subscription error; notifies once per transition into `Errored`
    pub(crate) fn error(&self, err: &SyncError) {
        let Some(binder) = self.binder.upgrade() else {
            return;
        };
        let entered = binder.view.send_if_modified(|view| {
            if !binder.is_current(self.generation, &self.uid) || view.state == SyncState::Errored {
                return false;
            }
            view.state = SyncState::Errored;
            true
        });
        if entered {
            tracing::error!(what = binder.what, uid = %self.uid, error = %err, "subscription errored");
            binder.notifier.notify(
                Severity::Error,
                &format!("Failed to load {}. Please check your connection.", binder.what),
            );
        }
    }
}
