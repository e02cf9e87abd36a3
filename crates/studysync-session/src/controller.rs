//! Session controller
//!
//! Owns every transition of the [`SessionScope`]:
//! - identity acquired: purge residue if a different user was last bound on
//!   this device, record the new user, then bind
//! - identity lost: unbind
//! - sign-out and account deletion: unbind, purge, revoke

use crate::error::SessionError;
use crate::local::{LocalKeys, LocalStore, MIGRATED};
use crate::ports::{IdentityProvider, Notifier, Severity};
use crate::scope::{Identity, SessionScope};
use std::fmt;
use std::sync::Arc;
use studysync_store::UserId;
use tokio::task::JoinHandle;

/// Drives the session scope from the identity provider
pub struct SessionController {
    scope: SessionScope,
    provider: Arc<dyn IdentityProvider>,
    local: Arc<dyn LocalStore>,
    keys: LocalKeys,
    notifier: Arc<dyn Notifier>,
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("scope", &self.scope)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Create a controller for `scope`
    pub fn new(
        scope: SessionScope,
        provider: Arc<dyn IdentityProvider>,
        local: Arc<dyn LocalStore>,
        keys: LocalKeys,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            scope,
            provider,
            local,
            keys,
            notifier,
        }
    }

    /// Scope driven by this controller
    #[must_use]
    pub fn scope(&self) -> &SessionScope {
        &self.scope
    }

    /// Local key layout
    #[must_use]
    pub fn keys(&self) -> &LocalKeys {
        &self.keys
    }

    /// Local store used for residue
    #[must_use]
    pub fn local(&self) -> &Arc<dyn LocalStore> {
        &self.local
    }

    /// Follow the provider's identity feed until it closes
    ///
    /// The current value is applied before the task is spawned.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        let mut feed = self.provider.identity_feed();
        let initial = feed.borrow_and_update().clone();
        self.apply(initial);
        tokio::spawn(async move {
            while feed.changed().await.is_ok() {
                let next = feed.borrow_and_update().clone();
                self.apply(next);
            }
            tracing::debug!("identity feed closed");
        })
    }

    /// Apply one identity observation
    pub fn apply(&self, next: Option<Identity>) {
        match next {
            Some(identity) => self.acquire(identity),
            None => {
                if self.scope.clear() {
                    tracing::info!("identity cleared");
                }
            }
        }
    }

    fn acquire(&self, identity: Identity) {
        let marker = self.keys.current_user();
        let previous = self.local.get(&marker);
        if previous.as_deref().is_some_and(|prev| prev != identity.uid.as_str()) {
            tracing::info!(
                previous = previous.as_deref().unwrap_or_default(),
                uid = %identity.uid,
                "different user on this device; purging residue"
            );
            // Unbind first so no synchronizer keeps the previous user's cache.
            self.scope.clear();
            self.purge_residue();
        }
        self.local.set(&marker, identity.uid.as_str());
        if self.scope.bind(identity.clone()) {
            tracing::info!(uid = %identity.uid, "identity bound");
        }
    }

    /// Remove every namespaced and legacy key from the local store
    ///
    /// Returns the number of removed keys.
    pub fn purge_residue(&self) -> usize {
        let doomed: Vec<String> = self
            .local
            .keys()
            .into_iter()
            .filter(|k| self.keys.is_residue(k))
            .collect();
        for key in &doomed {
            self.local.remove(key);
        }
        tracing::debug!(removed = doomed.len(), "local residue purged");
        doomed.len()
    }

    /// Unbind, purge, then revoke the credential
    ///
    /// # Errors
    /// [`SessionError::Provider`] if revocation fails; local state is purged
    /// regardless.
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        self.scope.clear();
        self.purge_residue();
        match self.provider.sign_out().await {
            Ok(()) => {
                self.notifier.notify(Severity::Success, "Signed out successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "sign-out failed");
                self.notifier
                    .notify(Severity::Error, "Failed to sign out. Please try again.");
                Err(e)
            }
        }
    }

    /// Reauthenticate, delete the user, then unbind and purge
    ///
    /// # Errors
    /// [`SessionError::NotSignedIn`] without a bound user,
    /// [`SessionError::Reauthentication`] on a wrong password, or a provider
    /// failure. Nothing is purged unless deletion succeeded.
    pub async fn delete_account(&self, password: &str) -> Result<(), SessionError> {
        let Some(identity) = self.scope.current() else {
            self.notifier
                .notify(Severity::Error, "No user is currently signed in");
            return Err(SessionError::NotSignedIn);
        };

        let result: Result<(), SessionError> = async {
            self.provider.reauthenticate(password).await?;
            self.provider.delete_user().await
        }
        .await;

        match result {
            Ok(()) => {
                self.scope.clear();
                self.purge_residue();
                tracing::info!(uid = %identity.uid, "account deleted");
                self.notifier
                    .notify(Severity::Success, "Account deleted successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!(uid = %identity.uid, error = %e, "account deletion failed");
                let message = if e.needs_password() {
                    "Incorrect password. Please try again."
                } else {
                    "Failed to delete account. Please try again."
                };
                self.notifier.notify(Severity::Error, message);
                Err(e)
            }
        }
    }

    /// Check whether legacy residue was already migrated for the bound user
    #[must_use]
    pub fn is_migrated(&self, uid: &UserId) -> bool {
        self.local
            .get(&self.keys.user(uid, MIGRATED))
            .is_some_and(|v| v == "true")
    }

    pub(crate) fn mark_migrated(&self, uid: &UserId) {
        self.local.set(&self.keys.user(uid, MIGRATED), "true");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::MemoryLocalStore;
    use crate::ports::{MockIdentityProvider, TracingNotifier};
    use tokio::sync::watch;

    fn controller(provider: MockIdentityProvider, local: &Arc<MemoryLocalStore>) -> SessionController {
        SessionController::new(
            SessionScope::new(),
            Arc::new(provider),
            local.clone(),
            LocalKeys::default(),
            Arc::new(TracingNotifier),
        )
    }

    #[test]
    fn switching_user_purges_previous_residue() {
        let local = Arc::new(MemoryLocalStore::new());
        let ctl = controller(MockIdentityProvider::new(), &local);

        ctl.apply(Some(Identity::new("a")));
        local.set("studysync:a:completed_tasks", "12");
        local.set("grades_a", "[]");
        local.set("theme", "dark");

        ctl.apply(Some(Identity::new("b")));

        assert_eq!(local.get("studysync:a:completed_tasks"), None);
        assert_eq!(local.get("grades_a"), None);
        assert_eq!(local.get("theme").as_deref(), Some("dark"));
        assert_eq!(local.get("studysync:current_user").as_deref(), Some("b"));
        assert!(ctl.scope().is_bound_to(&UserId::new("b")));
    }

    #[test]
    fn same_user_keeps_residue() {
        let local = Arc::new(MemoryLocalStore::new());
        let ctl = controller(MockIdentityProvider::new(), &local);
        ctl.apply(Some(Identity::new("a")));
        local.set("studysync:a:completed_tasks", "3");
        ctl.apply(None);
        ctl.apply(Some(Identity::new("a")));
        assert_eq!(local.get("studysync:a:completed_tasks").as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn wrong_password_keeps_account_and_data() {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_reauthenticate()
            .returning(|_| Err(SessionError::Reauthentication("wrong-password".into())));
        provider.expect_delete_user().never();
        let local = Arc::new(MemoryLocalStore::new());
        let ctl = controller(provider, &local);
        ctl.apply(Some(Identity::new("a")));
        local.set("studysync:a:study_streak", "4");

        let err = ctl.delete_account("nope").await.unwrap_err();
        assert!(err.needs_password());
        assert!(ctl.scope().current().is_some());
        assert_eq!(local.get("studysync:a:study_streak").as_deref(), Some("4"));
    }

    #[tokio::test]
    async fn delete_account_purges_after_deletion() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_reauthenticate().times(1).returning(|_| Ok(()));
        provider.expect_delete_user().times(1).returning(|| Ok(()));
        let local = Arc::new(MemoryLocalStore::new());
        let ctl = controller(provider, &local);
        ctl.apply(Some(Identity::new("a")));
        local.set("studysync:a:study_streak", "4");

        ctl.delete_account("secret").await.unwrap();
        assert!(ctl.scope().current().is_none());
        assert!(local.is_empty());
    }

    #[tokio::test]
    async fn delete_without_user_is_rejected() {
        let local = Arc::new(MemoryLocalStore::new());
        let ctl = controller(MockIdentityProvider::new(), &local);
        assert_eq!(ctl.delete_account("x").await, Err(SessionError::NotSignedIn));
    }

    #[tokio::test]
    async fn spawned_controller_follows_feed() {
        let (tx, rx) = watch::channel(None);
        let mut provider = MockIdentityProvider::new();
        provider.expect_identity_feed().return_const(rx);
        let local = Arc::new(MemoryLocalStore::new());
        let ctl = Arc::new(controller(provider, &local));
        let mut scope_rx = ctl.scope().subscribe();
        let handle = ctl.clone().spawn();

        tx.send(Some(Identity::new("z"))).unwrap();
        scope_rx.changed().await.unwrap();
        assert!(ctl.scope().is_bound_to(&UserId::new("z")));

        drop(tx);
        handle.await.unwrap();
    }
}
