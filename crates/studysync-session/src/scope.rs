//! The bound identity, shared by every synchronizer

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use studysync_store::UserId;
use tokio::sync::watch;

/// An authenticated user as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user id
    pub uid: UserId,
    /// Sign-in email, if the provider exposes one
    pub email: Option<String>,
}

impl Identity {
    /// Identity without an email
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: UserId::new(uid),
            email: None,
        }
    }

    /// Set the email
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Process-wide "who is signed in" value
///
/// Cloning shares the same scope. Observers see every change as one atomic
/// `Option<Identity>`; they never see partially updated identities.
#[derive(Debug, Clone)]
pub struct SessionScope {
    tx: Arc<watch::Sender<Option<Identity>>>,
}

impl Default for SessionScope {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionScope {
    /// Scope with nobody bound
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Currently bound identity
    #[must_use]
    pub fn current(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    /// Currently bound user id
    #[must_use]
    pub fn current_uid(&self) -> Option<UserId> {
        self.tx.borrow().as_ref().map(|id| id.uid.clone())
    }

    /// Check whether `uid` is the bound user
    #[must_use]
    pub fn is_bound_to(&self, uid: &UserId) -> bool {
        self.tx.borrow().as_ref().is_some_and(|id| &id.uid == uid)
    }

    /// Change feed; the receiver starts at the current value
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }

    /// Bind `identity`; returns whether the value changed
    pub fn bind(&self, identity: Identity) -> bool {
        self.replace(Some(identity))
    }

    /// Unbind; returns whether someone was bound
    pub fn clear(&self) -> bool {
        self.replace(None)
    }

    fn replace(&self, next: Option<Identity>) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebinding_same_identity_is_not_a_change() {
        let scope = SessionScope::new();
        let rx = scope.subscribe();
        assert!(scope.bind(Identity::new("a")));
        assert!(!scope.bind(Identity::new("a")));
        assert!(rx.has_changed().unwrap());
        assert!(scope.is_bound_to(&UserId::new("a")));
        assert!(scope.clear());
        assert!(!scope.clear());
        assert_eq!(scope.current(), None);
    }

    #[tokio::test]
    async fn clones_share_the_binding() {
        let scope = SessionScope::new();
        let other = scope.clone();
        let mut rx = other.subscribe();
        scope.bind(Identity::new("b").with_email("b@example.org"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().map(|i| i.uid.as_str()), Some("b"));
    }
}
