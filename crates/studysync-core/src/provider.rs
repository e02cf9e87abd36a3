//! In-process identity provider
//!
//! Keeps accounts in memory; used by the demo binary and by embedders that
//! run without an authentication backend.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use studysync_session::{Identity, IdentityProvider, SessionError};
use tokio::sync::watch;

/// Identity provider backed by an in-memory account table
#[derive(Debug)]
pub struct LocalIdentityProvider {
    feed: watch::Sender<Option<Identity>>,
    accounts: Mutex<HashMap<String, String>>,
}

impl Default for LocalIdentityProvider {
    fn default() -> Self {
        let (feed, _) = watch::channel(None);
        Self {
            feed,
            accounts: Mutex::new(HashMap::new()),
        }
    }
}

impl LocalIdentityProvider {
    /// Provider with no accounts and nobody signed in
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account and sign it in
    ///
    /// # Errors
    /// [`SessionError::Provider`] if the uid is taken.
    pub fn sign_up(&self, uid: &str, password: &str) -> Result<Identity, SessionError> {
        {
            let mut accounts = self.accounts.lock();
            if accounts.contains_key(uid) {
                return Err(SessionError::Provider(format!("account {uid} already exists")));
            }
            accounts.insert(uid.to_string(), password.to_string());
        }
        Ok(self.publish(uid))
    }

    /// Sign an existing account in
    ///
    /// # Errors
    /// [`SessionError::Provider`] for an unknown uid or a wrong password.
    pub fn sign_in(&self, uid: &str, password: &str) -> Result<Identity, SessionError> {
        if !self.check(uid, password) {
            return Err(SessionError::Provider("invalid credentials".into()));
        }
        Ok(self.publish(uid))
    }

    fn publish(&self, uid: &str) -> Identity {
        let identity = Identity::new(uid);
        self.feed.send_replace(Some(identity.clone()));
        tracing::debug!(uid, "identity published");
        identity
    }

    fn check(&self, uid: &str, password: &str) -> bool {
        self.accounts
            .lock()
            .get(uid)
            .is_some_and(|expected| expected == password)
    }

    fn signed_in(&self) -> Result<String, SessionError> {
        self.feed
            .borrow()
            .as_ref()
            .map(|identity| identity.uid.as_str().to_string())
            .ok_or(SessionError::NotSignedIn)
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    fn identity_feed(&self) -> watch::Receiver<Option<Identity>> {
        self.feed.subscribe()
    }

    async fn sign_out(&self) -> Result<(), SessionError> {
        self.feed.send_replace(None);
        Ok(())
    }

    async fn reauthenticate(&self, password: &str) -> Result<(), SessionError> {
        let uid = self.signed_in()?;
        if self.check(&uid, password) {
            Ok(())
        } else {
            Err(SessionError::Reauthentication("wrong-password".into()))
        }
    }

    async fn delete_user(&self) -> Result<(), SessionError> {
        let uid = self.signed_in()?;
        self.accounts.lock().remove(&uid);
        self.feed.send_replace(None);
        tracing::info!(uid, "account deleted");
        Ok(())
    }
}
