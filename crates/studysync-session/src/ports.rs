//! Collaborator ports: user notifications, cross-component signals, identity

use crate::error::SessionError;
use crate::scope::Identity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::{broadcast, watch};

/// Severity of a user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Operation succeeded
    Success,
    /// Operation failed
    Error,
    /// Degraded but usable
    Warning,
    /// Informational
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        })
    }
}

/// Fire-and-forget "show this to the user"
pub trait Notifier: Send + Sync + 'static {
    /// Display `message`; delivery is not confirmed
    fn notify(&self, severity: Severity, message: &str);
}

/// [`Notifier`] that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Error => tracing::error!(target: "studysync::notify", %message),
            Severity::Warning => tracing::warn!(target: "studysync::notify", %message),
            Severity::Success | Severity::Info => {
                tracing::info!(target: "studysync::notify", %severity, %message);
            }
        }
    }
}

/// Cross-component events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Something changed that may unlock an achievement
    CheckAchievements,
}

/// Broadcast bus for [`Signal`]s
#[derive(Debug, Clone)]
pub struct SignalBus {
    tx: broadcast::Sender<Signal>,
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new(16)
    }
}

impl SignalBus {
    /// Bus buffering up to `capacity` undelivered signals per listener
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Emit; having no listeners is not an error
    pub fn emit(&self, signal: Signal) {
        let listeners = self.tx.send(signal).unwrap_or(0);
        tracing::debug!(?signal, listeners, "signal emitted");
    }

    /// Listen from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.tx.subscribe()
    }
}

/// Port to the authentication backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Current identity and its changes
    fn identity_feed(&self) -> watch::Receiver<Option<Identity>>;

    /// Revoke the current credential
    async fn sign_out(&self) -> Result<(), SessionError>;

    /// Prove the password of the signed-in user again
    async fn reauthenticate(&self, password: &str) -> Result<(), SessionError>;

    /// Delete the signed-in user; requires recent authentication
    async fn delete_user(&self) -> Result<(), SessionError>;
}
