//! Dependencies shared by every synchronizer

use crate::clock::Clock;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use studysync_session::{Counters, Notifier, SessionScope, Severity, SignalBus};
use studysync_store::{generate_id_with, DocumentStore, SyncError, UserId, DEFAULT_SUFFIX_LEN};

/// Injected collaborators of a synchronizer
#[derive(Clone)]
pub struct SyncContext {
    /// Remote document store
    pub store: Arc<dyn DocumentStore>,
    /// Bound identity
    pub scope: SessionScope,
    /// User-facing messages
    pub notifier: Arc<dyn Notifier>,
    /// Cross-component signals
    pub signals: SignalBus,
    /// Local counters
    pub counters: Counters,
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Length of the random id suffix
    pub id_suffix_len: usize,
}

impl fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncContext")
            .field("scope", &self.scope)
            .field("id_suffix_len", &self.id_suffix_len)
            .finish_non_exhaustive()
    }
}

impl SyncContext {
    /// Context with the default id suffix length
    pub fn new(
        store: Arc<dyn DocumentStore>,
        scope: SessionScope,
        notifier: Arc<dyn Notifier>,
        signals: SignalBus,
        counters: Counters,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            scope,
            notifier,
            signals,
            counters,
            clock,
            id_suffix_len: DEFAULT_SUFFIX_LEN,
        }
    }

    /// Set the id suffix length
    #[must_use]
    pub fn with_id_suffix_len(mut self, len: usize) -> Self {
        self.id_suffix_len = len;
        self
    }

    /// Fresh client-side id
    #[must_use]
    pub fn new_id(&self, prefix: &str) -> String {
        generate_id_with(prefix, self.id_suffix_len)
    }

    /// Bound user, or reject `action` with one notification
    ///
    /// # Errors
    /// [`SyncError::Unauthenticated`] when nobody is bound.
    pub fn require_user(&self, action: &str) -> Result<UserId, SyncError> {
        self.scope.current_uid().ok_or_else(|| {
            tracing::warn!(action, "mutation without a bound identity");
            self.notifier
                .notify(Severity::Error, &format!("You must be logged in to {action}"));
            SyncError::Unauthenticated
        })
    }

    /// Await a write; on failure log and raise exactly one notification
    ///
    /// # Errors
    /// Whatever `write` fails with, unchanged.
    pub async fn guard<T, F>(&self, action: &str, write: F) -> Result<T, SyncError>
    where
        F: Future<Output = Result<T, SyncError>>,
    {
        match write.await {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(action, error = %e, "mutation failed");
                self.notifier
                    .notify(Severity::Error, &failure_message(action, &e));
                Err(e)
            }
        }
    }
}

fn failure_message(action: &str, err: &SyncError) -> String {
    match err {
        SyncError::NotFound(_) => format!("Failed to {action}: it no longer exists."),
        SyncError::PermissionDenied(_) => {
            format!("Failed to {action}: you do not have access.")
        }
        SyncError::Invalid { reason, .. } => format!("Failed to {action}: {reason}."),
        _ => format!("Failed to {action}. Please try again."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_actionable() {
        assert_eq!(
            failure_message("add task", &SyncError::Unavailable("offline".into())),
            "Failed to add task. Please try again."
        );
        assert_eq!(
            failure_message("update task", &SyncError::NotFound("t".into())),
            "Failed to update task: it no longer exists."
        );
    }
}
