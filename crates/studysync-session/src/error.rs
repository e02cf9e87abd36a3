//! Session layer errors

use studysync_store::SyncError;

/// Failure of a session operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Operation needs a signed-in user
    #[error("no user is signed in")]
    NotSignedIn,

    /// Password check before a sensitive operation failed
    #[error("reauthentication failed: {0}")]
    Reauthentication(String),

    /// Identity backend failure
    #[error("identity provider error: {0}")]
    Provider(String),

    /// Store failure while moving local data
    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl SessionError {
    /// Check if the user should be asked for their password again
    #[inline]
    #[must_use]
    pub fn needs_password(&self) -> bool {
        matches!(self, Self::Reauthentication(_))
    }
}
