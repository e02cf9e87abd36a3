//! Error types for the store layer
//!
//! Two layers of errors live here:
//! - [`StoreError`]: what a backend reports, tagged with a machine-readable [`ErrorKind`]
//! - [`SyncError`]: the taxonomy seen by sync clients, synchronizers and the session layer

use std::fmt;

/// Machine-readable classification of a backend failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Document does not exist
    NotFound,
    /// Caller is not allowed to read or write the path
    PermissionDenied,
    /// Transport or backend temporarily unreachable
    Unavailable,
    /// Anything else the backend could not classify
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotFound => "not-found",
            Self::PermissionDenied => "permission-denied",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Error reported by a [`DocumentStore`](crate::DocumentStore) backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct StoreError {
    /// Error classification
    pub kind: ErrorKind,
    /// Human-readable detail
    pub message: String,
}

impl StoreError {
    /// Create error of the given kind
    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Document missing
    #[inline]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Access denied
    #[inline]
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PermissionDenied, message)
    }

    /// Backend unreachable
    #[inline]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, message)
    }

    /// Unclassified backend failure
    #[inline]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

/// Error taxonomy of the synchronization layer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// Mutating call issued without a bound identity
    #[error("no identity is bound")]
    Unauthenticated,

    /// Backend refused access
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Strict update or nested mutation on a missing document
    #[error("document not found: {0}")]
    NotFound(String),

    /// Transient transport failure
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Locally cached JSON that could not be parsed
    #[error("malformed local data under {key}: {reason}")]
    Malformed {
        /// Local key that held the data
        key: String,
        /// Parser message
        reason: String,
    },

    /// Remote document that does not match the declared entity shape
    #[error("document {id} failed shape validation: {reason}")]
    Invalid {
        /// Document id
        id: String,
        /// Validation message
        reason: String,
    },

    /// Unclassified failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Check if the error is transient and the caller may try again
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Check if reads should degrade to an empty result instead of failing
    #[inline]
    #[must_use]
    pub fn is_soft_fail(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }

    /// Check if the error is a missing-document error
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err.kind {
            ErrorKind::NotFound => Self::NotFound(err.message),
            ErrorKind::PermissionDenied => Self::PermissionDenied(err.message),
            ErrorKind::Unavailable => Self::Unavailable(err.message),
            ErrorKind::Internal => Self::Internal(err.message),
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("serialization failed: {err}"))
    }
}
