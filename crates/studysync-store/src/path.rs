//! User-scoped remote paths
//!
//! Every collection lives at `users/{uid}/{collection}`; there is no way to build
//! a path that is not scoped to a user.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an authenticated user
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a raw uid
    #[inline]
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    /// Borrow the raw uid
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(uid: &str) -> Self {
        Self::new(uid)
    }
}

/// Path of one user's collection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath {
    user: UserId,
    collection: String,
}

impl CollectionPath {
    /// Build the path for `collection` owned by `user`
    #[inline]
    pub fn new(user: UserId, collection: impl Into<String>) -> Self {
        Self {
            user,
            collection: collection.into(),
        }
    }

    /// Owning user
    #[inline]
    #[must_use]
    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Collection name
    #[inline]
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Path of a document inside this collection
    #[inline]
    #[must_use]
    pub fn doc(&self, id: impl Into<String>) -> DocumentPath {
        DocumentPath {
            parent: self.clone(),
            id: id.into(),
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "users/{}/{}", self.user, self.collection)
    }
}

/// Path of a single document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    parent: CollectionPath,
    id: String,
}

impl DocumentPath {
    /// Containing collection
    #[inline]
    #[must_use]
    pub fn parent(&self) -> &CollectionPath {
        &self.parent
    }

    /// Document id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.parent, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_user_scoped() {
        let path = CollectionPath::new(UserId::new("alice"), "tasks");
        assert_eq!(path.to_string(), "users/alice/tasks");
        assert_eq!(path.doc("t1").to_string(), "users/alice/tasks/t1");
    }
}
