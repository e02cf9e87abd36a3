//! studysync store layer
//!
//! The leaf of the synchronization stack:
//! - [`DocumentStore`]: port to the remote per-user document store
//! - [`MemoryStore`]: in-process backend with snapshot fan-out
//! - [`SyncClient`]: typed CRUD + subscribe gateway for one `users/{uid}/{collection}` path
//! - [`Entity`] / [`Record`]: typed document shapes and client-side id generation
//!
//! # Example
//!
//! ```rust,ignore
//! use studysync_store::{MemoryStore, SyncClient, UserId};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let tasks = SyncClient::<Task>::scoped(store, UserId::new("alice"));
//! tasks.set("task_1", &task).await?;
//! let _sub = tasks.subscribe_collection(|all| println!("{} tasks", all.len()), |_| {});
//! ```

#![warn(unreachable_pub)]

mod client;
mod document;
mod entity;
mod error;
mod memory;
mod path;
mod remote;

pub use client::SyncClient;
pub use document::{merge_into, overwrite_fields, Direction, Document, Filter, Query, RawDocument};
pub use entity::{
    decode, generate_id, generate_id_with, patched, Entity, Record, DEFAULT_SUFFIX_LEN, MIN_SUFFIX_LEN,
};
pub use error::{ErrorKind, StoreError, SyncError};
pub use memory::MemoryStore;
pub use path::{CollectionPath, DocumentPath, UserId};
pub use remote::{CollectionListener, DocumentListener, DocumentStore, Subscription};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
