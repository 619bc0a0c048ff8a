//! In-memory document store backend for RecordStore.
//!
//! This crate provides an in-memory implementation of the `DocumentStore`
//! trait from `recordstore-storage`, using papaya lock-free HashMap for
//! concurrent access.
//!
//! # Example
//!
//! ```ignore
//! use recordstore_db_memory::InMemoryStore;
//! use recordstore_storage::{Collection, DocumentStore};
//!
//! let store = InMemoryStore::new();
//! let tasks = Collection::schemaless("tasks");
//!
//! let created = store.insert(&tasks, &serde_json::json!({"title": "ship it"})).await?;
//! ```

pub mod query;
pub mod storage;
mod store_impl;

// Re-export the DocumentStore trait for convenience
pub use recordstore_storage::{Document, DocumentStore, DynStore, StorageError};

pub use storage::{InMemoryStore, StorageKey};

use recordstore_core::SharedClock;

/// Creates a new shareable in-memory store on the system clock.
pub fn create_store() -> DynStore {
    std::sync::Arc::new(InMemoryStore::new())
}

/// Creates a new shareable in-memory store stamping documents with `clock`.
pub fn create_store_with_clock(clock: SharedClock) -> DynStore {
    std::sync::Arc::new(InMemoryStore::with_clock(clock))
}
