//! # recordstore-storage
//!
//! Store client abstraction for RecordStore.
//!
//! This crate defines the trait and types every document store backend must
//! implement. It contains no implementation; see `recordstore-db-memory` for
//! the in-memory backend.
//!
//! ## Overview
//!
//! [`DocumentStore`] is the contract for:
//! - inserting documents (`insert`)
//! - filtered, sorted, paginated reads (`find_many`, `find_one`)
//! - atomic read-modify-write (`find_one_and_update`, `find_one_and_remove`)
//!
//! Every call names a [`Collection`], whose [`Schema`] the backend enforces.
//!
//! ## Example
//!
//! ```ignore
//! use recordstore_storage::{Collection, DocumentStore, Filter, FindOptions, SortParam};
//!
//! async fn newest(store: &dyn DocumentStore, tasks: &Collection) -> StorageResult<Vec<Document>> {
//!     let options = FindOptions::new()
//!         .with_sort(SortParam::newest_first())
//!         .with_limit(10);
//!     store.find_many(tasks, &Filter::all(), &options).await
//! }
//! ```

pub mod document;
mod error;
pub mod schema;
mod traits;
mod types;

pub use document::{CREATED_AT_FIELD, Document, ID_FIELD, UPDATED_AT_FIELD, split_insert_fields};
pub use error::{ErrorCategory, StorageError};
pub use schema::{Collection, FieldKind, FieldRule, Schema};
pub use traits::DocumentStore;
pub use types::{Filter, FindOptions, SortParam, UpdateOptions};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shared store trait object.
pub type DynStore = std::sync::Arc<dyn DocumentStore>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use recordstore_storage::prelude::*;
/// ```
pub mod prelude {
    pub use crate::document::Document;
    pub use crate::error::{ErrorCategory, StorageError};
    pub use crate::schema::{Collection, FieldKind, FieldRule, Schema};
    pub use crate::traits::DocumentStore;
    pub use crate::types::{Filter, FindOptions, SortParam, UpdateOptions};
    pub use crate::{DynStore, StorageResult};
}
