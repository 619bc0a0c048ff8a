//! The store client trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::document::Document;
use crate::error::StorageError;
use crate::schema::Collection;
use crate::types::{Filter, FindOptions, UpdateOptions};

/// A document store client that record accessors delegate to.
///
/// Persistence, schema validation and query execution all happen behind this
/// trait. Implementations must be thread-safe (`Send + Sync`); connection
/// pooling and timeouts are their concern.
///
/// # Example
///
/// ```ignore
/// use recordstore_storage::{Collection, DocumentStore, Filter, StorageError};
///
/// async fn exists(store: &dyn DocumentStore, tasks: &Collection, id: &str) -> Result<bool, StorageError> {
///     Ok(store.find_one(tasks, &Filter::by_id(id)).await?.is_some())
/// }
/// ```
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document.
    ///
    /// A string `id` in `fields` is used as the identifier; otherwise the
    /// store generates one. `createdAt` and `updatedAt` are assigned by the
    /// store and ignored in the input.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Validation` if `fields` is not an object or
    /// fails the collection schema.
    /// Returns `StorageError::AlreadyExists` if the identifier is taken.
    async fn insert(&self, collection: &Collection, fields: &Value)
    -> Result<Document, StorageError>;

    /// Returns the documents matching `filter`, sorted, then skipped, then
    /// limited according to `options`.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues. No matches is an
    /// empty vector.
    async fn find_many(
        &self,
        collection: &Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StorageError>;

    /// Returns the first document matching `filter`, or `None`.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues.
    async fn find_one(
        &self,
        collection: &Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StorageError>;

    /// Applies `patch` to the first document matching `filter`.
    ///
    /// Returns `None` if nothing matched. Otherwise returns the document
    /// after the update, or before it when `options.return_new` is false.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Validation` if the patch is malformed, tries to
    /// change the identifier, or (with `options.run_validators`) the merged
    /// document fails the collection schema. Nothing is written then.
    async fn find_one_and_update(
        &self,
        collection: &Collection,
        filter: &Filter,
        patch: &Value,
        options: &UpdateOptions,
    ) -> Result<Option<Document>, StorageError>;

    /// Removes the first document matching `filter` and returns it, or
    /// `None` if nothing matched.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues.
    async fn find_one_and_remove(
        &self,
        collection: &Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StorageError>;

    /// Returns the name of this backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test that DocumentStore is object-safe
    fn _assert_store_object_safe(_: &dyn DocumentStore) {}
}
