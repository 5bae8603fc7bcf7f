pub mod mongo;

#[cfg(test)]
pub mod memory;

use mongodb::bson::Document;

use crate::error::StoreError;

/// Sort direction for [`DocumentStore::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// The document-store collaborator every entity persists to.
///
/// Documents are addressed by collection name + document id and exchanged
/// as BSON [`Document`]s carrying their own `id` field. Filters support
/// what the repositories actually use: single-field equality,
/// array-contains (equality against an array field, MongoDB semantics)
/// and two-field compound equality. No pagination and no range queries;
/// callers fetch whole result sets and filter in code.
///
/// Every method is one remote round trip. There are no transactions and
/// no retries; failures propagate to the caller as [`StoreError`].
#[allow(async_fn_in_trait)]
pub trait DocumentStore: Clone + Send + Sync + 'static {
    /// Creates a document. Fails with [`StoreError::DuplicateId`] when the
    /// id is already taken; creation never silently overwrites.
    async fn insert(
        &self,
        collection: &'static str,
        id: &str,
        doc: Document,
    ) -> Result<(), StoreError>;

    /// Reads a document by id. Absent ids are `Ok(None)`, not an error.
    async fn fetch(
        &self,
        collection: &'static str,
        id: &str,
    ) -> Result<Option<Document>, StoreError>;

    /// Full-document overwrite, creating the document when absent.
    async fn replace(
        &self,
        collection: &'static str,
        id: &str,
        doc: Document,
    ) -> Result<(), StoreError>;

    /// Partial update of the named top-level fields, leaving the rest of
    /// the document untouched.
    async fn update_fields(
        &self,
        collection: &'static str,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError>;

    /// Deletes a document. Idempotent: deleting an absent id succeeds.
    async fn delete(&self, collection: &'static str, id: &str) -> Result<(), StoreError>;

    /// Deletes every document matching the filter, returning the count.
    async fn delete_where(
        &self,
        collection: &'static str,
        filter: Document,
    ) -> Result<u64, StoreError>;

    /// Runs an equality/array-contains filter, optionally ordered by one
    /// field. An empty filter returns the whole collection.
    async fn find(
        &self,
        collection: &'static str,
        filter: Document,
        sort: Option<(&'static str, SortOrder)>,
    ) -> Result<Vec<Document>, StoreError>;
}
