//! Document store abstraction the mapper is built against.
//!
//! This module defines the [`DocumentStore`] trait, the single seam between the
//! record/cursor machinery and a concrete storage engine. Backends implement
//! collection-scoped CRUD over raw BSON documents; everything above this trait
//! (records, cursors, hooks, validation) is store-agnostic.
//!
//! The trait is object-safe: the rest of the crate works with
//! `&dyn DocumentStore` handles passed explicitly into each operation, so the
//! same model code runs unchanged against the in-memory backend in tests and
//! MongoDB in production.

use async_trait::async_trait;
use bson::{Document, oid::ObjectId};
use std::fmt::Debug;

use crate::error::DocmapResult;

/// Pass-through query options recognized by every backend.
///
/// All fields are optional; an empty value means "store defaults". The sort
/// specification is a BSON document of `field -> direction` pairs where a
/// negative numeric direction sorts descending.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Maximum number of documents to return.
    pub limit: Option<u64>,
    /// Number of matching documents to skip before returning results.
    pub skip: Option<u64>,
    /// Sort specification, e.g. `doc! { "age": -1 }`.
    pub sort: Option<Document>,
}

impl QueryOptions {
    /// Merges `other` into `self`, with `other`'s set fields winning.
    pub fn merge(&mut self, other: QueryOptions) {
        if other.limit.is_some() {
            self.limit = other.limit;
        }
        if other.skip.is_some() {
            self.skip = other.skip;
        }
        if other.sort.is_some() {
            self.sort = other.sort;
        }
    }
}

/// Abstract interface to a MongoDB-like document store.
///
/// Filters and update documents pass through to the backend verbatim; the
/// mapper imposes no query language of its own. Document identity is the
/// `_id` field, always an [`ObjectId`].
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` and support concurrent access from
/// multiple async tasks. Connection pooling, timeouts, and retry policy are
/// the backend's responsibility; no operation at this layer is cancellable.
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug {
    /// Returns all documents in `collection` matching `filter`, honoring
    /// `options` (limit, skip, sort).
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: QueryOptions,
    ) -> DocmapResult<Vec<Document>>;

    /// Returns the first document matching `filter`, or `None` when nothing
    /// matches. `options.limit` is ignored; `skip` and `sort` apply.
    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        options: QueryOptions,
    ) -> DocmapResult<Option<Document>>;

    /// Counts documents matching `filter`. Backends apply `options.skip` and
    /// `options.limit` to the count when present.
    async fn count(
        &self,
        collection: &str,
        filter: Document,
        options: QueryOptions,
    ) -> DocmapResult<u64>;

    /// Inserts a single document and returns its identifier.
    ///
    /// When `document` carries no `_id`, the backend generates a fresh
    /// [`ObjectId`] client-side and stores the document under it.
    async fn insert_one(&self, collection: &str, document: Document) -> DocmapResult<ObjectId>;

    /// Updates the first document matching `filter`.
    ///
    /// An `update` document whose every top-level key starts with `$` is an
    /// operator update (e.g. `{ "$set": { ... } }`); anything else replaces
    /// the matched document wholesale, preserving its `_id`. With `upsert`
    /// set, a miss inserts instead. Returns whether a document was matched
    /// or upserted.
    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> DocmapResult<bool>;

    /// Deletes the first document matching `filter`. Returns whether a
    /// document was deleted.
    async fn delete_one(&self, collection: &str, filter: Document) -> DocmapResult<bool>;

    /// Deletes every document matching `filter` and returns how many were
    /// removed. An empty filter clears the collection.
    async fn delete_many(&self, collection: &str, filter: Document) -> DocmapResult<u64>;

    /// Drops the collection and all its documents.
    async fn drop_collection(&self, collection: &str) -> DocmapResult<()>;
}
