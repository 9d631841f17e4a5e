//! Borrowed collection views over a document store.
//!
//! A [`Collection`] binds a store handle to a collection name and mirrors the
//! [`DocumentStore`](crate::store::DocumentStore) contract one level down.
//! Cursors hand these out for pass-through access to store operations the
//! cursor itself does not model.

use bson::{Document, oid::ObjectId};

use crate::{
    error::DocmapResult,
    store::{DocumentStore, QueryOptions},
};

/// A named collection bound to a store reference.
#[derive(Debug, Clone)]
pub struct Collection<'a> {
    name: String,
    store: &'a dyn DocumentStore,
}

impl<'a> Collection<'a> {
    /// Creates a view of `name` on `store`.
    pub fn new(name: impl Into<String>, store: &'a dyn DocumentStore) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns all documents matching `filter`.
    pub async fn find(
        &self,
        filter: Document,
        options: QueryOptions,
    ) -> DocmapResult<Vec<Document>> {
        self.store.find(&self.name, filter, options).await
    }

    /// Returns the first document matching `filter`, if any.
    pub async fn find_one(
        &self,
        filter: Document,
        options: QueryOptions,
    ) -> DocmapResult<Option<Document>> {
        self.store
            .find_one(&self.name, filter, options)
            .await
    }

    /// Counts documents matching `filter`.
    pub async fn count(&self, filter: Document, options: QueryOptions) -> DocmapResult<u64> {
        self.store.count(&self.name, filter, options).await
    }

    /// Inserts a single document, returning its identifier.
    pub async fn insert_one(&self, document: Document) -> DocmapResult<ObjectId> {
        self.store.insert_one(&self.name, document).await
    }

    /// Updates or replaces the first document matching `filter`.
    pub async fn update_one(
        &self,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> DocmapResult<bool> {
        self.store
            .update_one(&self.name, filter, update, upsert)
            .await
    }

    /// Deletes the first document matching `filter`.
    pub async fn delete_one(&self, filter: Document) -> DocmapResult<bool> {
        self.store.delete_one(&self.name, filter).await
    }

    /// Deletes every document matching `filter`.
    pub async fn delete_many(&self, filter: Document) -> DocmapResult<u64> {
        self.store.delete_many(&self.name, filter).await
    }

    /// Drops the collection.
    pub async fn drop(&self) -> DocmapResult<()> {
        self.store.drop_collection(&self.name).await
    }
}
