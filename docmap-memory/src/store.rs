//! In-memory document store backend.
//!
//! Keeps every collection as a `Vec` of BSON documents behind an async
//! read-write lock, preserving insertion order. Queries scan the whole
//! collection; fine for tests and small embedded datasets, not for bulk
//! data.

use std::{
    collections::{HashMap, hash_map::Entry},
    sync::Arc,
};

use async_trait::async_trait;
use bson::{Bson, Document, oid::ObjectId};
use log::{debug, trace};
use mea::rwlock::RwLock;

use docmap_core::{
    error::{DocmapError, DocmapResult},
    store::{DocumentStore, QueryOptions},
};

use crate::matcher;

type StoreMap = HashMap<String, Vec<Document>>;

/// Thread-safe in-memory implementation of
/// [`DocumentStore`](docmap_core::store::DocumentStore).
///
/// Cloneable; clones share the same underlying data. Documents are stored
/// with their `_id` inline, in insertion order.
///
/// # Example
///
/// ```ignore
/// use docmap_memory::MemoryStore;
///
/// let store = MemoryStore::new();
/// let records = Person::query(&store).all().await?;
/// ```
#[derive(Default, Clone, Debug)]
pub struct MemoryStore {
    collections: Arc<RwLock<StoreMap>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Removes every collection and document. Mainly for test teardown.
    pub async fn clear(&self) {
        self.collections.write().await.clear();
    }
}

fn apply_operators(target: &mut Document, update: &Document) -> DocmapResult<()> {
    for (op, operand) in update {
        match (op.as_str(), operand) {
            ("$set", Bson::Document(assignments)) => {
                for (key, value) in assignments {
                    target.insert(key.clone(), value.clone());
                }
            }
            ("$unset", Bson::Document(removals)) => {
                for key in removals.keys() {
                    target.remove(key);
                }
            }
            _ => {
                return Err(DocmapError::Store(format!(
                    "unsupported update operator `{op}`"
                )));
            }
        }
    }

    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: QueryOptions,
    ) -> DocmapResult<Vec<Document>> {
        trace!("find in {} with {:?} {:?}", collection, filter, options);

        let collections = self.collections.read().await;
        let Some(documents) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<Document> = documents
            .iter()
            .filter(|document| matcher::matches(document, &filter))
            .cloned()
            .collect();

        if let Some(sort) = &options.sort {
            matcher::sort_documents(&mut matched, sort);
        }

        let skip = options.skip.unwrap_or(0) as usize;
        let limit = options
            .limit
            .map(|limit| limit as usize)
            .unwrap_or(usize::MAX);

        Ok(matched
            .into_iter()
            .skip(skip)
            .take(limit)
            .collect())
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        options: QueryOptions,
    ) -> DocmapResult<Option<Document>> {
        let options = QueryOptions {
            limit: Some(1),
            ..options
        };

        Ok(self
            .find(collection, filter, options)
            .await?
            .into_iter()
            .next())
    }

    async fn count(
        &self,
        collection: &str,
        filter: Document,
        options: QueryOptions,
    ) -> DocmapResult<u64> {
        // Skip and limit apply to the count when present.
        Ok(self.find(collection, filter, options).await?.len() as u64)
    }

    async fn insert_one(&self, collection: &str, mut document: Document) -> DocmapResult<ObjectId> {
        let id = match document.get("_id") {
            Some(Bson::ObjectId(id)) => *id,
            Some(other) => {
                return Err(DocmapError::Store(format!(
                    "_id must be an ObjectId, got {other}"
                )));
            }
            None => ObjectId::new(),
        };
        document.insert("_id", id);

        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(document);

        debug!("inserted {} into {}", id.to_hex(), collection);

        Ok(id)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> DocmapResult<bool> {
        let operator_update = matcher::is_operator_document(&update);
        let mut collections = self.collections.write().await;

        let documents = match collections.entry(collection.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) if upsert => entry.insert(Vec::new()),
            Entry::Vacant(_) => return Ok(false),
        };

        if let Some(existing) = documents
            .iter_mut()
            .find(|document| matcher::matches(document, &filter))
        {
            if operator_update {
                apply_operators(existing, &update)?;
            } else {
                // Replacement keeps the matched document's identity.
                let id = existing.get("_id").cloned();
                let mut replacement = update;
                if let Some(id) = id {
                    replacement.insert("_id", id);
                }
                *existing = replacement;
            }

            debug!("updated one in {}", collection);
            return Ok(true);
        }

        if !upsert {
            return Ok(false);
        }

        // Upsert miss: seed the new document from the filter's literal
        // equality constraints, then apply the update on top.
        let mut inserted = Document::new();
        for (key, value) in &filter {
            let is_operator = matches!(value, Bson::Document(spec) if matcher::is_operator_document(spec));
            if !key.starts_with('$') && !is_operator {
                inserted.insert(key.clone(), value.clone());
            }
        }

        if operator_update {
            apply_operators(&mut inserted, &update)?;
        } else {
            let id = inserted.get("_id").cloned();
            inserted = update;
            if let Some(id) = id {
                inserted.insert("_id", id);
            }
        }

        if !matches!(inserted.get("_id"), Some(Bson::ObjectId(_))) {
            inserted.insert("_id", ObjectId::new());
        }

        documents.push(inserted);
        debug!("upserted one into {}", collection);

        Ok(true)
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> DocmapResult<bool> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(false);
        };

        match documents
            .iter()
            .position(|document| matcher::matches(document, &filter))
        {
            Some(index) => {
                documents.remove(index);
                debug!("deleted one from {}", collection);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_many(&self, collection: &str, filter: Document) -> DocmapResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let before = documents.len();
        documents.retain(|document| !matcher::matches(document, &filter));
        let removed = (before - documents.len()) as u64;

        debug!("deleted {} from {}", removed, collection);

        Ok(removed)
    }

    async fn drop_collection(&self, collection: &str) -> DocmapResult<()> {
        self.collections.write().await.remove(collection);
        debug!("dropped collection {}", collection);

        Ok(())
    }
}
