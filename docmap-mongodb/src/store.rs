use async_trait::async_trait;
use bson::{Document, oid::ObjectId};
use futures::TryStreamExt;
use log::{debug, trace};
use mongodb::{
    Client, Collection as MongoCollection,
    options::ClientOptions,
};

use docmap_core::{
    error::{DocmapError, DocmapResult},
    store::{DocumentStore, QueryOptions},
};

use crate::config::MongoConfig;

/// MongoDB-backed implementation of
/// [`DocumentStore`](docmap_core::store::DocumentStore).
#[derive(Debug, Clone)]
pub struct MongoStore {
    client: Client,
    database: String,
}

impl MongoStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoStoreBuilder {
        MongoStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }

    /// Drops the configured database. Destructive; intended for test
    /// environments.
    pub async fn drop_database(&self) -> DocmapResult<()> {
        self.client
            .database(&self.database)
            .drop()
            .await
            .map_err(|e| DocmapError::Store(e.to_string()))?;

        Ok(())
    }

    pub async fn shutdown(self) {
        self.client.shutdown().await;
    }
}

fn is_operator_update(update: &Document) -> bool {
    !update.is_empty() && update.keys().all(|key| key.starts_with('$'))
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: QueryOptions,
    ) -> DocmapResult<Vec<Document>> {
        trace!("find in {} with {:?} {:?}", collection, filter, options);

        let coll = self.get_collection(collection);
        let mut find = coll.find(filter);
        if let Some(limit) = options.limit {
            find = find.limit(limit as i64);
        }
        if let Some(skip) = options.skip {
            find = find.skip(skip);
        }
        if let Some(sort) = options.sort {
            find = find.sort(sort);
        }

        find.await
            .map_err(|e| DocmapError::Store(e.to_string()))?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| DocmapError::Store(e.to_string()))
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        options: QueryOptions,
    ) -> DocmapResult<Option<Document>> {
        let coll = self.get_collection(collection);
        let mut find_one = coll.find_one(filter);
        if let Some(skip) = options.skip {
            find_one = find_one.skip(skip);
        }
        if let Some(sort) = options.sort {
            find_one = find_one.sort(sort);
        }

        find_one
            .await
            .map_err(|e| DocmapError::Store(e.to_string()))
    }

    async fn count(
        &self,
        collection: &str,
        filter: Document,
        options: QueryOptions,
    ) -> DocmapResult<u64> {
        let coll = self.get_collection(collection);
        let mut count = coll.count_documents(filter);
        if let Some(limit) = options.limit {
            count = count.limit(limit);
        }
        if let Some(skip) = options.skip {
            count = count.skip(skip);
        }

        count.await.map_err(|e| DocmapError::Store(e.to_string()))
    }

    async fn insert_one(&self, collection: &str, document: Document) -> DocmapResult<ObjectId> {
        let result = self
            .get_collection(collection)
            .insert_one(document)
            .await
            .map_err(|e| DocmapError::Store(e.to_string()))?;

        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| DocmapError::Store("insert did not return an ObjectId".to_string()))?;

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
        // All-operator payloads go through an operator update; anything else
        // replaces the whole document.
        let result = if is_operator_update(&update) {
            self.get_collection(collection)
                .update_one(filter, update)
                .upsert(upsert)
                .await
                .map_err(|e| DocmapError::Store(e.to_string()))?
        } else {
            self.get_collection(collection)
                .replace_one(filter, update)
                .upsert(upsert)
                .await
                .map_err(|e| DocmapError::Store(e.to_string()))?
        };

        Ok(result.matched_count > 0 || result.upserted_id.is_some())
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> DocmapResult<bool> {
        let result = self
            .get_collection(collection)
            .delete_one(filter)
            .await
            .map_err(|e| DocmapError::Store(e.to_string()))?;

        Ok(result.deleted_count > 0)
    }

    async fn delete_many(&self, collection: &str, filter: Document) -> DocmapResult<u64> {
        let result = self
            .get_collection(collection)
            .delete_many(filter)
            .await
            .map_err(|e| DocmapError::Store(e.to_string()))?;

        Ok(result.deleted_count)
    }

    async fn drop_collection(&self, collection: &str) -> DocmapResult<()> {
        self.get_collection(collection)
            .drop()
            .await
            .map_err(|e| DocmapError::Store(e.to_string()))?;

        Ok(())
    }
}

pub struct MongoStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }

    /// Builder seeded from `DOCMAP_*` environment variables.
    pub fn from_config(config: &MongoConfig) -> Self {
        Self::new(&config.connection_string(), &config.database)
    }

    pub async fn build(self) -> DocmapResult<MongoStore> {
        Ok(MongoStore::new(
            Client::with_options(
                ClientOptions::parse(&self.dsn)
                    .await
                    .map_err(|e| DocmapError::Initialization(e.to_string()))?,
            )
            .map_err(|e| DocmapError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn operator_update_detection() {
        assert!(is_operator_update(&doc! { "$set": { "name": "p1" } }));
        assert!(!is_operator_update(&doc! { "name": "p1" }));
        assert!(!is_operator_update(&doc! {}));
    }
}
