//! The model trait and the class-level operation surface.
//!
//! A model is a plain serde struct plus field metadata. Implementing
//! [`Model`] (usually just `impl Model for Person {}` next to a
//! `#[derive(Fields)]`) opts the type into records, cursors, hooks, and
//! validation; overriding [`Model::install`] wires in lifecycle behavior.
//!
//! [`ModelExt`] is blanket-implemented and provides the collection-wide
//! entry points: `Person::query(&store)`, `Person::find_by_id(&store, id)`,
//! and friends. Every operation takes the store handle explicitly; there is
//! no ambient connection.

use async_trait::async_trait;
use bson::{Document, doc, oid::ObjectId};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;

use crate::{
    cursor::Cursor,
    error::DocmapResult,
    fields::{self, Fields},
    hooks::Hooks,
    record::Record,
    store::DocumentStore,
};

/// A typed record schema.
pub trait Model:
    Fields + Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static
{
    /// The collection this model persists to. Defaults to the type's simple
    /// name split on uppercase boundaries and lowercased
    /// (`UserProfile` → `user_profile`).
    fn collection_name() -> String {
        fields::collection_name_from(Self::model_name())
    }

    /// Populates the model's hook pipeline. Called once per process, on the
    /// type's first use; the default installs nothing.
    fn install(hooks: &mut Hooks<Self>) {
        let _ = hooks;
    }
}

/// Class-level operations available on every model.
#[async_trait]
pub trait ModelExt: Model {
    /// An unfiltered cursor over the model's collection.
    fn query(store: &dyn DocumentStore) -> Cursor<'_, Self> {
        Cursor::new(store)
    }

    /// A cursor pre-filtered with `filter`.
    fn find(store: &dyn DocumentStore, filter: Document) -> Cursor<'_, Self> {
        Cursor::new(store).find(filter)
    }

    /// Loads the record with the given hex identifier. A malformed
    /// identifier is treated as "not found", never as an error.
    async fn find_by_id(store: &dyn DocumentStore, id: &str) -> DocmapResult<Option<Record<Self>>> {
        let Ok(object_id) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        Self::query(store)
            .find(doc! { "_id": object_id })
            .first()
            .await
    }

    /// The first record in the collection, in store order.
    async fn first(store: &dyn DocumentStore) -> DocmapResult<Option<Record<Self>>> {
        Self::query(store).first().await
    }

    /// The number of documents in the collection.
    async fn count(store: &dyn DocumentStore) -> DocmapResult<u64> {
        Self::query(store).count().await
    }

    /// Constructs a record from `model` and saves it. The record is
    /// returned regardless of the validation outcome; check
    /// [`Record::has_errors`] to tell the cases apart.
    async fn create(store: &dyn DocumentStore, model: Self) -> DocmapResult<Record<Self>> {
        let mut record = Record::new(model)?;
        record.save(store).await?;

        Ok(record)
    }

    /// Bulk-deletes every document in the collection, bypassing the destroy
    /// hooks. Returns the number removed. For the hook-running, per-record
    /// variant use [`Cursor::destroy_all`].
    async fn destroy_all(store: &dyn DocumentStore) -> DocmapResult<u64> {
        store
            .delete_many(&Self::collection_name(), Document::new())
            .await
    }

    /// Loads the record with the given hex identifier and destroys it, so
    /// the destroy hooks run. `false` when the identifier is malformed or
    /// matches nothing, without store mutation.
    async fn destroy_by_id(store: &dyn DocumentStore, id: &str) -> DocmapResult<bool> {
        match Self::find_by_id(store, id).await? {
            Some(mut record) => record.destroy(store).await,
            None => Ok(false),
        }
    }

    /// Drops the model's collection.
    async fn drop_collection(store: &dyn DocumentStore) -> DocmapResult<()> {
        store.drop_collection(&Self::collection_name()).await
    }
}

impl<M: Model> ModelExt for M {}
