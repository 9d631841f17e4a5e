//! The mapped entity: one in-memory record per stored document.
//!
//! A [`Record`] wraps a typed model value together with its persistence
//! bookkeeping: the document identifier, the validation error collection,
//! the change-tracking snapshot, and a side-channel for undeclared
//! attributes that arrived on a raw document. The bookkeeping members are
//! strongly typed and never persisted; only declared public fields make it
//! into the store.
//!
//! State machine: a record is **new** until its first successful insert
//! assigns an `_id`, **persisted** while that `_id` matches a stored
//! document, and **destroyed** once the document is deleted. A destroyed
//! record stays resident in memory but no longer corresponds to stored
//! state; saving it again re-upserts under the stale id.

use std::ops::{Deref, DerefMut};

use bson::{
    Bson, Document, doc,
    de::deserialize_from_bson,
    oid::ObjectId,
    ser::serialize_to_bson,
};
use log::debug;

use crate::{
    changes,
    error::{DocmapError, DocmapResult},
    fields::{self, INTERNAL_PREFIX},
    hooks::{self, HookPoint},
    model::Model,
    store::{DocumentStore, QueryOptions},
    validations::ValidationErrors,
};

/// An in-memory representation of one stored document plus its pending
/// mutations.
///
/// Dereferences to the model value, so declared fields are read and written
/// directly:
///
/// ```ignore
/// let mut person = Record::new(Person::default())?;
/// person.name = Some("p1".into());
/// person.save(&store).await?;
/// ```
#[derive(Debug)]
pub struct Record<M: Model> {
    model: M,
    id: Option<ObjectId>,
    errors: ValidationErrors,
    old_values: Document,
    extras: Document,
}

impl<M: Model> Deref for Record<M> {
    type Target = M;

    fn deref(&self) -> &M {
        &self.model
    }
}

impl<M: Model> DerefMut for Record<M> {
    fn deref_mut(&mut self) -> &mut M {
        &mut self.model
    }
}

impl<M: Model> Record<M> {
    /// Wraps a model value into a new, unsaved record and runs the
    /// `afterInitialize` hook.
    ///
    /// The change snapshot starts empty, so every initially-set field counts
    /// as dirty until the first save or reload.
    pub fn new(model: M) -> DocmapResult<Self> {
        let mut record = Self {
            model,
            id: None,
            errors: ValidationErrors::default(),
            old_values: Document::new(),
            extras: Document::new(),
        };

        hooks::hooks_for::<M>().run(HookPoint::AfterInitialize, &mut record)?;

        Ok(record)
    }

    /// Builds a record from a raw store document and runs the
    /// `afterInitialize` hook.
    ///
    /// Declared public keys deserialize into the model, `_id` becomes the
    /// identifier, other internal-prefixed keys are dropped, and unknown
    /// keys are kept as extras (they participate in [`template`](Self::template)
    /// but never in persistence of declared fields). Load paths snapshot
    /// immediately after construction; this constructor itself does not.
    pub fn from_document(document: Document) -> DocmapResult<Self> {
        let (id, model, extras) = Self::split_document(document)?;

        let mut record = Self {
            model,
            id,
            errors: ValidationErrors::default(),
            old_values: Document::new(),
            extras,
        };

        hooks::hooks_for::<M>().run(HookPoint::AfterInitialize, &mut record)?;

        Ok(record)
    }

    fn split_document(document: Document) -> DocmapResult<(Option<ObjectId>, M, Document)> {
        let registry = fields::registry_for::<M>();
        let mut id = None;
        let mut declared = Document::new();
        let mut extras = Document::new();

        for (key, value) in document {
            if key == "_id" {
                if let Bson::ObjectId(object_id) = value {
                    id = Some(object_id);
                }
            } else if key.starts_with(INTERNAL_PREFIX) {
                // Internal bookkeeping never round-trips through the store.
            } else if registry.is_public(&key) {
                declared.insert(key, value);
            } else {
                extras.insert(key, value);
            }
        }

        let model = deserialize_from_bson(Bson::Document(declared))?;

        Ok((id, model, extras))
    }

    /// Returns the identifier's string representation, or `None` while the
    /// record is unsaved.
    pub fn id(&self) -> Option<String> {
        self.id.map(|id| id.to_hex())
    }

    /// Returns the raw identifier, if assigned.
    pub fn object_id(&self) -> Option<ObjectId> {
        self.id
    }

    /// Assigns the identifier explicitly, e.g. to address an existing
    /// document without loading it first.
    pub fn set_object_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    /// The validation errors collected by the last validation pass.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Mutable access to the error collection, for validators and validate
    /// hooks.
    pub fn errors_mut(&mut self) -> &mut ValidationErrors {
        &mut self.errors
    }

    /// True when the last validation pass recorded errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Undeclared attributes carried over from a raw document.
    pub fn extras(&self) -> &Document {
        &self.extras
    }

    /// Returns the current value of a declared field or extra attribute.
    pub fn get(&self, field: &str) -> DocmapResult<Option<Bson>> {
        let declared = self.to_declared_document()?;

        if let Some(value) = declared.get(field) {
            return Ok(Some(value.clone()));
        }

        Ok(self.extras.get(field).cloned())
    }

    fn to_declared_document(&self) -> DocmapResult<Document> {
        match serialize_to_bson(&self.model)? {
            Bson::Document(document) => Ok(document),
            _ => Err(DocmapError::Serialization(
                "model did not serialize to a document".into(),
            )),
        }
    }

    /// Serializes the current values of the declared public fields, the
    /// exact document shape persisted by saves.
    pub fn public_document(&self) -> DocmapResult<Document> {
        let registry = fields::registry_for::<M>();
        let mut document = Document::new();

        for (key, value) in self.to_declared_document()? {
            if registry.is_public(&key) {
                document.insert(key, value);
            }
        }

        Ok(document)
    }

    fn write_field(&mut self, field: &str, value: Bson) -> DocmapResult<()> {
        let mut current = self.to_declared_document()?;
        current.insert(field, value);
        self.model = deserialize_from_bson(Bson::Document(current))?;

        Ok(())
    }

    /// Captures the current public-field values as the new change baseline,
    /// overwriting any prior snapshot.
    pub fn take_snapshot(&mut self) -> DocmapResult<()> {
        self.old_values = self.public_document()?;

        Ok(())
    }

    /// The snapshot of public-field values as of the last load or save.
    pub fn old_values(&self) -> &Document {
        &self.old_values
    }

    /// True iff `field` is a declared public field whose current value
    /// differs from the snapshot. Unknown and internal fields report false.
    pub fn is_changed(&self, field: &str) -> DocmapResult<bool> {
        if !fields::registry_for::<M>().is_public(field) {
            return Ok(false);
        }

        let current = self.public_document()?;

        Ok(changes::value_changed(&current, &self.old_values, field))
    }

    /// The public fields mutated since the last snapshot, in declaration
    /// order.
    pub fn changed_fields(&self) -> DocmapResult<Vec<String>> {
        let current = self.public_document()?;

        Ok(changes::changed_fields(
            fields::registry_for::<M>(),
            &current,
            &self.old_values,
        ))
    }

    /// Clears the error collection, runs every registered validator, and
    /// returns whether the collection is still empty. Idempotent.
    pub async fn validate(&mut self, store: &dyn DocumentStore) -> DocmapResult<bool> {
        self.errors.clear();

        for validator in hooks::hooks_for::<M>().validators() {
            validator.validate(self, store).await?;
        }

        Ok(self.errors.is_empty())
    }

    /// Validates, then saves. Returns `false` without touching the store
    /// when validation fails.
    pub async fn save(&mut self, store: &dyn DocumentStore) -> DocmapResult<bool> {
        if !self.validate(store).await? {
            return Ok(false);
        }

        self.save_without_validation(store).await
    }

    /// Strict save: like [`save`](Self::save), but signals
    /// [`DocmapError::Validation`] carrying the full error collection
    /// instead of returning `false` when invalid.
    pub async fn save_strict(&mut self, store: &dyn DocumentStore) -> DocmapResult<()> {
        if !self.validate(store).await? {
            return Err(DocmapError::Validation(self.errors.clone()));
        }

        self.save_without_validation(store).await?;

        Ok(())
    }

    /// Persists the record, bypassing validation.
    ///
    /// Runs `beforeSave`, builds the document from the declared public
    /// fields only, then either upserts the full document keyed by the
    /// existing `_id` or inserts and adopts the store-assigned identifier.
    /// Runs `afterSave` and re-snapshots. Returns whether the store
    /// acknowledged the write.
    pub async fn save_without_validation(
        &mut self,
        store: &dyn DocumentStore,
    ) -> DocmapResult<bool> {
        let hooks = hooks::hooks_for::<M>();
        hooks.run(HookPoint::BeforeSave, self)?;

        let collection = M::collection_name();
        let document = self.public_document()?;

        let acknowledged = match self.id {
            Some(id) => {
                store
                    .update_one(&collection, doc! { "_id": id }, document, true)
                    .await?
            }
            None => {
                let id = store.insert_one(&collection, document).await?;
                debug!("inserted {} into {}", id.to_hex(), collection);
                self.id = Some(id);
                true
            }
        };

        hooks.run(HookPoint::AfterSave, self)?;
        self.take_snapshot()?;

        Ok(acknowledged)
    }

    /// Assigns a single field and writes it straight through to the store
    /// as a `$set` partial update keyed by `_id`, bypassing validation and
    /// the save hooks entirely.
    ///
    /// Returns `false` without any effect when `field` is not a declared
    /// public field, and `false` when the store matched no document (e.g.
    /// the record was never saved).
    pub async fn set(
        &mut self,
        store: &dyn DocumentStore,
        field: &str,
        value: impl Into<Bson> + Send,
    ) -> DocmapResult<bool> {
        if !fields::registry_for::<M>().is_public(field) {
            return Ok(false);
        }

        let value = value.into();
        self.write_field(field, value.clone())?;

        let filter = match self.id {
            Some(id) => doc! { "_id": id },
            None => doc! { "_id": Bson::Null },
        };

        store
            .update_one(
                &M::collection_name(),
                filter,
                doc! { "$set": { field: value } },
                false,
            )
            .await
    }

    /// Assigns every declared public entry of `attributes`, then runs a
    /// full [`save`](Self::save). Unlike [`set`](Self::set), updates go
    /// through validation and the save hooks. Undeclared keys are ignored.
    pub async fn update(
        &mut self,
        store: &dyn DocumentStore,
        attributes: Document,
    ) -> DocmapResult<bool> {
        let registry = fields::registry_for::<M>();

        for (key, value) in attributes {
            if registry.is_public(&key) {
                self.write_field(&key, value)?;
            }
        }

        self.save(store).await
    }

    /// Deletes the stored document. Runs `beforeDestroy`, issues the delete
    /// keyed by `_id`, runs `afterDestroy`, and returns whether a document
    /// was removed.
    ///
    /// There is no double-destroy guard: a second call issues a delete for
    /// the already-absent id and reports `false`.
    pub async fn destroy(&mut self, store: &dyn DocumentStore) -> DocmapResult<bool> {
        let hooks = hooks::hooks_for::<M>();
        hooks.run(HookPoint::BeforeDestroy, self)?;

        let collection = M::collection_name();
        let filter = match self.id {
            Some(id) => doc! { "_id": id },
            None => doc! { "_id": Bson::Null },
        };

        let deleted = store.delete_one(&collection, filter).await?;
        debug!("destroyed {:?} in {}: {}", self.id(), collection, deleted);

        hooks.run(HookPoint::AfterDestroy, self)?;

        Ok(deleted)
    }

    /// Re-fetches the document by the current `_id` and overwrites the
    /// in-memory state from it: public fields, extras, a cleared error
    /// collection, a re-run `afterInitialize`, and a fresh snapshot.
    ///
    /// Returns `false` without mutating the record when it was never saved
    /// or the document no longer exists.
    pub async fn reload(&mut self, store: &dyn DocumentStore) -> DocmapResult<bool> {
        let Some(id) = self.id else {
            return Ok(false);
        };

        let fetched = store
            .find_one(
                &M::collection_name(),
                doc! { "_id": id },
                QueryOptions::default(),
            )
            .await?;

        let Some(document) = fetched else {
            return Ok(false);
        };

        let (_, model, extras) = Self::split_document(document)?;
        self.model = model;
        self.extras = extras;
        self.errors.clear();

        hooks::hooks_for::<M>().run(HookPoint::AfterInitialize, self)?;
        self.take_snapshot()?;

        Ok(true)
    }

    /// Serializes the record for presentation.
    ///
    /// When the record currently has errors, the error collection is
    /// returned instead of a data payload. Otherwise the result maps `id`
    /// plus every non-internal attribute currently set (declared fields and
    /// extras alike, nulls omitted).
    pub fn template(&self) -> DocmapResult<Document> {
        self.template_with(None, None)
    }

    /// Like [`template`](Self::template), but delegates to the named
    /// renderer registered on the model's hooks when one resolves, passing
    /// `options` through.
    pub fn template_with(
        &self,
        renderer: Option<&str>,
        options: Option<&Document>,
    ) -> DocmapResult<Document> {
        if self.has_errors() {
            return Ok(self.errors.to_document());
        }

        if let Some(name) = renderer {
            if let Some(rendered) = hooks::hooks_for::<M>().render(name, self, options) {
                return Ok(rendered);
            }
        }

        let mut payload = Document::new();

        if let Some(id) = &self.id {
            payload.insert("id", id.to_hex());
        }

        for (key, value) in self.public_document()? {
            if value != Bson::Null {
                payload.insert(key, value);
            }
        }

        for (key, value) in &self.extras {
            if !key.starts_with(INTERNAL_PREFIX) && *value != Bson::Null {
                payload.insert(key, value.clone());
            }
        }

        Ok(payload)
    }
}
