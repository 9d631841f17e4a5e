//! Lazy, chainable query cursors.
//!
//! A [`Cursor`] accumulates a filter document and query options without
//! touching the store. Only the terminal operations (`first`, `all`,
//! `count`, `destroy_all`) bind it to a live result set, and each terminal
//! call re-issues the query with the filter and options as they stand at
//! that moment: a cursor is a description of a query, not a result handle.

use std::marker::PhantomData;

use bson::Document;

use crate::{
    collection::Collection,
    error::DocmapResult,
    model::Model,
    record::Record,
    store::{DocumentStore, QueryOptions},
};

/// Merges `extra` into `base` key-wise, with `extra`'s values winning.
fn merge_filter(base: &mut Document, extra: Document) {
    for (key, value) in extra {
        base.insert(key, value);
    }
}

/// A not-yet-executed query against one model's collection.
#[derive(Debug)]
pub struct Cursor<'a, M: Model> {
    store: &'a dyn DocumentStore,
    filter: Document,
    options: QueryOptions,
    marker: PhantomData<fn() -> M>,
}

impl<'a, M: Model> Cursor<'a, M> {
    /// Creates an unfiltered cursor over `M`'s collection.
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            filter: Document::new(),
            options: QueryOptions::default(),
            marker: PhantomData,
        }
    }

    /// Merges `filter` into the accumulated constraints. Existing keys are
    /// overwritten by the new values; other keys are kept.
    pub fn find(mut self, filter: Document) -> Self {
        merge_filter(&mut self.filter, filter);
        self
    }

    /// Merges a filter and options in one step.
    pub fn find_with(mut self, filter: Document, options: QueryOptions) -> Self {
        merge_filter(&mut self.filter, filter);
        self.options.merge(options);
        self
    }

    /// Caps the number of returned documents.
    pub fn limit(mut self, limit: u64) -> Self {
        self.options.limit = Some(limit);
        self
    }

    /// Skips the first `skip` matching documents.
    pub fn skip(mut self, skip: u64) -> Self {
        self.options.skip = Some(skip);
        self
    }

    /// Sets the sort specification, e.g. `doc! { "age": -1 }`.
    pub fn sort(mut self, spec: Document) -> Self {
        self.options.sort = Some(spec);
        self
    }

    /// The accumulated filter.
    pub fn selector(&self) -> &Document {
        &self.filter
    }

    /// The accumulated options.
    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Hands back the bound collection view for store operations the cursor
    /// does not model, paired with [`selector`](Self::selector) and
    /// [`options`](Self::options) for pass-through.
    pub fn collection(&self) -> Collection<'a> {
        Collection::new(M::collection_name(), self.store)
    }

    /// Runs the query with an effective limit of one and wraps the match,
    /// snapshotted, into a record. `None` when nothing matches.
    pub async fn first(&self) -> DocmapResult<Option<Record<M>>> {
        let found = self
            .store
            .find_one(
                &M::collection_name(),
                self.filter.clone(),
                self.options.clone(),
            )
            .await?;

        match found {
            Some(document) => {
                let mut record: Record<M> = Record::from_document(document)?;
                record.take_snapshot()?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Runs the query and wraps every match, snapshotted, into records in
    /// store order (respecting any `sort` option).
    pub async fn all(&self) -> DocmapResult<Vec<Record<M>>> {
        let documents = self
            .store
            .find(
                &M::collection_name(),
                self.filter.clone(),
                self.options.clone(),
            )
            .await?;

        let mut records = Vec::with_capacity(documents.len());

        for document in documents {
            let mut record: Record<M> = Record::from_document(document)?;
            record.take_snapshot()?;
            records.push(record);
        }

        Ok(records)
    }

    /// Counts the documents matching the current filter. Backends apply the
    /// cursor's `skip` and `limit` options to the count when present.
    pub async fn count(&self) -> DocmapResult<u64> {
        self.store
            .count(
                &M::collection_name(),
                self.filter.clone(),
                self.options.clone(),
            )
            .await
    }

    /// Materializes [`all`](Self::all) and destroys each record in turn,
    /// returning the per-record outcomes.
    ///
    /// Not transactional: an error partway leaves the earlier deletes
    /// applied. Callers needing atomicity must inspect the outcomes.
    pub async fn destroy_all(&self) -> DocmapResult<Vec<bool>> {
        let mut records = self.all().await?;
        let mut outcomes = Vec::with_capacity(records.len());

        for record in &mut records {
            outcomes.push(record.destroy(self.store).await?);
        }

        Ok(outcomes)
    }
}
