//! Core of the docmap object-document mapper: typed models over a
//! MongoDB-like document store.
//!
//! This crate provides:
//!
//! - **Field metadata** ([`fields`]) - Declared field names per model type,
//!   public versus internal field semantics, collection-name derivation
//! - **Change tracking** ([`changes`]) - Snapshot-based dirty-state
//!   computation
//! - **Validation** ([`validations`]) - Reusable rules appending typed error
//!   codes to a per-record error collection
//! - **Hooks** ([`hooks`]) - Ordered lifecycle extension points keyed by
//!   model type
//! - **Records** ([`record`]) - The mapped entity with its
//!   save/update/destroy state machine
//! - **Cursors** ([`cursor`]) - Lazy, chainable query handles
//! - **Store abstraction** ([`store`], [`collection`]) - The backend
//!   contract everything above is written against
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use docmap_core::{hooks::Hooks, model::{Model, ModelExt}, record::Record, validations::Rules};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize, Fields)]
//! pub struct Person {
//!     pub name: Option<String>,
//!     pub email: Option<String>,
//! }
//!
//! impl Model for Person {
//!     fn install(hooks: &mut Hooks<Self>) {
//!         hooks.validate(Rules::presence_of("email"));
//!     }
//! }
//!
//! # async fn example(store: &dyn docmap_core::store::DocumentStore) -> docmap_core::error::DocmapResult<()> {
//! let mut person = Record::new(Person { name: Some("p1".into()), email: Some("e1".into()) })?;
//! person.save(store).await?;
//! let found = Person::find(store, bson::doc! { "name": "p1" }).first().await?;
//! # Ok(()) }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmap_core;

pub mod changes;
pub mod collection;
pub mod cursor;
pub mod error;
pub mod fields;
pub mod hooks;
pub mod model;
pub mod record;
pub mod store;
pub mod validations;
