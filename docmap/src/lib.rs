//! docmap is a lightweight object-document mapper for MongoDB-like
//! document stores.
//!
//! Models are plain serde structs; deriving [`Fields`] and implementing
//! [`model::Model`](docmap_core::model::Model) gives them records with
//! dirty tracking, lifecycle hooks, validation, and lazy chainable query
//! cursors. Every operation takes a store handle explicitly, so the same
//! model code runs against MongoDB in production and the in-memory backend
//! in tests.
//!
//! # Example
//!
//! ```ignore
//! use docmap::prelude::*;
//! use serde::{Deserialize, Serialize};
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
//! # async fn example() -> DocmapResult<()> {
//! let store = docmap::memory::MemoryStore::new();
//!
//! let mut person = Record::new(Person {
//!     name: Some("p1".into()),
//!     email: Some("p1@example.com".into()),
//! })?;
//! person.save(&store).await?;
//!
//! let found = Person::find(&store, doc! { "name": "p1" }).first().await?;
//! # Ok(()) }
//! ```

pub mod prelude;

pub use docmap_core::{
    changes, collection, cursor, error, fields, hooks, model, record, store, validations,
};
pub use docmap_macros::Fields;

pub use bson;

/// The in-memory backend.
pub mod memory {
    pub use docmap_memory::MemoryStore;
}

/// The MongoDB backend. Enabled with the `mongodb` feature.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docmap_mongodb::{MongoConfig, MongoStore, MongoStoreBuilder};
}
