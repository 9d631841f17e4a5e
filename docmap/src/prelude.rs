//! Everything a model definition or call site typically needs.
//!
//! ```ignore
//! use docmap::prelude::*;
//! ```

pub use docmap_core::{
    collection::Collection,
    cursor::Cursor,
    error::{DocmapError, DocmapResult},
    fields::{FieldRegistry, Fields},
    hooks::{Hooks, Validator},
    model::{Model, ModelExt},
    record::Record,
    store::{DocumentStore, QueryOptions},
    validations::{Rules, ValidationErrors},
};
pub use docmap_macros::Fields;

pub use bson::{Bson, Document, doc, oid::ObjectId};
