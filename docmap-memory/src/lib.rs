//! In-memory backend for docmap.
//!
//! [`MemoryStore`] implements the
//! [`DocumentStore`](docmap_core::store::DocumentStore) contract over plain
//! hash maps guarded by an async read-write lock. It needs no external
//! process, which makes it the backend of choice for tests and for small
//! tools that want model semantics without a database.

mod matcher;
mod store;

pub use store::MemoryStore;
