//! MongoDB backend for docmap, built on the official `mongodb` driver.
//!
//! Connection settings come either from explicit builder arguments or from
//! the `DOCMAP_*` environment variables via [`MongoConfig`].
//!
//! ```ignore
//! use docmap_mongodb::{MongoConfig, MongoStoreBuilder};
//!
//! let store = MongoStoreBuilder::from_config(&MongoConfig::from_env())
//!     .build()
//!     .await?;
//! ```

mod config;
mod store;

pub use config::MongoConfig;
pub use store::{MongoStore, MongoStoreBuilder};
