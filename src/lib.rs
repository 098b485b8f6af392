//! Embedded key-value store for JSON objects, with per-key TTL and periodic
//! snapshot persistence.
//!
//! Values live in a concurrent in-memory map. A background thread writes the
//! whole map to a single snapshot file about once a second whenever something
//! changed, and the next [`Store::open`] picks it back up.
//!
//! ```rust,no_run
//! use local_store::Store;
//!
//! let store = Store::open("./data").unwrap();
//! store.create("user:1", r#"{"name": "ada"}"#).unwrap();
//! store.create_with_ttl("session", r#"{"token": "abc"}"#, 60).unwrap();
//!
//! let user = store.read("user:1").unwrap();
//! assert_eq!(user["name"], "ada");
//! store.close();
//! ```
//!
//! Expired keys are evicted lazily: only a `read` of that exact key removes
//! it. Until then it takes memory and gets written to every snapshot.
//!
//! **Single-process only.** Two processes pointed at the same snapshot file
//! will overwrite each other's state.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod config;
pub mod error;
pub mod flush;
pub mod persist;
pub mod record;
pub mod serializer;
pub mod store;
pub mod validation;

pub use config::{StoreBuilder, StoreConfig};
pub use error::{Error, PersistError, Result};
pub use flush::PersistStats;
pub use record::Record;
pub use store::Store;

/// A JSON object as returned by [`Store::read`].
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Default backend: DashMap.
pub type DefaultBackend = dashmap::DashMap<String, Record>;
