//! Synk metadata store
//!
//! Persists one [`Meta`](synk_codec::Meta) per `(namespace, id)` behind a
//! bounded in-memory cache. The durable tier is a [`MetaBackend`]; redb is
//! the bundled implementation.

pub mod async_store;
pub mod backend;
pub mod cache;
pub mod error;
pub mod redb_backend;
pub mod store;
mod tables;

pub use async_store::AsyncMetastore;
pub use backend::{MemoryBackend, MetaBackend, MetaRow};
pub use cache::{CacheStats, LruCache, MemCache};
pub use error::{MetaStoreError, MetaStoreResult};
pub use redb_backend::RedbBackend;
pub use store::{DEFAULT_LOCK_STRIPES, MetaStore, Metastore};
