//! Synk Common - Shared types and utilities
//!
//! Configuration, error definitions and the cache-key hashing used by the
//! codec, metadata store and CLI crates.

pub mod config;
pub mod error;
pub mod hash;

pub use config::{CacheConfig, LoggingConfig, MetastoreConfig, SynkConfig};
pub use error::{Error, Result};
pub use hash::{CacheKey, HasherKind, KeyHasher, Xxh3Hasher, Xxh64Hasher, cache_key_input};
