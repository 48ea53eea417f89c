//! Cache key hashing for Synk
//!
//! Maps a `(namespace, id)` pair onto the key space of the in-memory
//! metadata cache. The hash is not a security boundary, but distinct pairs
//! must not collide at cache scale: two pairs sharing a key would share one
//! cache slot.

use derive_more::{From, Into};
use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::xxh3_128;
use xxhash_rust::xxh64::xxh64;

/// Separator placed between namespace and id in the hash input
pub const KEY_SEPARATOR: char = ':';

/// Key under which a record's metadata lives in the cache
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, From, Into)]
pub struct CacheKey(u128);

impl CacheKey {
    /// Create from a raw 128-bit value
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(value)
    }

    /// Get the raw 128-bit value
    #[must_use]
    pub const fn as_u128(&self) -> u128 {
        self.0
    }

    /// Index of the lock stripe guarding this key
    #[must_use]
    pub fn stripe(&self, stripes: usize) -> usize {
        let stripes = stripes.max(1) as u128;
        // Remainder is < stripes, which came from a usize
        (self.0 % stripes) as usize
    }

    /// Hex representation (32 chars, big-endian)
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex_encode(&self.0.to_be_bytes())
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({})", self.to_hex())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Build the hash input for a record: `namespace + ":" + id`
#[must_use]
pub fn cache_key_input(namespace: &str, id: &str) -> String {
    let mut input = String::with_capacity(namespace.len() + id.len() + 1);
    input.push_str(namespace);
    input.push(KEY_SEPARATOR);
    input.push_str(id);
    input
}

/// Fast, deterministic hash from a string onto the cache key space
pub trait KeyHasher: Send + Sync {
    /// Hash an arbitrary input string
    fn hash(&self, input: &str) -> CacheKey;

    /// Hash a `(namespace, id)` pair
    fn key_for(&self, namespace: &str, id: &str) -> CacheKey {
        self.hash(&cache_key_input(namespace, id))
    }
}

/// xxHash3 128-bit hasher (default)
#[derive(Clone, Copy, Debug, Default)]
pub struct Xxh3Hasher;

impl KeyHasher for Xxh3Hasher {
    fn hash(&self, input: &str) -> CacheKey {
        CacheKey(xxh3_128(input.as_bytes()))
    }
}

/// xxHash64 hasher, widened to the 128-bit key space
#[derive(Clone, Copy, Debug, Default)]
pub struct Xxh64Hasher {
    seed: u64,
}

impl Xxh64Hasher {
    /// Create a hasher with an explicit seed
    #[must_use]
    pub const fn with_seed(seed: u64) -> Self {
        Self { seed }
    }
}

impl KeyHasher for Xxh64Hasher {
    fn hash(&self, input: &str) -> CacheKey {
        CacheKey(u128::from(xxh64(input.as_bytes(), self.seed)))
    }
}

/// Hasher selection for configuration files
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HasherKind {
    #[default]
    Xxh3,
    Xxh64,
}

impl HasherKind {
    /// Instantiate the selected hasher
    #[must_use]
    pub fn build(self) -> Box<dyn KeyHasher> {
        match self {
            Self::Xxh3 => Box::new(Xxh3Hasher),
            Self::Xxh64 => Box::new(Xxh64Hasher::default()),
        }
    }

    /// Configuration name of the hasher
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Xxh3 => "xxh3",
            Self::Xxh64 => "xxh64",
        }
    }
}

/// Hex encode bytes
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";
    let mut result = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        result.push(HEX_CHARS[(byte >> 4) as usize] as char);
        result.push(HEX_CHARS[(byte & 0x0f) as usize] as char);
    }
    result
}
