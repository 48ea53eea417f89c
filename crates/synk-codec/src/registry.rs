//! Codec lookup by record type
//!
//! Codecs are composed explicitly by the caller; the registry only makes a
//! composed codec discoverable by the record type it handles.

use crate::codec::MapCodec;
use crate::error::{CodecError, Result};
use parking_lot::RwLock;
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Type-keyed table of codecs
#[derive(Default)]
pub struct CodecRegistry {
    codecs: RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl CodecRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the codec for `T`, replacing any previous one
    pub fn register<T, C>(&self, codec: C)
    where
        T: 'static,
        C: MapCodec<T> + 'static,
    {
        let codec: Arc<dyn MapCodec<T>> = Arc::new(codec);
        let replaced = self
            .codecs
            .write()
            .insert(TypeId::of::<T>(), Box::new(codec))
            .is_some();
        debug!(type_name = type_name::<T>(), replaced, "Registered codec");
    }

    /// Codec for `T`, if one is registered
    #[must_use]
    pub fn codec_for<T: 'static>(&self) -> Option<Arc<dyn MapCodec<T>>> {
        self.codecs
            .read()
            .get(&TypeId::of::<T>())
            .and_then(|codec| codec.downcast_ref::<Arc<dyn MapCodec<T>>>())
            .cloned()
    }

    /// Codec for `T`, failing with `Unregistered` when absent
    pub fn require<T: 'static>(&self) -> Result<Arc<dyn MapCodec<T>>> {
        self.codec_for::<T>().ok_or(CodecError::Unregistered {
            type_name: type_name::<T>(),
        })
    }

    /// Check whether a codec for `T` is registered
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.codecs.read().contains_key(&TypeId::of::<T>())
    }

    /// Number of registered codecs
    #[must_use]
    pub fn len(&self) -> usize {
        self.codecs.read().len()
    }

    /// Check whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codecs.read().is_empty()
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("codecs", &self.len())
            .finish()
    }
}
