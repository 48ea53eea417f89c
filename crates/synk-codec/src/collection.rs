//! Element-wise codecs for homogeneous collections
//!
//! A collection codec works in element-key space: each element's own
//! encoding is prefixed with `<element-key>|`, or stored flat under
//! `<element-key>` when the element is a primitive. An element that encodes
//! to nothing (an empty inner collection, a record of empty fields) is kept
//! as a single `<element-key>|` entry with an empty value. The enclosing
//! record adds its `field|` prefix through [`Encoder::nested`](crate::Encoder::nested).

use crate::codec::{EncodedForm, MapCodec, group_elements, prefixed, presence_key};
use crate::error::{CodecError, Result};
use crate::scalar::Scalar;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::marker::PhantomData;
use synk_common::hash::hex_encode;
use xxhash_rust::xxh3::xxh3_128;

/// Element codec for primitives: a single entry under the empty key
pub struct ScalarCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> ScalarCodec<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for ScalarCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> MapCodec<T> for ScalarCodec<T> {
    fn encode(&self, value: &T) -> EncodedForm {
        EncodedForm::from([(String::new(), value.to_scalar())])
    }

    fn decode(&self, map: &EncodedForm) -> Result<T> {
        crate::codec::Decoder::new(map).primitive("")
    }
}

fn insert_element(map: &mut EncodedForm, element_key: &str, encoded: EncodedForm) {
    if encoded.is_empty() {
        map.insert(presence_key(element_key), String::new());
        return;
    }
    for (key, value) in encoded {
        map.insert(prefixed(element_key, &key), value);
    }
}

/// Ordered collection; element key is the position
pub struct ListCodec<T, C> {
    element: C,
    _marker: PhantomData<fn() -> T>,
}

impl<T, C: MapCodec<T>> ListCodec<T, C> {
    pub const fn new(element: C) -> Self {
        Self {
            element,
            _marker: PhantomData,
        }
    }
}

impl<T: Scalar> ListCodec<T, ScalarCodec<T>> {
    /// List of primitives
    #[must_use]
    pub const fn scalars() -> Self {
        Self::new(ScalarCodec::new())
    }
}

impl<T, C: MapCodec<T>> MapCodec<Vec<T>> for ListCodec<T, C> {
    fn encode(&self, value: &Vec<T>) -> EncodedForm {
        let mut map = EncodedForm::new();
        for (index, element) in value.iter().enumerate() {
            insert_element(&mut map, &index.to_string(), self.element.encode(element));
        }
        map
    }

    fn decode(&self, map: &EncodedForm) -> Result<Vec<T>> {
        let mut indexed = Vec::new();
        for (element_key, group) in group_elements(map) {
            let index: usize = element_key
                .parse()
                .map_err(|_| CodecError::malformed(element_key.clone(), element_key.clone()))?;
            let element = self
                .element
                .decode(&group)
                .map_err(|e| e.with_prefix(&element_key))?;
            indexed.push((index, element));
        }
        // Element keys sort as strings ("10" < "2"); restore positional order
        indexed.sort_by_key(|(index, _)| *index);
        Ok(indexed.into_iter().map(|(_, element)| element).collect())
    }
}

/// Unordered collection; element key is a hash of the element's encoding
///
/// The key depends only on content, so the encoding is the same whatever
/// order the set iterates in.
pub struct SetCodec<T, C> {
    element: C,
    _marker: PhantomData<fn() -> T>,
}

impl<T, C: MapCodec<T>> SetCodec<T, C> {
    pub const fn new(element: C) -> Self {
        Self {
            element,
            _marker: PhantomData,
        }
    }
}

impl<T: Scalar> SetCodec<T, ScalarCodec<T>> {
    /// Set of primitives
    #[must_use]
    pub const fn scalars() -> Self {
        Self::new(ScalarCodec::new())
    }
}

/// Content-derived element key: hex xxHash3-128 over the canonical encoding
fn content_key(encoded: &EncodedForm) -> String {
    let mut canonical = Vec::new();
    for (key, value) in encoded {
        canonical.extend_from_slice(key.as_bytes());
        canonical.push(0);
        canonical.extend_from_slice(value.as_bytes());
        canonical.push(0);
    }
    hex_encode(&xxh3_128(&canonical).to_be_bytes())
}

impl<T, C> MapCodec<HashSet<T>> for SetCodec<T, C>
where
    T: Eq + Hash,
    C: MapCodec<T>,
{
    fn encode(&self, value: &HashSet<T>) -> EncodedForm {
        let mut map = EncodedForm::new();
        for element in value {
            let encoded = self.element.encode(element);
            let key = content_key(&encoded);
            insert_element(&mut map, &key, encoded);
        }
        map
    }

    fn decode(&self, map: &EncodedForm) -> Result<HashSet<T>> {
        group_elements(map)
            .into_iter()
            .map(|(element_key, group)| {
                self.element
                    .decode(&group)
                    .map_err(|e| e.with_prefix(&element_key))
            })
            .collect()
    }
}

/// String-keyed map; element key is the map key
///
/// Map keys must not contain `|`.
pub struct HashMapCodec<V, C> {
    element: C,
    _marker: PhantomData<fn() -> V>,
}

impl<V, C: MapCodec<V>> HashMapCodec<V, C> {
    pub const fn new(element: C) -> Self {
        Self {
            element,
            _marker: PhantomData,
        }
    }
}

impl<V: Scalar> HashMapCodec<V, ScalarCodec<V>> {
    /// Map of primitives
    #[must_use]
    pub const fn scalars() -> Self {
        Self::new(ScalarCodec::new())
    }
}

impl<V, C: MapCodec<V>> MapCodec<HashMap<String, V>> for HashMapCodec<V, C> {
    fn encode(&self, value: &HashMap<String, V>) -> EncodedForm {
        let mut map = EncodedForm::new();
        for (key, element) in value {
            insert_element(&mut map, key, self.element.encode(element));
        }
        map
    }

    fn decode(&self, map: &EncodedForm) -> Result<HashMap<String, V>> {
        group_elements(map)
            .into_iter()
            .map(|(key, group)| match self.element.decode(&group) {
                Ok(element) => Ok((key, element)),
                Err(e) => Err(e.with_prefix(&key)),
            })
            .collect()
    }
}
