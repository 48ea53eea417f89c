//! Per-record metadata: type tag plus per-field logical timestamps
//!
//! A merge layer compares the timestamps of two replicas field by field to
//! decide which write wins. This module only maintains them. Entries are
//! added or updated, never pruned, so a field dropped from the current
//! record shape still orders writes coming from peers on an older shape.

use crate::codec::{Decoder, EncodedForm, Encoder, MapCodec, decode_from_string, encode_to_string};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Field under which the type tag is stored
pub const CLAZZ_KEY: &str = "clazz";

/// Section holding the per-field timestamps
pub const TIMESTAMP_META_KEY: &str = "timestampMeta";

/// Metadata for one synchronized record
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    /// Fully qualified type identifier of the record
    pub clazz: String,
    /// Last-write logical timestamp per encoded field key
    pub timestamp_meta: HashMap<String, String>,
}

impl Meta {
    /// Create an empty meta for a type identifier
    pub fn new(clazz: impl Into<String>) -> Self {
        Self {
            clazz: clazz.into(),
            timestamp_meta: HashMap::new(),
        }
    }

    /// Create an empty meta tagged with `T`'s type name
    #[must_use]
    pub fn for_type<T: ?Sized>() -> Self {
        Self::new(std::any::type_name::<T>())
    }

    /// Meta for a record seen for the first time: every encoded key gets `timestamp`
    pub fn from_encoded(
        clazz: impl Into<String>,
        encoded: &EncodedForm,
        timestamp: impl Into<String>,
    ) -> Self {
        let timestamp = timestamp.into();
        Self {
            clazz: clazz.into(),
            timestamp_meta: encoded
                .keys()
                .map(|field| (field.clone(), timestamp.clone()))
                .collect(),
        }
    }

    /// Record a write to `field`, adding or replacing its timestamp
    pub fn stamp(&mut self, field: impl Into<String>, timestamp: impl Into<String>) {
        self.timestamp_meta.insert(field.into(), timestamp.into());
    }

    /// Timestamp of the last write to `field`
    #[must_use]
    pub fn timestamp(&self, field: &str) -> Option<&str> {
        self.timestamp_meta.get(field).map(String::as_str)
    }

    /// Take every timestamp from `other`, keeping fields only this meta knows
    ///
    /// Which side wins is the merge layer's decision; this applies it.
    pub fn absorb(&mut self, other: &Meta) {
        for (field, timestamp) in &other.timestamp_meta {
            self.timestamp_meta.insert(field.clone(), timestamp.clone());
        }
    }

    /// Number of tracked fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamp_meta.len()
    }

    /// Check whether no field has been stamped
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamp_meta.is_empty()
    }

    /// Data string persisted by the metadata store
    pub fn to_data_string(&self) -> Result<String> {
        encode_to_string(&MetaCodec.encode(self))
    }

    /// Parse a data string produced by [`Meta::to_data_string`]
    pub fn from_data_string(data: &str) -> Result<Self> {
        MetaCodec.decode(&decode_from_string(data)?)
    }
}

/// Codec for [`Meta`]: `clazz` plus the `timestampMeta|<field>` section
#[derive(Clone, Copy, Debug, Default)]
pub struct MetaCodec;

impl MapCodec<Meta> for MetaCodec {
    fn encode(&self, value: &Meta) -> EncodedForm {
        Encoder::new()
            .primitive(CLAZZ_KEY, &value.clazz)
            .section(TIMESTAMP_META_KEY, &value.timestamp_meta)
            .finish()
    }

    fn decode(&self, map: &EncodedForm) -> Result<Meta> {
        let d = Decoder::new(map);
        Ok(Meta {
            clazz: d.primitive(CLAZZ_KEY)?,
            timestamp_meta: d.section(TIMESTAMP_META_KEY).into_iter().collect(),
        })
    }
}
