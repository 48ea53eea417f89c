//! Structural map codec
//!
//! A record is flattened into an [`EncodedForm`]: a map from string key to
//! string value. Key namespacing:
//!
//! - a primitive field `f` is stored under `f`
//! - a composite or collection field `f` contributes its nested keys as `f|<key>`
//! - a variant adds `*type` and keeps its alternative's keys unprefixed
//!
//! Field names and element keys must not contain `|`; inputs that do are
//! outside the codec's contract.

use crate::error::{CodecError, Result};
use crate::scalar::{Scalar, StringSerializer, parse_scalar};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Flat string-keyed representation of a record
pub type EncodedForm = BTreeMap<String, String>;

/// Separator between a field name and its nested keys
pub const SEPARATOR: char = '|';

/// Reversible encode/decode pair for one record shape
///
/// `decode(&encode(r))` must equal `r`, and `encode` must be deterministic
/// for a fixed codec composition.
pub trait MapCodec<T>: Send + Sync {
    /// Flatten a value; never fails
    fn encode(&self, value: &T) -> EncodedForm;

    /// Rebuild a value from its flat form
    fn decode(&self, map: &EncodedForm) -> Result<T>;
}

impl<T, C: MapCodec<T> + ?Sized> MapCodec<T> for Arc<C> {
    fn encode(&self, value: &T) -> EncodedForm {
        (**self).encode(value)
    }

    fn decode(&self, map: &EncodedForm) -> Result<T> {
        (**self).decode(map)
    }
}

/// Join a field name and a nested key; an empty nested key maps to the field itself
#[must_use]
pub fn prefixed(field: &str, key: &str) -> String {
    if key.is_empty() {
        return field.to_string();
    }
    let mut out = String::with_capacity(field.len() + key.len() + 1);
    out.push_str(field);
    out.push(SEPARATOR);
    out.push_str(key);
    out
}

/// Entries nested under `field`, with the `field|` prefix stripped once
///
/// An entry stored under `field` itself is returned under the empty key.
#[must_use]
pub fn section(map: &EncodedForm, field: &str) -> EncodedForm {
    map.iter()
        .filter_map(|(key, value)| {
            let rest = key.strip_prefix(field)?;
            if rest.is_empty() {
                return Some((String::new(), value.clone()));
            }
            let rest = rest.strip_prefix(SEPARATOR)?;
            Some((rest.to_string(), value.clone()))
        })
        .collect()
}

/// Marker key for an element whose own encoding is empty: `<element-key>|`
pub(crate) fn presence_key(element_key: &str) -> String {
    let mut out = String::with_capacity(element_key.len() + 1);
    out.push_str(element_key);
    out.push(SEPARATOR);
    out
}

/// Split an element-space map into per-element groups keyed by the first segment
///
/// A presence marker opens its element's group without adding an entry.
pub(crate) fn group_elements(map: &EncodedForm) -> BTreeMap<String, EncodedForm> {
    let mut groups: BTreeMap<String, EncodedForm> = BTreeMap::new();
    for (key, value) in map {
        match key.split_once(SEPARATOR) {
            Some((element, "")) => {
                groups.entry(element.to_string()).or_default();
            }
            Some((element, rest)) => {
                groups
                    .entry(element.to_string())
                    .or_default()
                    .insert(rest.to_string(), value.clone());
            }
            None => {
                groups
                    .entry(key.clone())
                    .or_default()
                    .insert(String::new(), value.clone());
            }
        }
    }
    groups
}

/// Serialize an encoded form to the string stored by durable backends
pub fn encode_to_string(form: &EncodedForm) -> Result<String> {
    Ok(serde_json::to_string(form)?)
}

/// Parse a string produced by [`encode_to_string`]
pub fn decode_from_string(data: &str) -> Result<EncodedForm> {
    Ok(serde_json::from_str(data)?)
}

/// Builder for a record's encoded form
#[derive(Debug, Default)]
pub struct Encoder {
    map: EncodedForm,
}

impl Encoder {
    /// Start an empty form
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a primitive leaf
    #[must_use]
    pub fn primitive<T: Scalar>(mut self, key: &str, value: &T) -> Self {
        self.map.insert(key.to_string(), value.to_scalar());
        self
    }

    /// Write an optional primitive leaf; `None` writes nothing
    #[must_use]
    pub fn optional<T: Scalar>(self, key: &str, value: Option<&T>) -> Self {
        match value {
            Some(value) => self.primitive(key, value),
            None => self,
        }
    }

    /// Write a leaf through a custom serializer
    #[must_use]
    pub fn serialized<T, S>(mut self, key: &str, serializer: &S, value: &T) -> Self
    where
        S: StringSerializer<T> + ?Sized,
    {
        self.map.insert(key.to_string(), serializer.serialize(value));
        self
    }

    /// Delegate a composite or collection field to its codec, prefixing with `field|`
    #[must_use]
    pub fn nested<T, C>(mut self, field: &str, codec: &C, value: &T) -> Self
    where
        C: MapCodec<T> + ?Sized,
    {
        for (key, value) in codec.encode(value) {
            self.map.insert(prefixed(field, &key), value);
        }
        self
    }

    /// Embed raw string entries under `field|`
    #[must_use]
    pub fn section<'a, I>(mut self, field: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (key, value) in entries {
            self.map.insert(prefixed(field, key), value.clone());
        }
        self
    }

    /// Merge another form without prefixing
    #[must_use]
    pub fn merge(mut self, form: EncodedForm) -> Self {
        self.map.extend(form);
        self
    }

    /// Finish and return the form
    #[must_use]
    pub fn finish(self) -> EncodedForm {
        self.map
    }
}

/// Read side of a record's encoded form
#[derive(Clone, Copy, Debug)]
pub struct Decoder<'a> {
    map: &'a EncodedForm,
}

impl<'a> Decoder<'a> {
    /// Wrap an encoded form
    #[must_use]
    pub const fn new(map: &'a EncodedForm) -> Self {
        Self { map }
    }

    /// The underlying form
    #[must_use]
    pub const fn form(&self) -> &'a EncodedForm {
        self.map
    }

    /// Raw string under `key`, failing if absent
    pub fn raw(&self, key: &str) -> Result<&'a str> {
        self.map
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| CodecError::missing(key))
    }

    /// Read a required primitive leaf
    pub fn primitive<T: Scalar>(&self, key: &str) -> Result<T> {
        parse_scalar(key, self.raw(key)?)
    }

    /// Read an optional primitive leaf
    pub fn optional<T: Scalar>(&self, key: &str) -> Result<Option<T>> {
        self.map
            .get(key)
            .map(|raw| parse_scalar(key, raw))
            .transpose()
    }

    /// Read a leaf through a custom serializer
    pub fn serialized<T, S>(&self, key: &str, serializer: &S) -> Result<T>
    where
        S: StringSerializer<T> + ?Sized,
    {
        let raw = self.raw(key)?;
        serializer
            .deserialize(raw)
            .ok_or_else(|| CodecError::malformed(key, raw))
    }

    /// Decode a composite or collection field from the `field|` entries
    pub fn nested<T, C>(&self, field: &str, codec: &C) -> Result<T>
    where
        C: MapCodec<T> + ?Sized,
    {
        codec
            .decode(&section(self.map, field))
            .map_err(|e| e.with_prefix(field))
    }

    /// Raw entries under `field|`, prefix stripped
    #[must_use]
    pub fn section(&self, field: &str) -> EncodedForm {
        section(self.map, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Foo {
        bar: String,
        baz: i32,
        bim: bool,
    }

    struct FooCodec;

    impl MapCodec<Foo> for FooCodec {
        fn encode(&self, value: &Foo) -> EncodedForm {
            Encoder::new()
                .primitive("bar", &value.bar)
                .primitive("baz", &value.baz)
                .primitive("bim", &value.bim)
                .finish()
        }

        fn decode(&self, map: &EncodedForm) -> Result<Foo> {
            let d = Decoder::new(map);
            Ok(Foo {
                bar: d.primitive("bar")?,
                baz: d.primitive("baz")?,
                bim: d.primitive("bim")?,
            })
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Bar {
        bim: String,
    }

    struct BarCodec;

    impl MapCodec<Bar> for BarCodec {
        fn encode(&self, value: &Bar) -> EncodedForm {
            Encoder::new().primitive("bim", &value.bim).finish()
        }

        fn decode(&self, map: &EncodedForm) -> Result<Bar> {
            Ok(Bar {
                bim: Decoder::new(map).primitive("bim")?,
            })
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Outer {
        bar: Bar,
        baz: String,
        note: Option<u32>,
    }

    struct OuterCodec {
        bar: BarCodec,
    }

    impl MapCodec<Outer> for OuterCodec {
        fn encode(&self, value: &Outer) -> EncodedForm {
            Encoder::new()
                .primitive("baz", &value.baz)
                .optional("note", value.note.as_ref())
                .nested("bar", &self.bar, &value.bar)
                .finish()
        }

        fn decode(&self, map: &EncodedForm) -> Result<Outer> {
            let d = Decoder::new(map);
            Ok(Outer {
                bar: d.nested("bar", &self.bar)?,
                baz: d.primitive("baz")?,
                note: d.optional("note")?,
            })
        }
    }

    fn form(entries: &[(&str, &str)]) -> EncodedForm {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_primitive_record_scenario() {
        let foo = Foo {
            bar: "x".to_string(),
            baz: 5,
            bim: true,
        };
        let encoded = FooCodec.encode(&foo);
        assert_eq!(
            encoded,
            form(&[("bar", "x"), ("baz", "5"), ("bim", "true")])
        );
        assert_eq!(FooCodec.decode(&encoded).unwrap(), foo);
        assert_eq!(FooCodec.encode(&FooCodec.decode(&encoded).unwrap()), encoded);
    }

    #[test]
    fn test_composite_record_scenario() {
        let codec = OuterCodec { bar: BarCodec };
        let outer = Outer {
            bar: Bar {
                bim: "y".to_string(),
            },
            baz: "z".to_string(),
            note: None,
        };
        let encoded = codec.encode(&outer);
        assert_eq!(encoded, form(&[("baz", "z"), ("bar|bim", "y")]));
        assert_eq!(codec.decode(&encoded).unwrap(), outer);
    }

    #[test]
    fn test_optional_present() {
        let codec = OuterCodec { bar: BarCodec };
        let outer = Outer {
            bar: Bar { bim: String::new() },
            baz: "z".to_string(),
            note: Some(3),
        };
        let encoded = codec.encode(&outer);
        assert_eq!(encoded.get("note").map(String::as_str), Some("3"));
        assert_eq!(codec.decode(&encoded).unwrap(), outer);
    }

    #[test]
    fn test_missing_primitive_names_key() {
        for missing in ["bar", "baz", "bim"] {
            let mut encoded = form(&[("bar", "x"), ("baz", "5"), ("bim", "true")]);
            encoded.remove(missing);
            let err = FooCodec.decode(&encoded).unwrap_err();
            assert!(err.is_missing_field());
            assert_eq!(err.key(), Some(missing));
        }
    }

    #[test]
    fn test_missing_nested_key_reports_path() {
        let codec = OuterCodec { bar: BarCodec };
        let err = codec.decode(&form(&[("baz", "z")])).unwrap_err();
        assert_eq!(err.key(), Some("bar|bim"));
    }

    #[test]
    fn test_malformed_scalar() {
        let err = FooCodec
            .decode(&form(&[("bar", "x"), ("baz", "five"), ("bim", "true")]))
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::MalformedScalar { ref key, ref raw } if key == "baz" && raw == "five"
        ));
    }

    #[test]
    fn test_section_matches_whole_field_name() {
        let map = form(&[("bar|bim", "1"), ("barn|bim", "2"), ("foobar|bim", "3"), ("bar", "4")]);
        assert_eq!(section(&map, "bar"), form(&[("bim", "1"), ("", "4")]));
    }

    #[test]
    fn test_section_strips_once() {
        let map = form(&[("timestampMeta|bar|bim", "t1")]);
        assert_eq!(section(&map, "timestampMeta"), form(&[("bar|bim", "t1")]));
    }

    #[test]
    fn test_field_prefix_claims_sibling_keys() {
        let codec = OuterCodec { bar: BarCodec };
        let outer = Outer {
            bar: Bar {
                bim: "y".to_string(),
            },
            baz: "z".to_string(),
            note: None,
        };
        let mut encoded = codec.encode(&outer);
        encoded.insert("bar|x".to_string(), "stray".to_string());

        // Any key under `bar|` belongs to `bar`, whoever wrote it
        assert_eq!(section(&encoded, "bar"), form(&[("bim", "y"), ("x", "stray")]));
        let entries = crate::collection::HashMapCodec::<String, _>::scalars();
        let claimed: std::collections::HashMap<String, String> =
            Decoder::new(&encoded).nested("bar", &entries).unwrap();
        assert_eq!(claimed.len(), 2);
        assert_eq!(claimed.get("x").map(String::as_str), Some("stray"));
        assert_eq!(codec.decode(&encoded).unwrap(), outer);
    }

    #[test]
    fn test_group_elements_presence_marker() {
        let map = form(&[("0|", ""), ("1", "a"), ("2|x", "b"), ("2|y|", "")]);
        let groups = group_elements(&map);
        assert_eq!(groups.len(), 3);
        assert!(groups["0"].is_empty());
        assert_eq!(groups["1"], form(&[("", "a")]));
        assert_eq!(groups["2"], form(&[("x", "b"), ("y|", "")]));
    }

    #[test]
    fn test_prefixed() {
        assert_eq!(prefixed("bar", "bim"), "bar|bim");
        assert_eq!(prefixed("bar", ""), "bar");
    }

    #[test]
    fn test_string_form_round_trip() {
        let encoded = form(&[("bar|bim", "y"), ("baz", "with \"quotes\"")]);
        let data = encode_to_string(&encoded).unwrap();
        assert_eq!(decode_from_string(&data).unwrap(), encoded);
        assert!(decode_from_string("not json").is_err());
    }

    #[test]
    fn test_serialized_leaf() {
        struct Millis;

        impl StringSerializer<std::time::Duration> for Millis {
            fn serialize(&self, value: &std::time::Duration) -> String {
                value.as_millis().to_string()
            }

            fn deserialize(&self, raw: &str) -> Option<std::time::Duration> {
                raw.parse().ok().map(std::time::Duration::from_millis)
            }
        }

        let timeout = std::time::Duration::from_millis(1500);
        let encoded = Encoder::new().serialized("timeout", &Millis, &timeout).finish();
        assert_eq!(encoded, form(&[("timeout", "1500")]));

        let decoded: std::time::Duration =
            Decoder::new(&encoded).serialized("timeout", &Millis).unwrap();
        assert_eq!(decoded, timeout);

        let err = Decoder::new(&form(&[("timeout", "soon")]))
            .serialized::<std::time::Duration, _>("timeout", &Millis)
            .unwrap_err();
        assert_eq!(err.key(), Some("timeout"));
    }
}
