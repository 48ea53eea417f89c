//! Synk structural map codec
//!
//! Flattens typed records into a canonical string-keyed map for transport
//! and storage, and carries the per-record [`Meta`] that a merge layer uses
//! to order concurrent field writes.
//!
//! Codecs are composed by hand from [`Encoder`] / [`Decoder`] calls and the
//! collection codecs; there is no reflection.

pub mod codec;
pub mod collection;
pub mod error;
pub mod meta;
pub mod registry;
pub mod scalar;
pub mod variant;

pub use codec::{
    Decoder, EncodedForm, Encoder, MapCodec, SEPARATOR, decode_from_string, encode_to_string,
    prefixed, section,
};
pub use collection::{HashMapCodec, ListCodec, ScalarCodec, SetCodec};
pub use error::{CodecError, Result};
pub use meta::{Meta, MetaCodec};
pub use registry::CodecRegistry;
pub use scalar::{Scalar, StringSerializer};
pub use variant::{TYPE_KEY, VariantPolicy, tag_variant};

#[cfg(test)]
mod tests {
    use super::*;
    use rand::distributions::Alphanumeric;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::{HashMap, HashSet};

    #[derive(Debug, Clone, PartialEq)]
    enum Body {
        Text { text: String },
        Checklist { items: Vec<Item> },
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        label: String,
        done: bool,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: u64,
        title: String,
        pinned: Option<bool>,
        tags: HashSet<String>,
        body: Body,
        counters: HashMap<String, i32>,
    }

    struct ItemCodec;

    impl MapCodec<Item> for ItemCodec {
        fn encode(&self, value: &Item) -> EncodedForm {
            Encoder::new()
                .primitive("label", &value.label)
                .primitive("done", &value.done)
                .finish()
        }

        fn decode(&self, map: &EncodedForm) -> Result<Item> {
            let d = Decoder::new(map);
            Ok(Item {
                label: d.primitive("label")?,
                done: d.primitive("done")?,
            })
        }
    }

    struct BodyCodec {
        items: ListCodec<Item, ItemCodec>,
    }

    impl MapCodec<Body> for BodyCodec {
        fn encode(&self, value: &Body) -> EncodedForm {
            match value {
                Body::Text { text } => tag_variant(0, Encoder::new().primitive("text", text).finish()),
                Body::Checklist { items } => tag_variant(
                    1,
                    Encoder::new().nested("items", &self.items, items).finish(),
                ),
            }
        }

        fn decode(&self, map: &EncodedForm) -> Result<Body> {
            let d = Decoder::new(map);
            match d.variant_ordinal(VariantPolicy::Strict)? {
                0 => Ok(Body::Text {
                    text: d.primitive("text")?,
                }),
                1 => Ok(Body::Checklist {
                    items: d.nested("items", &self.items)?,
                }),
                other => Err(CodecError::unknown_variant(other)),
            }
        }
    }

    struct NoteCodec {
        tags: SetCodec<String, ScalarCodec<String>>,
        body: BodyCodec,
        counters: HashMapCodec<i32, ScalarCodec<i32>>,
    }

    impl NoteCodec {
        fn new() -> Self {
            Self {
                tags: SetCodec::scalars(),
                body: BodyCodec {
                    items: ListCodec::new(ItemCodec),
                },
                counters: HashMapCodec::scalars(),
            }
        }
    }

    impl MapCodec<Note> for NoteCodec {
        fn encode(&self, value: &Note) -> EncodedForm {
            Encoder::new()
                .primitive("id", &value.id)
                .primitive("title", &value.title)
                .optional("pinned", value.pinned.as_ref())
                .nested("tags", &self.tags, &value.tags)
                .nested("body", &self.body, &value.body)
                .nested("counters", &self.counters, &value.counters)
                .finish()
        }

        fn decode(&self, map: &EncodedForm) -> Result<Note> {
            let d = Decoder::new(map);
            Ok(Note {
                id: d.primitive("id")?,
                title: d.primitive("title")?,
                pinned: d.optional("pinned")?,
                tags: d.nested("tags", &self.tags)?,
                body: d.nested("body", &self.body)?,
                counters: d.nested("counters", &self.counters)?,
            })
        }
    }

    fn word(rng: &mut StdRng) -> String {
        let len = rng.gen_range(1..12);
        (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
    }

    fn random_note(rng: &mut StdRng) -> Note {
        let body = if rng.gen_bool(0.5) {
            Body::Text {
                text: format!("{} | *type {}", word(rng), word(rng)),
            }
        } else {
            let count = rng.gen_range(0..15);
            Body::Checklist {
                items: (0..count)
                    .map(|_| Item {
                        label: word(rng),
                        done: rng.gen_bool(0.3),
                    })
                    .collect(),
            }
        };
        Note {
            id: rng.gen_range(0..u64::MAX),
            title: word(rng),
            pinned: if rng.gen_bool(0.5) {
                Some(rng.gen_bool(0.5))
            } else {
                None
            },
            tags: (0..rng.gen_range(0..6)).map(|_| word(rng)).collect(),
            body,
            counters: (0..rng.gen_range(0..6))
                .map(|_| (word(rng), rng.gen_range(-1000..1000)))
                .collect(),
        }
    }

    #[test]
    fn test_randomized_round_trip() {
        let codec = NoteCodec::new();
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..200 {
            let note = random_note(&mut rng);
            let encoded = codec.encode(&note);
            let decoded = codec.decode(&encoded).unwrap();
            assert_eq!(decoded, note);
            assert_eq!(codec.encode(&decoded), encoded);

            let data = encode_to_string(&encoded).unwrap();
            assert_eq!(decode_from_string(&data).unwrap(), encoded);
        }
    }

    #[test]
    fn test_nested_list_in_variant_keys() {
        let codec = NoteCodec::new();
        let note = Note {
            id: 7,
            title: "groceries".to_string(),
            pinned: None,
            tags: HashSet::new(),
            body: Body::Checklist {
                items: vec![Item {
                    label: "milk".to_string(),
                    done: true,
                }],
            },
            counters: HashMap::new(),
        };
        let encoded = codec.encode(&note);
        assert_eq!(encoded.get("body|*type").map(String::as_str), Some("1"));
        assert_eq!(encoded.get("body|items|0|label").map(String::as_str), Some("milk"));

        let mut broken = encoded;
        broken.remove("body|items|0|done");
        let err = codec.decode(&broken).unwrap_err();
        assert_eq!(err.key(), Some("body|items|0|done"));
    }

    #[test]
    fn test_meta_from_encoded_note() {
        let codec = NoteCodec::new();
        let mut rng = StdRng::seed_from_u64(42);
        let encoded = codec.encode(&random_note(&mut rng));
        let meta = Meta::from_encoded(std::any::type_name::<Note>(), &encoded, "t1");
        let restored = Meta::from_data_string(&meta.to_data_string().unwrap()).unwrap();
        assert_eq!(restored, meta);
        assert_eq!(restored.len(), encoded.len());
    }
}
