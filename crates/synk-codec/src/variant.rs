//! Tagged-union support
//!
//! A variant value is encoded as its active alternative's form, unprefixed,
//! plus the reserved `*type` key holding the alternative's ordinal. Only
//! one alternative is ever active, so the unprefixed keys cannot collide.
//!
//! A sealed `Shape` with alternatives `Circle` (0) and `Square` (1) is
//! written as a plain `match`:
//!
//! ```
//! use synk_codec::{CodecError, Decoder, EncodedForm, Encoder, MapCodec, Result};
//! use synk_codec::variant::{VariantPolicy, tag_variant};
//!
//! enum Shape {
//!     Circle { r: u32 },
//!     Square { side: u32 },
//! }
//!
//! struct ShapeCodec;
//!
//! impl MapCodec<Shape> for ShapeCodec {
//!     fn encode(&self, value: &Shape) -> EncodedForm {
//!         match value {
//!             Shape::Circle { r } => tag_variant(0, Encoder::new().primitive("r", r).finish()),
//!             Shape::Square { side } => {
//!                 tag_variant(1, Encoder::new().primitive("side", side).finish())
//!             }
//!         }
//!     }
//!
//!     fn decode(&self, map: &EncodedForm) -> Result<Shape> {
//!         let d = Decoder::new(map);
//!         match d.variant_ordinal(VariantPolicy::Strict)? {
//!             0 => Ok(Shape::Circle { r: d.primitive("r")? }),
//!             1 => Ok(Shape::Square { side: d.primitive("side")? }),
//!             other => Err(CodecError::unknown_variant(other)),
//!         }
//!     }
//! }
//!
//! let encoded = ShapeCodec.encode(&Shape::Square { side: 3 });
//! assert_eq!(encoded["*type"], "1");
//! assert!(matches!(ShapeCodec.decode(&encoded), Ok(Shape::Square { side: 3 })));
//! ```

use crate::codec::{Decoder, EncodedForm};
use crate::error::{CodecError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Reserved key holding the active alternative's ordinal
pub const TYPE_KEY: &str = "*type";

/// How to treat a missing or non-integer `*type` entry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantPolicy {
    /// Fall back to the first alternative (ordinal 0) and log a warning;
    /// keeps compatibility with peers that wrote forms this way
    #[default]
    Lenient,
    /// Fail with `MissingField` / `MalformedScalar`
    Strict,
}

/// Add the `*type` discriminant to an alternative's form
#[must_use]
pub fn tag_variant(ordinal: u32, mut form: EncodedForm) -> EncodedForm {
    form.insert(TYPE_KEY.to_string(), ordinal.to_string());
    form
}

impl Decoder<'_> {
    /// Read the active alternative's ordinal
    ///
    /// An integer that is negative or out of range is an `UnknownVariant`
    /// under either policy, since it can never name an alternative.
    pub fn variant_ordinal(&self, policy: VariantPolicy) -> Result<u32> {
        let Some(raw) = self.form().get(TYPE_KEY) else {
            return match policy {
                VariantPolicy::Strict => Err(CodecError::missing(TYPE_KEY)),
                VariantPolicy::Lenient => {
                    warn!("variant form has no {TYPE_KEY}, decoding as ordinal 0");
                    Ok(0)
                }
            };
        };

        match raw.parse::<i64>() {
            Ok(ordinal) => u32::try_from(ordinal).map_err(|_| CodecError::unknown_variant(ordinal)),
            Err(_) => match policy {
                VariantPolicy::Strict => Err(CodecError::malformed(TYPE_KEY, raw.as_str())),
                VariantPolicy::Lenient => {
                    warn!(raw = %raw, "unparsable {TYPE_KEY}, decoding as ordinal 0");
                    Ok(0)
                }
            },
        }
    }
}
