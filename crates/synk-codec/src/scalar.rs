//! String conversion for primitive leaves
//!
//! A scalar has exactly one canonical string form and must round-trip
//! through it: `T::from_scalar(&v.to_scalar()) == Some(v)`.

use crate::error::{CodecError, Result};

/// A primitive value with a canonical string representation
pub trait Scalar: Sized {
    /// Canonical string form
    fn to_scalar(&self) -> String;

    /// Parse the canonical string form, `None` when malformed
    fn from_scalar(raw: &str) -> Option<Self>;
}

macro_rules! impl_scalar_via_from_str {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                fn to_scalar(&self) -> String {
                    self.to_string()
                }

                fn from_scalar(raw: &str) -> Option<Self> {
                    raw.parse().ok()
                }
            }
        )*
    };
}

// `bool` parses only "true" and "false"; floats print their shortest
// round-tripping representation.
impl_scalar_via_from_str!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
);

impl Scalar for String {
    fn to_scalar(&self) -> String {
        self.clone()
    }

    fn from_scalar(raw: &str) -> Option<Self> {
        Some(raw.to_owned())
    }
}

/// Parse `raw` as the value stored under `key`
pub fn parse_scalar<T: Scalar>(key: &str, raw: &str) -> Result<T> {
    T::from_scalar(raw).ok_or_else(|| CodecError::malformed(key, raw))
}

/// Custom string conversion for leaf types without a [`Scalar`] impl
///
/// Lets a codec choose a representation per field, e.g. a duration stored
/// as milliseconds in one record and as seconds in another.
pub trait StringSerializer<T>: Send + Sync {
    /// Convert the value to its stored string
    fn serialize(&self, value: &T) -> String;

    /// Parse a stored string, `None` when malformed
    fn deserialize(&self, raw: &str) -> Option<T>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<T: Scalar + PartialEq + std::fmt::Debug>(value: T) {
        let raw = value.to_scalar();
        assert_eq!(T::from_scalar(&raw), Some(value), "raw = {raw}");
    }

    #[test]
    fn test_integer_round_trip() {
        round_trip(0i32);
        round_trip(i64::MIN);
        round_trip(u64::MAX);
        round_trip(-7i8);
        round_trip(u128::MAX);
    }

    #[test]
    fn test_float_round_trip() {
        round_trip(0.1f64);
        round_trip(-1.5e300f64);
        round_trip(f64::MIN_POSITIVE);
        round_trip(3.25f32);
        round_trip(f64::INFINITY);
        assert!(f64::from_scalar(&f64::NAN.to_scalar()).unwrap().is_nan());
    }

    #[test]
    fn test_bool_is_strict() {
        assert_eq!(true.to_scalar(), "true");
        assert_eq!(bool::from_scalar("false"), Some(false));
        assert_eq!(bool::from_scalar("TRUE"), None);
        assert_eq!(bool::from_scalar("1"), None);
    }

    #[test]
    fn test_text_round_trip() {
        round_trip(String::new());
        round_trip("with|pipe and *type".to_string());
        round_trip('λ');
        assert_eq!(char::from_scalar("ab"), None);
    }

    #[test]
    fn test_parse_scalar_reports_key() {
        let err = parse_scalar::<i32>("baz", "five").unwrap_err();
        match err {
            CodecError::MalformedScalar { key, raw } => {
                assert_eq!(key, "baz");
                assert_eq!(raw, "five");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(parse_scalar::<u8>("n", "255").unwrap(), 255);
        assert!(parse_scalar::<u8>("n", "256").is_err());
    }
}
