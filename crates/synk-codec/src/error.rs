//! Decode-time error types for the map codec

use thiserror::Error;

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors raised while decoding an encoded form
///
/// Every variant is fatal to the decode call that raised it; no partial
/// record is ever returned.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("missing field: {key}")]
    MissingField { key: String },

    #[error("malformed value for {key}: {raw:?}")]
    MalformedScalar { key: String, raw: String },

    #[error("unknown variant ordinal: {ordinal}")]
    UnknownVariant { ordinal: i64 },

    #[error("no codec registered for {type_name}")]
    Unregistered { type_name: &'static str },

    #[error("encoded form serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CodecError {
    /// Create a missing field error
    pub fn missing(key: impl Into<String>) -> Self {
        Self::MissingField { key: key.into() }
    }

    /// Create a malformed scalar error
    pub fn malformed(key: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::MalformedScalar {
            key: key.into(),
            raw: raw.into(),
        }
    }

    /// Create an unknown variant error
    pub fn unknown_variant(ordinal: impl Into<i64>) -> Self {
        Self::UnknownVariant {
            ordinal: ordinal.into(),
        }
    }

    /// Re-root the key of this error under an enclosing field
    #[must_use]
    pub fn with_prefix(self, field: &str) -> Self {
        match self {
            Self::MissingField { key } => Self::MissingField {
                key: crate::codec::prefixed(field, &key),
            },
            Self::MalformedScalar { key, raw } => Self::MalformedScalar {
                key: crate::codec::prefixed(field, &key),
                raw,
            },
            other => other,
        }
    }

    /// Key the error refers to, if any
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::MissingField { key } | Self::MalformedScalar { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Check if this is a missing field error
    #[must_use]
    pub fn is_missing_field(&self) -> bool {
        matches!(self, Self::MissingField { .. })
    }
}
