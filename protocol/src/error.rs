//! Error types for the transaction codec.
//!
//! Every stage of the parse → pack → hash → sign pipeline returns a
//! [`CodecError`]. The variants map one-to-one onto the failure classes a
//! caller has to tell apart: bad input text, out-of-bound values, malformed
//! key or signature encodings, failed verification, and hash faults.

use std::fmt;

use thiserror::Error;

/// Errors produced while decoding, packing, hashing, signing or validating
/// a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A request field is missing, has the wrong JSON type, or is not a
    /// well-formed decimal string.
    #[error("cannot parse {field}: {reason}")]
    Parse {
        /// Name of the offending request field.
        field: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A value falls outside the protocol bound for its field.
    #[error("{field} {violation}")]
    Range {
        /// Name of the offending field.
        field: String,
        /// The bound that was violated.
        violation: RangeViolation,
    },

    /// A public key or signature could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The signature does not verify, or the signing scheme faulted.
    #[error("signature error: {0}")]
    Signature(String),

    /// The hash function rejected its input.
    #[error("hash error: {0}")]
    Hash(String),
}

impl CodecError {
    pub(crate) fn parse(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn range(field: impl Into<String>, violation: RangeViolation) -> Self {
        Self::Range {
            field: field.into(),
            violation,
        }
    }

    /// Name of the field the error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Parse { field, .. } | Self::Range { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Which bound a [`CodecError::Range`] violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeViolation {
    /// An amount-bearing field was never populated.
    Unset,
    /// The value is below the inclusive lower bound (carried as a decimal string).
    BelowMin(String),
    /// The value is above the inclusive upper bound (carried as a decimal string).
    AboveMax(String),
    /// A negative identifier reached the preimage builder.
    Negative(i64),
    /// The amount is larger than any packed word can express.
    Unrepresentable(String),
    /// The amount is in range but packing would round it down to the
    /// carried value.
    Imprecise(String),
}

impl fmt::Display for RangeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(f, "is unset"),
            Self::BelowMin(min) => write!(f, "should not be less than {}", min),
            Self::AboveMax(max) => write!(f, "should not be larger than {}", max),
            Self::Negative(v) => write!(f, "cannot be encoded: negative value {}", v),
            Self::Unrepresentable(max) => {
                write!(f, "exceeds the largest packable value {}", max)
            }
            Self::Imprecise(packed) => {
                write!(f, "is not exactly packable, would sign as {}", packed)
            }
        }
    }
}
