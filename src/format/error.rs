//! Error types for value parsing.

use thiserror::Error;

/// Errors from [`ValueFormatter::parse`](super::ValueFormatter::parse).
#[derive(Debug, Error)]
pub enum FormatError {
    /// A `{"hex": ...}` value is not valid hexadecimal.
    #[error("attribute {attribute}: invalid hex: {source}")]
    InvalidHex {
        attribute: String,
        #[source]
        source: hex::FromHexError,
    },

    /// The value does not fit the attribute's type.
    #[error("attribute {attribute}: {value} is out of range for {type_name}")]
    OutOfRange {
        attribute: String,
        type_name: String,
        value: String,
    },

    /// The value's kind cannot be stored in the attribute's type.
    #[error("attribute {attribute}: cannot store {found} value in {type_name}")]
    TypeMismatch {
        attribute: String,
        type_name: String,
        found: &'static str,
    },

    /// A value list has a different length than the catalog.
    #[error("expected {expected} values, got {actual}")]
    FieldCount { expected: usize, actual: usize },
}
