//! Error types for tuple decoding and encoding.

use thiserror::Error;

/// Errors from [`TupleCodec`](super::TupleCodec).
#[derive(Debug, Error)]
pub enum TupleError {
    /// The catalog describes more attributes than the tuple stores.
    #[error("catalog has {catalog} attributes but the tuple stores {natts}")]
    CatalogMismatch { catalog: usize, natts: usize },

    /// Update supplied a different number of values than the catalog has.
    #[error("expected {expected} values, got {actual}")]
    ValueCount { expected: usize, actual: usize },

    /// A fixed-width value has the wrong number of bytes.
    #[error("attribute {attribute} ({name}): expected {expected} bytes, got {actual}")]
    ValueLength {
        attribute: usize,
        name: String,
        expected: usize,
        actual: usize,
    },

    /// A C string value contains an embedded zero byte.
    #[error("attribute {attribute} ({name}): cstring value contains a zero byte")]
    InvalidCString { attribute: usize, name: String },

    /// External (TOAST) or compressed varlena.
    #[error("attribute {attribute} at offset {offset}: {form} varlena values are not supported")]
    UnsupportedVarlena {
        attribute: usize,
        offset: usize,
        form: &'static str,
    },

    /// Decoding would read past the end of the tuple.
    #[error("{what} at offset {offset} needs {needed} bytes but the tuple ends at {tuple_len}")]
    AttributeOverrun {
        /// What was being read, e.g. `"attribute 2"` or `"tuple header"`.
        what: String,
        offset: usize,
        needed: usize,
        tuple_len: usize,
    },

    /// `t_hoff` disagrees with the header and bitmap sizes.
    #[error("t_hoff {hoff} is invalid: header and null bitmap need {minimum} bytes, tuple is {tuple_len}")]
    InvalidHeaderLength {
        hoff: usize,
        minimum: usize,
        tuple_len: usize,
    },

    /// The encoded tuple, or one varlena value, exceeds its size limit.
    #[error("encoded {what} is {length} bytes, limit is {limit}")]
    EncodingOverflow {
        what: &'static str,
        length: usize,
        limit: usize,
    },
}
