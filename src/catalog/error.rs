//! Catalog-specific errors.

use thiserror::Error;

/// Errors raised while building a [`TypeCatalog`](super::TypeCatalog).
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A CSV record does not have exactly four fields.
    #[error("catalog record {record}: expected 4 fields (name,type,length,align), found {found}")]
    FieldCount { record: usize, found: usize },

    /// An attribute has an empty name.
    #[error("catalog record {record}: attribute name is empty")]
    EmptyName { record: usize },

    /// Length is not a positive integer, -1 or -2.
    #[error("attribute {name:?}: invalid length {value:?} (expected > 0, -1 or -2)")]
    InvalidLength { name: String, value: String },

    /// Alignment is not one of `c`, `s`, `i`, `d`.
    #[error("attribute {name:?}: invalid alignment {value:?} (expected c, s, i or d)")]
    InvalidAlignment { name: String, value: String },

    /// The same attribute name appears twice.
    #[error("attribute {0:?} is defined more than once")]
    DuplicateName(String),
}
