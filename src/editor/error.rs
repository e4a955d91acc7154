//! Editor-level errors.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::format::FormatError;
use crate::heap::HeapError;
use crate::storage::StorageError;
use crate::tuple::TupleError;

/// Errors returned by [`FilenodeEditor`](super::FilenodeEditor) operations.
///
/// Every variant is raised before anything is written, so a failed
/// operation leaves the filenode untouched.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Page index is past the end of the filenode.
    #[error("page {page} not found: filenode has {page_count} pages")]
    PageNotFound { page: u64, page_count: usize },

    /// Page parsing or line pointer lookup failed.
    #[error("page {page}: {source}")]
    Heap {
        page: u64,
        #[source]
        source: HeapError,
    },

    /// Tuple decoding or encoding failed.
    #[error("page {page} item {item}: {source}")]
    Tuple {
        page: u64,
        item: usize,
        #[source]
        source: TupleError,
    },

    /// A supplied field value could not be parsed.
    #[error("page {page} item {item}: {source}")]
    Format {
        page: u64,
        item: usize,
        #[source]
        source: FormatError,
    },

    /// Typed update was requested without a type catalog.
    #[error("typed update requires a type catalog")]
    CatalogRequired,

    #[error("invalid type catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The requested output path is the filenode being edited.
    #[error("output {} is the input filenode", .0.display())]
    SameFile(PathBuf),

    /// Staging or committing an output copy failed.
    #[error("output {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Coarse classification of an [`EditorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    MalformedPage,
    ItemNotFound,
    CatalogMismatch,
    UnsupportedVarlena,
    AttributeOverrun,
    EncodingOverflow,
    SizeMismatch,
    InvalidCatalog,
    InvalidValue,
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl EditorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EditorError::PageNotFound { .. } => ErrorKind::ItemNotFound,
            EditorError::Heap { source, .. } => match source {
                HeapError::MalformedPage(_) | HeapError::ItemOutOfBounds { .. } => {
                    ErrorKind::MalformedPage
                }
                HeapError::ItemOutOfRange { .. } | HeapError::NoStorage { .. } => {
                    ErrorKind::ItemNotFound
                }
                HeapError::SizeMismatch { .. } => ErrorKind::SizeMismatch,
                HeapError::PageFull { .. } => ErrorKind::EncodingOverflow,
            },
            EditorError::Tuple { source, .. } => match source {
                TupleError::CatalogMismatch { .. }
                | TupleError::ValueCount { .. }
                | TupleError::ValueLength { .. }
                | TupleError::InvalidCString { .. } => ErrorKind::CatalogMismatch,
                TupleError::UnsupportedVarlena { .. } => ErrorKind::UnsupportedVarlena,
                TupleError::AttributeOverrun { .. } | TupleError::InvalidHeaderLength { .. } => {
                    ErrorKind::AttributeOverrun
                }
                TupleError::EncodingOverflow { .. } => ErrorKind::EncodingOverflow,
            },
            EditorError::Format { source, .. } => match source {
                FormatError::FieldCount { .. } => ErrorKind::CatalogMismatch,
                _ => ErrorKind::InvalidValue,
            },
            EditorError::CatalogRequired | EditorError::Catalog(_) => ErrorKind::InvalidCatalog,
            EditorError::Storage(StorageError::PageNotFound(_)) => ErrorKind::ItemNotFound,
            EditorError::Storage(_) | EditorError::Output { .. } => ErrorKind::Storage,
            EditorError::SameFile(_) => ErrorKind::InvalidValue,
        }
    }
}
