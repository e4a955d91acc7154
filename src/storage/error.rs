//! Error types for the storage layer.

use thiserror::Error;

use super::page::PageId;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested page lies beyond the end of the filenode.
    #[error("page {0} not found")]
    PageNotFound(PageId),

    /// Buffer size does not match the expected size.
    #[error("invalid buffer size: expected {expected}, got {actual}")]
    InvalidBufferSize {
        /// Expected buffer size in bytes.
        expected: usize,
        /// Actual buffer size in bytes.
        actual: usize,
    },

    /// A ranged write would cross the page boundary.
    #[error("write of {len} bytes at offset {offset} crosses the end of page {page_id}")]
    RangeOutOfPage {
        /// Target page.
        page_id: PageId,
        /// Offset within the page.
        offset: usize,
        /// Number of bytes to write.
        len: usize,
    },

    /// I/O error from the underlying storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a whole number of pages, or similar damage.
    #[error("data corruption: {0}")]
    Corrupted(String),
}
