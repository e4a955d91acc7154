//! Error types for the heap module.

use thiserror::Error;

use super::item_id::ItemStatus;

/// Errors from heap page parsing and in-place updates.
#[derive(Debug, Error)]
pub enum HeapError {
    /// The page header or line pointer array is inconsistent.
    #[error("malformed page: {0}")]
    MalformedPage(String),

    /// A normal line pointer points outside the tuple area.
    #[error(
        "malformed page: item {item} spans {offset}..{end} outside tuple area {upper}..{special}"
    )]
    ItemOutOfBounds {
        /// Item index (0-based).
        item: usize,
        /// `lp_off` of the item.
        offset: usize,
        /// `lp_off + lp_len`.
        end: usize,
        upper: u16,
        special: u16,
    },

    /// Item index is past the end of the line pointer array.
    #[error("item {item} not found: page has {count} items")]
    ItemOutOfRange {
        /// Requested item index (0-based).
        item: usize,
        /// Number of line pointers on the page.
        count: usize,
    },

    /// The line pointer exists but has no tuple storage.
    #[error("item {item} not found: line pointer is {status}")]
    NoStorage {
        /// Requested item index (0-based).
        item: usize,
        /// State of the line pointer.
        status: ItemStatus,
    },

    /// Replacement bytes differ in length from the stored tuple.
    #[error(
        "size mismatch for item {item} at offset {offset}: slot holds {expected} bytes, got {actual}"
    )]
    SizeMismatch {
        /// Item index (0-based).
        item: usize,
        /// `lp_off` of the item.
        offset: usize,
        /// Stored tuple length (`lp_len`).
        expected: usize,
        /// Length of the replacement.
        actual: usize,
    },

    /// Page has no room for another tuple.
    #[error("page full: need {required} bytes, have {available} available")]
    PageFull {
        /// Bytes required for the tuple and its line pointer.
        required: usize,
        /// Bytes available in free space.
        available: usize,
    },
}
