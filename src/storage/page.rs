//! Page identifier, size constants and the alignment arithmetic shared by
//! the page and tuple layouts.

mod header;

pub use header::{PAGE_HEADER_SIZE, PG_PAGE_LAYOUT_VERSION, PageFlags, PageHeader};

use std::fmt;

/// 8KB page size (PostgreSQL's default `BLCKSZ`).
pub const PAGE_SIZE: usize = 8192;

/// Strictest alignment the on-disk format uses (`MAXIMUM_ALIGNOF` on x86-64).
pub const MAXIMUM_ALIGNOF: usize = 8;

/// Rounds `offset` up to the next multiple of `boundary`.
///
/// `boundary` must be a power of two.
pub const fn align_up(offset: usize, boundary: usize) -> usize {
    (offset + boundary - 1) & !(boundary - 1)
}

/// `MAXALIGN`: rounds `len` up to [`MAXIMUM_ALIGNOF`].
pub const fn max_align(len: usize) -> usize {
    align_up(len, MAXIMUM_ALIGNOF)
}

/// Block number of a page within a filenode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u64);

impl PageId {
    /// Creates a new PageId from a page number.
    pub const fn new(page_num: u64) -> Self {
        Self(page_num)
    }

    /// Returns the page number.
    pub const fn page_num(&self) -> u64 {
        self.0
    }

    /// Calculates the byte offset for this page in the filenode.
    pub const fn byte_offset(&self) -> u64 {
        self.0 * PAGE_SIZE as u64
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
