//! Storage layer for page-based filenode I/O.
//!
//! A PostgreSQL filenode (one segment of a relation's main fork) is a flat
//! sequence of 8KB pages. This layer reads and writes those pages as raw
//! bytes; interpreting them is the job of the `heap` module.
//!
//! # Architecture
//!
//! ```text
//! +-------------------+
//! | FilenodeEditor    |  <- editor
//! +-------------------+
//!          |
//!          v
//! +-------------------+
//! | Storage Trait     |  <- io
//! +-------------------+
//!       /      \
//!      v        v
//! +--------------+ +-------------+
//! | MemoryStorage| | FileStorage |
//! +--------------+ +-------------+
//! ```

pub mod error;
pub mod io;
pub mod page;

pub use error::StorageError;
pub use io::{FileStorage, MemoryStorage, Storage};
pub use page::{
    MAXIMUM_ALIGNOF, PAGE_HEADER_SIZE, PAGE_SIZE, PG_PAGE_LAYOUT_VERSION, PageFlags, PageHeader,
    PageId, align_up, max_align,
};
