//! Heap page parsing.
//!
//! A PostgreSQL heap page is a slotted page: an array of 4-byte line
//! pointers grows up from the header while tuples are packed down from
//! `pd_special`. This module decodes the line pointers and hands out the
//! tuple byte spans they point at; decoding tuples is the job of `tuple`.
//!
//! - [`HeapPage`]: page view over a borrowed or owned 8KB buffer
//! - [`ItemId`]: one decoded line pointer
//! - [`ItemStatus`]: `lp_flags` state of a line pointer

mod error;
mod item_id;
mod page;

pub use error::HeapError;
pub use item_id::{ITEM_ID_SIZE, ItemId, ItemStatus};
pub use page::{HeapPage, MAX_TUPLE_SIZE};

// Re-export page header types from storage for convenience
pub use crate::storage::{PAGE_HEADER_SIZE, PageFlags, PageHeader};
