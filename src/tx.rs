//! Transaction bookkeeping fields stored in every heap tuple.
//!
//! The editor never evaluates visibility; it only decodes and carries these
//! fields through unchanged:
//! - xmin / xmax: inserting and deleting transaction IDs
//! - cid: command ID (or `xvac` for tuples moved by old-style VACUUM FULL)
//! - ctid: pointer to the newer version of an updated tuple
//! - infomask / infomask2: hint bits, null/varwidth flags and attribute count

pub mod tuple_header;
pub mod types;

pub use tuple_header::{TUPLE_HEADER_SIZE, TupleHeader};
pub use types::{CommandId, Infomask, Infomask2, Infomask2Flags, ItemPointer, TransactionId};
