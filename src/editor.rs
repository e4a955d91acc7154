//! Filenode editor: list, read and in-place update of heap tuples.
//!
//! [`FilenodeEditor`] ties the other modules together:
//!
//! ```text
//! +-------------------------------------------------------------+
//! |                      FilenodeEditor                         |
//! |                                                             |
//! |  list / read / update / raw_update                          |
//! |       |                                                     |
//! |       v                                                     |
//! |  +-----------+   +--------------+   +--------------------+  |
//! |  | HeapPage  |-->| TupleCodec   |<--| TypeCatalog (opt.) |  |
//! |  | (parse)   |   | (raw/typed)  |   +--------------------+  |
//! |  +-----+-----+   +------+-------+                           |
//! |        |                |  ValueFormatter (FieldText)      |
//! +--------+----------------+---------------------------------- +
//!          |                |
//!          v                v  write_range (exact tuple span)
//!       +---------------------+
//!       |  storage::Storage   |
//!       | (File / Memory)     |
//!       +---------------------+
//! ```
//!
//! Updates never move a tuple: the replacement must have exactly the
//! length recorded in the item's line pointer, and only that span of the
//! file is written. [`StagedCopy`] redirects an edit to a copy that only
//! replaces its destination once the edit has succeeded.

mod error;
mod filenode;
mod output;
mod view;

pub use error::{EditorError, ErrorKind};
pub use filenode::FilenodeEditor;
pub use output::StagedCopy;
pub use view::{
    FieldView, ItemContents, ItemSummary, ItemView, PageListing, PageSummary, TupleHeaderView,
    WriteReport,
};
