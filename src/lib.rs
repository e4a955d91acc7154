//! Read and patch PostgreSQL heap filenodes without a running server.
//!
//! - [`storage`]: page-granular file access
//! - [`heap`]: page header and line pointer parsing
//! - [`tx`]: tuple header fields
//! - [`catalog`]: column layouts
//! - [`tuple`]: raw and typed tuple decoding and re-encoding
//! - [`format`]: textual rendering of values
//! - [`editor`]: list, read and in-place update

pub mod catalog;
pub mod editor;
pub mod format;
pub mod heap;
pub mod storage;
pub mod tuple;
pub mod tx;
