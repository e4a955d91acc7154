//! Heap tuple decoding and encoding.
//!
//! # Tuple Layout
//!
//! ```text
//! +------------------------------+ offset 0
//! | TupleHeader (23B)            |
//! +------------------------------+ offset 23
//! | Null Bitmap (ceil(natts/8)B) |  only with HEAP_HASNULL; bit=1: NOT NULL
//! +------------------------------+
//! | Padding                      |  up to t_hoff = MAXALIGN(23 + bitmap)
//! +------------------------------+ t_hoff
//! | Attribute data               |  each value aligned to its typalign,
//! | ...                          |  NULLs occupy no bytes
//! +------------------------------+ lp_len
//! ```
//!
//! Variable-length values start with a varlena header (see [`varlena`]).
//! A [`TupleCodec`] turns tuple bytes into [`Datum`]s using a
//! [`TypeCatalog`](crate::catalog::TypeCatalog) and back again.

mod codec;
mod datum;
mod error;
mod null_bitmap;
pub mod varlena;

pub use codec::{DecodedAttribute, RawTuple, TupleCodec, TypedTuple};
pub use datum::Datum;
pub use error::TupleError;
pub use null_bitmap::NullBitmap;
pub use varlena::{VarlenaError, VarlenaForm, VarlenaHeader};
