//! Type catalog: the column layout needed to decode a relation's tuples.
//!
//! A filenode carries no schema. The caller supplies one entry per column,
//! in attribute-number order, mirroring `pg_attribute` + `pg_type`:
//!
//! | Field       | PostgreSQL source | Rust type     |
//! |-------------|-------------------|---------------|
//! | `name`      | `attname`         | `String`      |
//! | `type_name` | `typname`         | `String`      |
//! | `length`    | `attlen`          | [`AttrLength`] |
//! | `align`     | `attalign`        | [`Alignment`] |
//!
//! The catalog is read-only once built.

mod core;
mod error;
mod types;

pub use self::core::{SYSTEM_COLUMNS, TypeCatalog};
pub use error::CatalogError;
pub use types::{Alignment, AttrLength, Attribute};
