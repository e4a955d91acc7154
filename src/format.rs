//! Human-readable rendering of decoded values.
//!
//! [`ValueFormatter`] maps a [`Datum`](crate::tuple::Datum) to a
//! [`FieldText`] using the attribute's type name, and parses a `FieldText`
//! back into payload bytes. `FieldText` serializes to plain JSON:
//!
//! | Variant | JSON              | Used for                              |
//! |---------|-------------------|---------------------------------------|
//! | `Null`  | `null`            | NULL                                  |
//! | `Bool`  | `true` / `false`  | `bool`                                |
//! | `Int`   | `42`              | integer, date/time and OID-like types |
//! | `Float` | `1.5`             | `float4`, `float8`                    |
//! | `Text`  | `"abc"`           | text-like types holding valid UTF-8   |
//! | `Bytes` | `{"hex": "00ff"}` | everything else                       |

mod error;
mod value;

pub use error::FormatError;
pub use value::{FieldText, ValueFormatter};
