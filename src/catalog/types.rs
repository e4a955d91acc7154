//! Attribute descriptors.

use std::fmt;

use serde::Serialize;

use crate::storage::align_up;

/// Alignment class of an attribute (`typalign`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// `c`: no alignment.
    Char,
    /// `s`: 2 bytes.
    Short,
    /// `i`: 4 bytes.
    Int,
    /// `d`: 8 bytes.
    Double,
}

impl Alignment {
    /// Parses a `typalign` letter.
    pub fn from_typalign(letter: char) -> Option<Self> {
        match letter {
            'c' => Some(Alignment::Char),
            's' => Some(Alignment::Short),
            'i' => Some(Alignment::Int),
            'd' => Some(Alignment::Double),
            _ => None,
        }
    }

    pub const fn typalign(self) -> char {
        match self {
            Alignment::Char => 'c',
            Alignment::Short => 's',
            Alignment::Int => 'i',
            Alignment::Double => 'd',
        }
    }

    /// Alignment boundary in bytes.
    pub const fn boundary(self) -> usize {
        match self {
            Alignment::Char => 1,
            Alignment::Short => 2,
            Alignment::Int => 4,
            Alignment::Double => 8,
        }
    }

    /// Rounds `offset` up to this alignment.
    pub const fn align(self, offset: usize) -> usize {
        align_up(offset, self.boundary())
    }
}

/// Storage length class of an attribute (`attlen`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrLength {
    /// Fixed width in bytes (`attlen > 0`).
    Fixed(usize),
    /// Varlena with a 1- or 4-byte length header (`attlen = -1`).
    Varlena,
    /// Zero-terminated C string (`attlen = -2`).
    CString,
}

impl AttrLength {
    /// Converts a `pg_attribute.attlen` value.
    pub fn from_attlen(attlen: i32) -> Option<Self> {
        match attlen {
            -1 => Some(AttrLength::Varlena),
            -2 => Some(AttrLength::CString),
            n if n > 0 => Some(AttrLength::Fixed(n as usize)),
            _ => None,
        }
    }

    pub fn attlen(self) -> i32 {
        match self {
            AttrLength::Fixed(n) => n as i32,
            AttrLength::Varlena => -1,
            AttrLength::CString => -2,
        }
    }

    pub fn is_fixed(self) -> bool {
        matches!(self, AttrLength::Fixed(_))
    }
}

impl fmt::Display for AttrLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.attlen())
    }
}

impl Serialize for AttrLength {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.attlen())
    }
}

/// One column of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: String,
    /// PostgreSQL type name, e.g. `int4` or `text`.
    pub type_name: String,
    pub length: AttrLength,
    pub align: Alignment,
}

impl Attribute {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        length: AttrLength,
        align: Alignment,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            length,
            align,
        }
    }

    /// Variable-width attributes set `HEAP_HASVARWIDTH` when non-null.
    pub fn is_variable_width(&self) -> bool {
        !self.length.is_fixed()
    }
}
