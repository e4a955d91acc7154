//! Decoded attribute values.

/// One decoded attribute value.
///
/// The bytes are the value's payload as the catalog describes it:
/// - fixed-width: exactly `attlen` bytes
/// - varlena: the bytes after the length header
/// - cstring: the bytes before the terminating zero
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Datum {
    Null,
    Value(Vec<u8>),
}

impl Datum {
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Payload bytes, `None` for NULL.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Datum::Null => None,
            Datum::Value(bytes) => Some(bytes),
        }
    }
}

impl From<Vec<u8>> for Datum {
    fn from(bytes: Vec<u8>) -> Self {
        Datum::Value(bytes)
    }
}

impl From<&[u8]> for Datum {
    fn from(bytes: &[u8]) -> Self {
        Datum::Value(bytes.to_vec())
    }
}

impl<T: Into<Datum>> From<Option<T>> for Datum {
    fn from(value: Option<T>) -> Self {
        value.map_or(Datum::Null, Into::into)
    }
}
