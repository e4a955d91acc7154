//! Tuple null bitmap.

/// Null bitmap following the fixed tuple header.
///
/// One bit per attribute, least significant bit first; a set bit means the
/// attribute is NOT NULL. Bits past `natts` in the last byte are kept as
/// read so that re-encoding is byte-identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullBitmap {
    bytes: Vec<u8>,
    natts: usize,
}

impl NullBitmap {
    /// Bitmap with every attribute present.
    pub fn all_present(natts: usize) -> Self {
        let mut bytes = vec![0xFF; natts.div_ceil(8)];
        if natts % 8 != 0 {
            if let Some(last) = bytes.last_mut() {
                *last = (1u8 << (natts % 8)) - 1;
            }
        }
        Self { bytes, natts }
    }

    /// Wraps bitmap bytes read from a tuple.
    ///
    /// `bytes` must hold at least `ceil(natts / 8)` bytes; extra bytes are ignored.
    pub fn from_bytes(bytes: &[u8], natts: usize) -> Self {
        Self {
            bytes: bytes[..natts.div_ceil(8)].to_vec(),
            natts,
        }
    }

    pub fn natts(&self) -> usize {
        self.natts
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// True if attribute `index` is NULL.
    pub fn is_null(&self, index: usize) -> bool {
        index < self.natts && self.bytes[index / 8] & (1 << (index % 8)) == 0
    }

    pub fn set_null(&mut self, index: usize, null: bool) {
        if index >= self.natts {
            return;
        }
        let mask = 1u8 << (index % 8);
        if null {
            self.bytes[index / 8] &= !mask;
        } else {
            self.bytes[index / 8] |= mask;
        }
    }

    /// True if any of the `natts` attributes is NULL.
    pub fn has_nulls(&self) -> bool {
        (0..self.natts).any(|index| self.is_null(index))
    }
}
