//! Line pointers (`ItemIdData`).

use std::fmt;

use serde::Serialize;

/// Size of one line pointer in bytes.
pub const ITEM_ID_SIZE: usize = 4;

const LP_OFF_MASK: u32 = 0x7FFF;
const LP_FLAGS_SHIFT: u32 = 15;
const LP_FLAGS_MASK: u32 = 0x3;
const LP_LEN_SHIFT: u32 = 17;
const LP_LEN_MASK: u32 = 0x7FFF;

/// `lp_flags`: what a line pointer currently refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Free for reuse; no storage.
    Unused,
    /// Points at a tuple.
    Normal,
    /// HOT redirect; `lp_off` holds the target item number.
    Redirect,
    /// Dead tuple, storage may or may not remain.
    Dead,
}

impl ItemStatus {
    /// Decodes the two `lp_flags` bits.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            0 => ItemStatus::Unused,
            1 => ItemStatus::Normal,
            2 => ItemStatus::Redirect,
            _ => ItemStatus::Dead,
        }
    }

    pub const fn bits(self) -> u8 {
        match self {
            ItemStatus::Unused => 0,
            ItemStatus::Normal => 1,
            ItemStatus::Redirect => 2,
            ItemStatus::Dead => 3,
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemStatus::Unused => "unused",
            ItemStatus::Normal => "normal",
            ItemStatus::Redirect => "redirect",
            ItemStatus::Dead => "dead",
        };
        f.write_str(name)
    }
}

/// A decoded line pointer.
///
/// Layout (one little-endian u32):
/// - bits 0..15: `lp_off`, byte offset of the tuple within the page
/// - bits 15..17: `lp_flags`
/// - bits 17..32: `lp_len`, tuple length in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ItemId {
    pub offset: u16,
    pub status: ItemStatus,
    pub length: u16,
}

impl ItemId {
    /// Creates a line pointer for a normal tuple.
    pub const fn normal(offset: u16, length: u16) -> Self {
        Self {
            offset,
            status: ItemStatus::Normal,
            length,
        }
    }

    /// Creates an unused line pointer.
    pub const fn unused() -> Self {
        Self {
            offset: 0,
            status: ItemStatus::Unused,
            length: 0,
        }
    }

    /// Unpacks a line pointer word.
    pub const fn from_word(word: u32) -> Self {
        Self {
            offset: (word & LP_OFF_MASK) as u16,
            status: ItemStatus::from_bits(((word >> LP_FLAGS_SHIFT) & LP_FLAGS_MASK) as u8),
            length: ((word >> LP_LEN_SHIFT) & LP_LEN_MASK) as u16,
        }
    }

    /// Packs this line pointer into its on-disk word.
    pub const fn to_word(&self) -> u32 {
        (self.offset as u32 & LP_OFF_MASK)
            | ((self.status.bits() as u32 & LP_FLAGS_MASK) << LP_FLAGS_SHIFT)
            | ((self.length as u32 & LP_LEN_MASK) << LP_LEN_SHIFT)
    }

    /// Reads a line pointer from bytes.
    pub fn read_from(data: &[u8]) -> Self {
        Self::from_word(u32::from_le_bytes([data[0], data[1], data[2], data[3]]))
    }

    /// Writes the line pointer to bytes.
    pub fn write_to(&self, data: &mut [u8]) {
        data[0..ITEM_ID_SIZE].copy_from_slice(&self.to_word().to_le_bytes());
    }

    /// True if the line pointer refers to tuple bytes that may be decoded.
    pub fn has_storage(&self) -> bool {
        self.status == ItemStatus::Normal && self.length > 0
    }

    /// Target item (0-based) of a redirect line pointer.
    ///
    /// PostgreSQL stores the 1-based offset number of the target in `lp_off`.
    pub fn redirect_target(&self) -> Option<usize> {
        match self.status {
            ItemStatus::Redirect if self.offset > 0 => Some(self.offset as usize - 1),
            _ => None,
        }
    }
}
