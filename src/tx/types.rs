//! Tuple header field types: TransactionId, CommandId, ItemPointer and the
//! two infomask words.

use std::fmt;

use bitflags::bitflags;

/// 32-bit transaction ID as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u32);

impl TransactionId {
    /// Invalid transaction ID (0).
    pub const INVALID: Self = Self(0);
    /// Bootstrap transaction ID (1).
    pub const BOOTSTRAP: Self = Self(1);
    /// Frozen transaction ID (2), visible to everyone.
    pub const FROZEN: Self = Self(2);

    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    pub const fn is_invalid(&self) -> bool {
        self.0 == 0
    }

    /// True for the reserved IDs below the first normal one (3).
    pub const fn is_special(&self) -> bool {
        self.0 < 3
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Command ID field of the tuple header.
///
/// The same four bytes hold `t_xvac` on tuples moved by pre-9.0 VACUUM FULL,
/// or a combo CID when `HEAP_COMBOCID` is set. It is carried opaquely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CommandId(u32);

impl CommandId {
    pub const FIRST: Self = Self(0);

    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `t_ctid`: block number and 1-based line pointer number.
///
/// The block number is stored as two u16 halves (`bi_hi`, `bi_lo`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemPointer {
    pub block: u32,
    pub offset: u16,
}

impl ItemPointer {
    pub const fn new(block: u32, offset: u16) -> Self {
        Self { block, offset }
    }

    /// Reads the 6-byte on-disk form.
    pub fn read_from(data: &[u8]) -> Self {
        let hi = u16::from_le_bytes([data[0], data[1]]) as u32;
        let lo = u16::from_le_bytes([data[2], data[3]]) as u32;
        Self {
            block: (hi << 16) | lo,
            offset: u16::from_le_bytes([data[4], data[5]]),
        }
    }

    /// Writes the 6-byte on-disk form.
    pub fn write_to(&self, data: &mut [u8]) {
        data[0..2].copy_from_slice(&((self.block >> 16) as u16).to_le_bytes());
        data[2..4].copy_from_slice(&(self.block as u16).to_le_bytes());
        data[4..6].copy_from_slice(&self.offset.to_le_bytes());
    }
}

impl fmt::Display for ItemPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.block, self.offset)
    }
}

bitflags! {
    /// `t_infomask` bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Infomask: u16 {
        /// Tuple has a null bitmap.
        const HASNULL = 0x0001;
        /// Tuple has variable-width attributes.
        const HASVARWIDTH = 0x0002;
        /// Tuple has out-of-line (TOAST) values.
        const HASEXTERNAL = 0x0004;
        /// Tuple has an OID field (pre-12 `WITH OIDS` tables).
        const HASOID_OLD = 0x0008;
        const XMAX_KEYSHR_LOCK = 0x0010;
        const COMBOCID = 0x0020;
        const XMAX_EXCL_LOCK = 0x0040;
        const XMAX_LOCK_ONLY = 0x0080;
        const XMIN_COMMITTED = 0x0100;
        const XMIN_INVALID = 0x0200;
        const XMAX_COMMITTED = 0x0400;
        const XMAX_INVALID = 0x0800;
        const XMAX_IS_MULTI = 0x1000;
        const UPDATED = 0x2000;
        const MOVED_OFF = 0x4000;
        const MOVED_IN = 0x8000;
    }
}

impl fmt::Display for Infomask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.bits())
    }
}

/// Mask of the attribute count within `t_infomask2`.
pub const HEAP_NATTS_MASK: u16 = 0x07FF;

bitflags! {
    /// Flag bits of `t_infomask2` (above the attribute count).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Infomask2Flags: u16 {
        const KEYS_UPDATED = 0x2000;
        const HOT_UPDATED = 0x4000;
        const ONLY_TUPLE = 0x8000;
    }
}

/// `t_infomask2`: number of attributes in the low 11 bits plus flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Infomask2(u16);

impl Infomask2 {
    pub const fn from_raw(value: u16) -> Self {
        Self(value)
    }

    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// Number of attributes physically present in the tuple.
    pub const fn natts(&self) -> u16 {
        self.0 & HEAP_NATTS_MASK
    }

    /// Replaces the attribute count, keeping every other bit.
    pub const fn with_natts(self, natts: u16) -> Self {
        Self((self.0 & !HEAP_NATTS_MASK) | (natts & HEAP_NATTS_MASK))
    }

    pub const fn flags(&self) -> Infomask2Flags {
        Infomask2Flags::from_bits_retain(self.0 & !HEAP_NATTS_MASK)
    }
}

impl fmt::Display for Infomask2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}
