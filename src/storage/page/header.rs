//! PostgreSQL page header (`PageHeaderData`).
//!
//! Every heap page starts with this 24-byte header. The storage I/O layer
//! never interprets it; `heap::HeapPage` does.

use bitflags::bitflags;

use super::PAGE_SIZE;

/// Size of the page header in bytes (`SizeOfPageHeaderData`).
pub const PAGE_HEADER_SIZE: usize = 24;

/// Page layout version written by PostgreSQL 8.3 and later.
pub const PG_PAGE_LAYOUT_VERSION: u8 = 4;

const PAGE_SIZE_MASK: u16 = 0xFF00;
const LAYOUT_VERSION_MASK: u16 = 0x00FF;

bitflags! {
    /// `pd_flags` bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PageFlags: u16 {
        /// There are unused line pointers before `pd_lower`.
        const HAS_FREE_LINES = 0x0001;
        /// Not enough free space for a new tuple.
        const PAGE_FULL = 0x0002;
        /// All tuples on the page are visible to everyone.
        const ALL_VISIBLE = 0x0004;
    }
}

/// Page header stored at the beginning of each page.
///
/// Layout (24 bytes, little-endian):
/// - `pd_lsn`: 2 x u32 (xlogid, xrecoff) - WAL position of the last change
/// - `pd_checksum`: u16
/// - `pd_flags`: u16
/// - `pd_lower`: u16 - end of the line pointer array
/// - `pd_upper`: u16 - start of tuple storage
/// - `pd_special`: u16 - start of the special space
/// - `pd_pagesize_version`: u16 - page size in the high byte, layout version in the low byte
/// - `pd_prune_xid`: u32 - oldest prunable XID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// LSN as `(xlogid << 32) | xrecoff`.
    pub lsn: u64,
    /// Page checksum; 0 when data checksums are disabled.
    pub checksum: u16,
    pub flags: PageFlags,
    pub lower: u16,
    pub upper: u16,
    pub special: u16,
    pub pagesize_version: u16,
    pub prune_xid: u32,
}

impl PageHeader {
    /// Creates the header of an empty, freshly initialised heap page.
    pub fn new_heap_page() -> Self {
        Self {
            lsn: 0,
            checksum: 0,
            flags: PageFlags::empty(),
            lower: PAGE_HEADER_SIZE as u16,
            upper: PAGE_SIZE as u16,
            special: PAGE_SIZE as u16,
            pagesize_version: (PAGE_SIZE as u16 & PAGE_SIZE_MASK)
                | PG_PAGE_LAYOUT_VERSION as u16,
            prune_xid: 0,
        }
    }

    /// Page size recorded in the header.
    pub fn page_size(&self) -> usize {
        (self.pagesize_version & PAGE_SIZE_MASK) as usize
    }

    /// Layout version recorded in the header.
    pub fn layout_version(&self) -> u8 {
        (self.pagesize_version & LAYOUT_VERSION_MASK) as u8
    }

    /// `PageIsNew`: `pd_upper` is zero. Only an all-zero page is a valid new
    /// page; see `HeapPage::is_new`.
    pub fn is_new(&self) -> bool {
        self.upper == 0
    }

    /// Number of line pointers between the header and `pd_lower`.
    pub fn item_count(&self) -> usize {
        (self.lower as usize).saturating_sub(PAGE_HEADER_SIZE) / 4
    }

    /// Free space between the line pointer array and tuple storage.
    pub fn free_space(&self) -> u16 {
        self.upper.saturating_sub(self.lower)
    }

    /// LSN in PostgreSQL's `X/X` notation.
    pub fn lsn_text(&self) -> String {
        format!("{:X}/{:X}", self.lsn >> 32, self.lsn & 0xFFFF_FFFF)
    }

    /// Reads a header from a page byte slice.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() < PAGE_HEADER_SIZE`.
    pub fn read_from(data: &[u8]) -> Self {
        let xlogid = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        let xrecoff = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        Self {
            lsn: ((xlogid as u64) << 32) | xrecoff as u64,
            checksum: u16::from_le_bytes([data[8], data[9]]),
            flags: PageFlags::from_bits_retain(u16::from_le_bytes([data[10], data[11]])),
            lower: u16::from_le_bytes([data[12], data[13]]),
            upper: u16::from_le_bytes([data[14], data[15]]),
            special: u16::from_le_bytes([data[16], data[17]]),
            pagesize_version: u16::from_le_bytes([data[18], data[19]]),
            prune_xid: u32::from_le_bytes([data[20], data[21], data[22], data[23]]),
        }
    }

    /// Writes the header to a page byte slice.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() < PAGE_HEADER_SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        data[0..4].copy_from_slice(&((self.lsn >> 32) as u32).to_le_bytes());
        data[4..8].copy_from_slice(&(self.lsn as u32).to_le_bytes());
        data[8..10].copy_from_slice(&self.checksum.to_le_bytes());
        data[10..12].copy_from_slice(&self.flags.bits().to_le_bytes());
        data[12..14].copy_from_slice(&self.lower.to_le_bytes());
        data[14..16].copy_from_slice(&self.upper.to_le_bytes());
        data[16..18].copy_from_slice(&self.special.to_le_bytes());
        data[18..20].copy_from_slice(&self.pagesize_version.to_le_bytes());
        data[20..24].copy_from_slice(&self.prune_xid.to_le_bytes());
    }
}
