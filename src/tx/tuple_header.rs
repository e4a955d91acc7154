//! Heap tuple header (`HeapTupleHeaderData`).
//!
//! Every tuple stored in a heap page starts with this fixed 23-byte header,
//! optionally followed by a null bitmap and padding up to `t_hoff`.

use super::types::{CommandId, Infomask, Infomask2, ItemPointer, TransactionId};

/// Size of the fixed tuple header in bytes (`SizeofHeapTupleHeader`).
pub const TUPLE_HEADER_SIZE: usize = 23;

/// Fixed part of a heap tuple header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TupleHeader {
    /// Inserting transaction.
    pub xmin: TransactionId,
    /// Deleting or locking transaction (INVALID if none).
    pub xmax: TransactionId,
    /// Command ID, combo CID or `xvac`.
    pub cid: CommandId,
    /// Current TID of this or a newer version of the row.
    pub ctid: ItemPointer,
    /// Attribute count and update flags.
    pub infomask2: Infomask2,
    /// Null, varwidth and hint bits.
    pub infomask: Infomask,
    /// Offset of user data from the start of the tuple.
    pub hoff: u8,
}

impl TupleHeader {
    /// Header for a freshly formed tuple with `natts` attributes.
    ///
    /// xmax is INVALID with its hint bit set, ctid is left as `(0,0)` for
    /// the caller to fill in, and `t_hoff` is computed when encoding.
    pub fn new_insert(xmin: TransactionId, cid: CommandId, natts: u16) -> Self {
        Self {
            xmin,
            xmax: TransactionId::INVALID,
            cid,
            ctid: ItemPointer::new(0, 0),
            infomask2: Infomask2::default().with_natts(natts),
            infomask: Infomask::XMAX_INVALID,
            hoff: 0,
        }
    }

    /// Reads a tuple header from bytes.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() < TUPLE_HEADER_SIZE`.
    pub fn read(data: &[u8]) -> Self {
        Self {
            xmin: TransactionId::new(u32::from_le_bytes([data[0], data[1], data[2], data[3]])),
            xmax: TransactionId::new(u32::from_le_bytes([data[4], data[5], data[6], data[7]])),
            cid: CommandId::new(u32::from_le_bytes([data[8], data[9], data[10], data[11]])),
            ctid: ItemPointer::read_from(&data[12..18]),
            infomask2: Infomask2::from_raw(u16::from_le_bytes([data[18], data[19]])),
            infomask: Infomask::from_bits_retain(u16::from_le_bytes([data[20], data[21]])),
            hoff: data[22],
        }
    }

    /// Writes the tuple header to bytes.
    ///
    /// Layout (23 bytes, little-endian):
    /// - xmin: 4 bytes
    /// - xmax: 4 bytes
    /// - cid / xvac: 4 bytes
    /// - ctid: 6 bytes (block hi u16, block lo u16, offset u16)
    /// - infomask2: 2 bytes
    /// - infomask: 2 bytes
    /// - hoff: 1 byte
    ///
    /// # Panics
    ///
    /// Panics if `data.len() < TUPLE_HEADER_SIZE`.
    pub fn write(&self, data: &mut [u8]) {
        data[0..4].copy_from_slice(&self.xmin.as_u32().to_le_bytes());
        data[4..8].copy_from_slice(&self.xmax.as_u32().to_le_bytes());
        data[8..12].copy_from_slice(&self.cid.as_u32().to_le_bytes());
        self.ctid.write_to(&mut data[12..18]);
        data[18..20].copy_from_slice(&self.infomask2.as_u16().to_le_bytes());
        data[20..22].copy_from_slice(&self.infomask.bits().to_le_bytes());
        data[22] = self.hoff;
    }

    /// Number of attributes recorded in `t_infomask2`.
    pub fn natts(&self) -> usize {
        self.infomask2.natts() as usize
    }

    /// True if a null bitmap follows the fixed header.
    pub fn has_nulls(&self) -> bool {
        self.infomask.contains(Infomask::HASNULL)
    }

    /// Length of the null bitmap in bytes (0 without `HEAP_HASNULL`).
    pub fn bitmap_len(&self) -> usize {
        if self.has_nulls() {
            self.natts().div_ceil(8)
        } else {
            0
        }
    }
}
