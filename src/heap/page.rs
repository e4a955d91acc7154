//! Heap page view (`PageHeaderData` + line pointer array + tuples).
//!
//! ```text
//! +---------------------+ offset 0
//! | PageHeader (24B)    |
//! +---------------------+ offset 24
//! | ItemId array        | (grows toward pd_lower)
//! +---------------------+ pd_lower
//! | Free Space          |
//! +---------------------+ pd_upper
//! | Tuples              | (packed down from pd_special)
//! +---------------------+ pd_special
//! | Special space       | (empty on heap pages)
//! +---------------------+ offset 8192
//! ```

use std::ops::Range;

use tracing::trace;

use super::error::HeapError;
use super::item_id::{ITEM_ID_SIZE, ItemId};
use crate::storage::{PAGE_HEADER_SIZE, PAGE_SIZE, PageHeader, max_align};

/// Largest tuple that fits on an otherwise empty page (`MaxHeapTupleSize`).
pub const MAX_TUPLE_SIZE: usize = PAGE_SIZE - max_align(PAGE_HEADER_SIZE + ITEM_ID_SIZE);

/// A view over one heap page.
///
/// The type parameter `T` allows this to wrap:
/// - `&[u8]` - read-only view
/// - `&mut [u8]` - mutable view
/// - `Vec<u8>` - owned data
///
/// Item indexes are 0-based; PostgreSQL's offset numbers are `index + 1`.
///
/// # Example
///
/// ```no_run
/// use filenode_editor::heap::HeapPage;
/// use filenode_editor::storage::PAGE_SIZE;
///
/// let mut data = vec![0u8; PAGE_SIZE];
/// let mut page = HeapPage::new(&mut data);
/// page.init();
///
/// let item = page.insert(&[0u8; 27]).unwrap();
/// assert_eq!(page.tuple(item).unwrap().len(), 27);
/// ```
pub struct HeapPage<T> {
    data: T,
}

// Read-only methods (available for any T: AsRef<[u8]>)
impl<T: AsRef<[u8]>> HeapPage<T> {
    /// Creates a page view over the given data.
    ///
    /// # Panics
    ///
    /// Panics if `data.as_ref().len() != PAGE_SIZE`.
    pub fn new(data: T) -> Self {
        assert_eq!(
            data.as_ref().len(),
            PAGE_SIZE,
            "HeapPage requires exactly {} bytes, got {}",
            PAGE_SIZE,
            data.as_ref().len()
        );
        Self { data }
    }

    /// Creates a page view and validates its header and line pointers.
    ///
    /// # Errors
    ///
    /// Returns `HeapError::MalformedPage` or `HeapError::ItemOutOfBounds`
    /// for a page that cannot be trusted.
    pub fn parse(data: T) -> Result<Self, HeapError> {
        let page = Self::new(data);
        page.validate()?;
        Ok(page)
    }

    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    /// Returns the page header.
    pub fn header(&self) -> PageHeader {
        PageHeader::read_from(&self.data()[..PAGE_HEADER_SIZE])
    }

    /// True for a page that was extended but never initialised: every
    /// byte is zero (`PageIsNew` plus `PageIsVerified`'s all-zero check).
    pub fn is_new(&self) -> bool {
        self.data().iter().all(|&b| b == 0)
    }

    /// Checks the header bounds and every normal line pointer's span.
    pub fn validate(&self) -> Result<(), HeapError> {
        let header = self.header();
        if header.is_new() {
            if self.is_new() {
                return Ok(());
            }
            return Err(HeapError::MalformedPage(format!(
                "pd_upper is 0 but the page is not all zeros (lower={} special={})",
                header.lower, header.special
            )));
        }

        if header.page_size() != PAGE_SIZE {
            return Err(HeapError::MalformedPage(format!(
                "header records page size {}, expected {}",
                header.page_size(),
                PAGE_SIZE
            )));
        }

        let lower = header.lower as usize;
        let upper = header.upper as usize;
        let special = header.special as usize;
        if lower < PAGE_HEADER_SIZE || lower > upper || upper > special || special > PAGE_SIZE {
            return Err(HeapError::MalformedPage(format!(
                "bounds lower={} upper={} special={} violate {} <= lower <= upper <= special <= {}",
                lower, upper, special, PAGE_HEADER_SIZE, PAGE_SIZE
            )));
        }

        if (lower - PAGE_HEADER_SIZE) % ITEM_ID_SIZE != 0 {
            return Err(HeapError::MalformedPage(format!(
                "line pointer array of {} bytes is not a whole number of entries",
                lower - PAGE_HEADER_SIZE
            )));
        }

        for (item, item_id) in self.item_ids() {
            if item_id.has_storage() {
                self.check_span(item, item_id, &header)?;
            }
        }

        Ok(())
    }

    fn check_span(
        &self,
        item: usize,
        item_id: ItemId,
        header: &PageHeader,
    ) -> Result<Range<usize>, HeapError> {
        let offset = item_id.offset as usize;
        let end = offset + item_id.length as usize;
        if offset < header.upper as usize || end > header.special as usize {
            return Err(HeapError::ItemOutOfBounds {
                item,
                offset,
                end,
                upper: header.upper,
                special: header.special,
            });
        }
        Ok(offset..end)
    }

    /// Number of line pointers on the page (0 for a new page).
    pub fn item_count(&self) -> usize {
        if self.is_new() {
            return 0;
        }
        self.header().item_count()
    }

    /// Returns the line pointer at the given index.
    pub fn item_id(&self, item: usize) -> Option<ItemId> {
        if item >= self.item_count() {
            return None;
        }
        let offset = PAGE_HEADER_SIZE + item * ITEM_ID_SIZE;
        Some(ItemId::read_from(&self.data()[offset..offset + ITEM_ID_SIZE]))
    }

    /// Iterates over all line pointers in array order.
    pub fn item_ids(&self) -> impl Iterator<Item = (usize, ItemId)> + '_ {
        (0..self.item_count()).filter_map(move |item| self.item_id(item).map(|id| (item, id)))
    }

    /// Byte range of a normal item's tuple within the page.
    ///
    /// # Errors
    ///
    /// Returns `HeapError::ItemOutOfRange` or `HeapError::NoStorage` when the
    /// item does not hold a tuple, `HeapError::ItemOutOfBounds` when its
    /// span is outside the tuple area.
    pub fn tuple_span(&self, item: usize) -> Result<Range<usize>, HeapError> {
        let item_id = self.item_id(item).ok_or(HeapError::ItemOutOfRange {
            item,
            count: self.item_count(),
        })?;
        if !item_id.has_storage() {
            return Err(HeapError::NoStorage {
                item,
                status: item_id.status,
            });
        }
        self.check_span(item, item_id, &self.header())
    }

    /// Returns the tuple bytes of a normal item.
    pub fn tuple(&self, item: usize) -> Result<&[u8], HeapError> {
        let span = self.tuple_span(item)?;
        Ok(&self.data()[span])
    }

    /// Returns the raw page bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.data()
    }
}

// Mutable methods (available for T: AsRef<[u8]> + AsMut<[u8]>)
impl<T: AsRef<[u8]> + AsMut<[u8]>> HeapPage<T> {
    fn data_mut(&mut self) -> &mut [u8] {
        self.data.as_mut()
    }

    /// Initializes this page as an empty heap page.
    pub fn init(&mut self) {
        self.data_mut().fill(0);
        PageHeader::new_heap_page().write_to(&mut self.data_mut()[..PAGE_HEADER_SIZE]);
    }

    fn set_header(&mut self, header: &PageHeader) {
        header.write_to(&mut self.data_mut()[..PAGE_HEADER_SIZE]);
    }

    /// Overwrites the line pointer at the given index.
    pub fn set_item_id(&mut self, item: usize, item_id: ItemId) -> Result<(), HeapError> {
        let count = self.item_count();
        if item >= count {
            return Err(HeapError::ItemOutOfRange { item, count });
        }
        let offset = PAGE_HEADER_SIZE + item * ITEM_ID_SIZE;
        item_id.write_to(&mut self.data_mut()[offset..offset + ITEM_ID_SIZE]);
        Ok(())
    }

    /// Appends a tuple below `pd_upper` with a new line pointer and returns
    /// its item index. The tuple start is MAXALIGNed, as PostgreSQL places it.
    ///
    /// # Errors
    ///
    /// Returns `HeapError::PageFull` if there is not enough space.
    pub fn insert(&mut self, tuple: &[u8]) -> Result<usize, HeapError> {
        let mut header = self.header();
        let aligned_len = max_align(tuple.len());
        let required = aligned_len + ITEM_ID_SIZE;
        if tuple.is_empty() || tuple.len() > MAX_TUPLE_SIZE
            || (header.free_space() as usize) < required
        {
            return Err(HeapError::PageFull {
                required,
                available: header.free_space() as usize,
            });
        }

        let item = header.item_count();
        let offset = header.upper as usize - aligned_len;
        self.data_mut()[offset..offset + tuple.len()].copy_from_slice(tuple);

        header.upper = offset as u16;
        header.lower += ITEM_ID_SIZE as u16;
        self.set_header(&header);
        self.set_item_id(item, ItemId::normal(offset as u16, tuple.len() as u16))?;

        Ok(item)
    }

    /// Overwrites a normal item's tuple with bytes of exactly the same
    /// length and returns the tuple's offset within the page.
    ///
    /// # Errors
    ///
    /// Returns `HeapError::SizeMismatch` if `tuple.len()` differs from the
    /// stored length; the page is left unchanged.
    pub fn replace(&mut self, item: usize, tuple: &[u8]) -> Result<usize, HeapError> {
        let span = self.tuple_span(item)?;
        if span.len() != tuple.len() {
            return Err(HeapError::SizeMismatch {
                item,
                offset: span.start,
                expected: span.len(),
                actual: tuple.len(),
            });
        }

        trace!(item, offset = span.start, len = tuple.len(), "replacing tuple bytes");
        let offset = span.start;
        self.data_mut()[span].copy_from_slice(tuple);
        Ok(offset)
    }
}
