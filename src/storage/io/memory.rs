//! In-memory page storage implementation.

use parking_lot::Mutex;

use super::{Storage, check_range};
use crate::storage::error::StorageError;
use crate::storage::page::{PAGE_SIZE, PageId};

/// In-memory filenode for fixtures and tests.
///
/// Pages live in a Vec indexed by page number. All operations are
/// synchronous but wrapped in async for trait compatibility.
#[derive(Default)]
pub struct MemoryStorage {
    pages: Mutex<Vec<Box<[u8]>>>,
}

impl MemoryStorage {
    /// Creates a new empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a storage from the contents of a filenode image.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Corrupted` if `bytes` is not a whole number of pages.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        if bytes.len() % PAGE_SIZE != 0 {
            return Err(StorageError::Corrupted(format!(
                "image size {} is not a multiple of page size {}",
                bytes.len(),
                PAGE_SIZE
            )));
        }
        let pages = bytes.chunks_exact(PAGE_SIZE).map(Box::from).collect();
        Ok(Self {
            pages: Mutex::new(pages),
        })
    }

    /// Returns the concatenated contents of all pages.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.pages.lock().concat()
    }
}

impl Storage for MemoryStorage {
    async fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> Result<(), StorageError> {
        if buf.len() != PAGE_SIZE {
            return Err(StorageError::InvalidBufferSize {
                expected: PAGE_SIZE,
                actual: buf.len(),
            });
        }

        let pages = self.pages.lock();
        let page = pages
            .get(page_id.page_num() as usize)
            .ok_or(StorageError::PageNotFound(page_id))?;

        buf.copy_from_slice(page);
        Ok(())
    }

    async fn write_page(&self, page_id: PageId, buf: &[u8]) -> Result<(), StorageError> {
        if buf.len() != PAGE_SIZE {
            return Err(StorageError::InvalidBufferSize {
                expected: PAGE_SIZE,
                actual: buf.len(),
            });
        }

        let mut pages = self.pages.lock();
        let page = pages
            .get_mut(page_id.page_num() as usize)
            .ok_or(StorageError::PageNotFound(page_id))?;

        page.copy_from_slice(buf);
        Ok(())
    }

    async fn write_range(
        &self,
        page_id: PageId,
        offset: usize,
        buf: &[u8],
    ) -> Result<(), StorageError> {
        let mut pages = self.pages.lock();
        let page = pages
            .get_mut(page_id.page_num() as usize)
            .ok_or(StorageError::PageNotFound(page_id))?;
        check_range(page_id, offset, buf.len())?;

        page[offset..offset + buf.len()].copy_from_slice(buf);
        Ok(())
    }

    async fn allocate_page(&self) -> Result<PageId, StorageError> {
        let mut pages = self.pages.lock();
        let page_id = PageId::new(pages.len() as u64);
        pages.push(vec![0u8; PAGE_SIZE].into_boxed_slice());
        Ok(page_id)
    }

    async fn page_count(&self) -> usize {
        self.pages.lock().len()
    }

    async fn sync_all(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests as generic;
    use super::*;

    #[tokio::test]
    async fn test_basic_operations() {
        generic::test_basic_operations(MemoryStorage::new()).await;
    }

    #[tokio::test]
    async fn test_write_range() {
        generic::test_write_range(MemoryStorage::new()).await;
    }

    #[tokio::test]
    async fn test_write_range_bounds() {
        generic::test_write_range_bounds(MemoryStorage::new()).await;
    }

    #[tokio::test]
    async fn test_buffer_size_validation() {
        generic::test_buffer_size_validation(MemoryStorage::new()).await;
    }

    #[tokio::test]
    async fn test_page_not_found() {
        generic::test_page_not_found(MemoryStorage::new()).await;
    }

    #[tokio::test]
    async fn test_from_bytes() {
        let mut image = vec![0u8; PAGE_SIZE * 2];
        image[PAGE_SIZE] = 9;
        let storage = MemoryStorage::from_bytes(&image).unwrap();
        assert_eq!(storage.page_count().await, 2);

        let mut buf = vec![0u8; PAGE_SIZE];
        storage.read_page(PageId::new(1), &mut buf).await.unwrap();
        assert_eq!(buf[0], 9);
        assert_eq!(storage.to_bytes(), image);
    }

    #[test]
    fn test_from_bytes_rejects_partial_page() {
        let result = MemoryStorage::from_bytes(&[0u8; 10]);
        assert!(matches!(result, Err(StorageError::Corrupted(_))));
    }
}
