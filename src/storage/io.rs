//! Page I/O backend implementations.
//!
//! This module provides the `Storage` trait for page-based I/O operations,
//! along with MemoryStorage and FileStorage implementations.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use super::page::PageId;
use crate::storage::error::StorageError;

/// Page I/O backend for a filenode.
///
/// Reads and writes 8KB pages using caller-owned buffers. Implementations:
/// - `io::MemoryStorage`: in-memory pages, used for fixtures and tests
/// - `io::FileStorage`: a filenode on disk, accessed through tokio::fs
///
/// Besides whole-page writes the trait offers [`Storage::write_range`], which
/// rewrites a byte span inside one page and leaves every other byte of the
/// file untouched. The editor uses it to patch a single tuple.
pub trait Storage: Send + Sync {
    /// Reads a page into caller-provided buffer.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::PageNotFound` if the page is past the end.
    /// Returns `StorageError::InvalidBufferSize` if `buf.len() != PAGE_SIZE`.
    fn read_page(
        &self,
        page_id: PageId,
        buf: &mut [u8],
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Writes a page from caller-provided buffer.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::PageNotFound` if the page is past the end.
    /// Returns `StorageError::InvalidBufferSize` if `buf.len() != PAGE_SIZE`.
    fn write_page(
        &self,
        page_id: PageId,
        buf: &[u8],
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Overwrites `buf.len()` bytes starting at `offset` within a page.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::PageNotFound` if the page is past the end.
    /// Returns `StorageError::RangeOutOfPage` if the span crosses the page end.
    fn write_range(
        &self,
        page_id: PageId,
        offset: usize,
        buf: &[u8],
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Appends a zeroed page and returns its PageId.
    fn allocate_page(
        &self,
    ) -> impl std::future::Future<Output = Result<PageId, StorageError>> + Send;

    /// Returns the total number of pages.
    fn page_count(&self) -> impl std::future::Future<Output = usize> + Send;

    /// Flushes written data to the physical device (fsync).
    ///
    /// For io::MemoryStorage, this is a no-op.
    fn sync_all(&self) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;
}

/// Checks that `[offset, offset + len)` stays inside one page.
fn check_range(page_id: PageId, offset: usize, len: usize) -> Result<(), StorageError> {
    match offset.checked_add(len) {
        Some(end) if end <= super::page::PAGE_SIZE => Ok(()),
        _ => Err(StorageError::RangeOutOfPage {
            page_id,
            offset,
            len,
        }),
    }
}

/// Storage-agnostic checks shared by the backend test suites.
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::page::PAGE_SIZE;

    pub async fn allocate_and_write<S: Storage>(storage: &S, fill: u8) -> PageId {
        let page_id = storage.allocate_page().await.unwrap();
        storage
            .write_page(page_id, &vec![fill; PAGE_SIZE])
            .await
            .unwrap();
        page_id
    }

    pub async fn verify_fill<S: Storage>(storage: &S, page_id: PageId, fill: u8) {
        let mut buf = vec![0u8; PAGE_SIZE];
        storage.read_page(page_id, &mut buf).await.unwrap();
        assert!(buf.iter().all(|&b| b == fill), "page {page_id} lost its fill");
    }

    pub async fn test_basic_operations<S: Storage>(storage: S) {
        assert_eq!(storage.page_count().await, 0);

        let first = allocate_and_write(&storage, 0xAA).await;
        let second = allocate_and_write(&storage, 0x55).await;
        assert_eq!(first, PageId::new(0));
        assert_eq!(second, PageId::new(1));
        assert_eq!(storage.page_count().await, 2);

        verify_fill(&storage, first, 0xAA).await;
        verify_fill(&storage, second, 0x55).await;
        storage.sync_all().await.unwrap();
    }

    pub async fn test_write_range<S: Storage>(storage: S) {
        let page_id = allocate_and_write(&storage, 0x11).await;
        storage
            .write_range(page_id, 8150, &[0xEE; 42])
            .await
            .unwrap();

        let mut buf = vec![0u8; PAGE_SIZE];
        storage.read_page(page_id, &mut buf).await.unwrap();
        assert!(buf[..8150].iter().all(|&b| b == 0x11));
        assert!(buf[8150..].iter().all(|&b| b == 0xEE));
    }

    pub async fn test_write_range_bounds<S: Storage>(storage: S) {
        let page_id = allocate_and_write(&storage, 0).await;

        let result = storage.write_range(page_id, 8190, &[1, 2, 3]).await;
        assert!(matches!(result, Err(StorageError::RangeOutOfPage { .. })));

        let result = storage.write_range(PageId::new(5), 0, &[1]).await;
        assert!(matches!(result, Err(StorageError::PageNotFound(_))));

        verify_fill(&storage, page_id, 0).await;
    }

    pub async fn test_buffer_size_validation<S: Storage>(storage: S) {
        let page_id = storage.allocate_page().await.unwrap();

        let mut small = vec![0u8; 100];
        let result = storage.read_page(page_id, &mut small).await;
        assert!(matches!(
            result,
            Err(StorageError::InvalidBufferSize {
                expected: PAGE_SIZE,
                actual: 100
            })
        ));

        let result = storage.write_page(page_id, &[0u8; 10]).await;
        assert!(matches!(result, Err(StorageError::InvalidBufferSize { .. })));
    }

    pub async fn test_page_not_found<S: Storage>(storage: S) {
        let mut buf = vec![0u8; PAGE_SIZE];
        let result = storage.read_page(PageId::new(0), &mut buf).await;
        assert!(matches!(result, Err(StorageError::PageNotFound(_))));

        let result = storage.write_page(PageId::new(3), &buf).await;
        assert!(matches!(result, Err(StorageError::PageNotFound(_))));
    }
}
