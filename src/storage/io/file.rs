//! File-backed storage over a filenode on disk.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs::{File as TokioFile, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::debug;

use super::{Storage, check_range};
use crate::storage::error::StorageError;
use crate::storage::page::{PAGE_SIZE, PageId};

/// A filenode file accessed page by page.
///
/// # File Layout
///
/// ```text
/// +------------------+------------------+------------------+
/// | Page 0 (8KB)     | Page 1 (8KB)     | Page 2 (8KB)     | ...
/// +------------------+------------------+------------------+
/// ^ offset 0         ^ offset 8192      ^ offset 16384
/// ```
///
/// A `tokio::Mutex` around the file handle serializes seeks and reads.
/// Nothing is written until a write method is called, and `sync_all()` is
/// required for the change to be durable.
pub struct FileStorage {
    path: PathBuf,
    file: Mutex<TokioFile>,
    page_count: AtomicU64,
}

impl FileStorage {
    /// Opens an existing filenode for reading and writing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the file does not exist, and
    /// `StorageError::Corrupted` if its size is not a multiple of PAGE_SIZE.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .await?;
        Self::from_file(path, file).await
    }

    /// Opens an existing filenode without write access.
    pub async fn open_read_only(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let file = OpenOptions::new().read(true).open(&path).await?;
        Self::from_file(path, file).await
    }

    /// Creates an empty filenode, truncating any existing file.
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .await?;
        Self::from_file(path, file).await
    }

    async fn from_file(path: PathBuf, file: TokioFile) -> Result<Self, StorageError> {
        let file_size = file.metadata().await?.len();

        if file_size % PAGE_SIZE as u64 != 0 {
            return Err(StorageError::Corrupted(format!(
                "file size {} is not a multiple of page size {}",
                file_size, PAGE_SIZE
            )));
        }

        let page_count = file_size / PAGE_SIZE as u64;
        debug!(path = %path.display(), page_count, "opened filenode");

        Ok(Self {
            path,
            file: Mutex::new(file),
            page_count: AtomicU64::new(page_count),
        })
    }

    /// Returns the path to the filenode.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_page(&self, page_id: PageId) -> Result<(), StorageError> {
        if page_id.page_num() >= self.page_count.load(Ordering::Acquire) {
            return Err(StorageError::PageNotFound(page_id));
        }
        Ok(())
    }
}

impl Storage for FileStorage {
    async fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> Result<(), StorageError> {
        if buf.len() != PAGE_SIZE {
            return Err(StorageError::InvalidBufferSize {
                expected: PAGE_SIZE,
                actual: buf.len(),
            });
        }
        self.check_page(page_id)?;

        let mut file = self.file.lock().await;
        file.seek(std::io::SeekFrom::Start(page_id.byte_offset()))
            .await?;
        file.read_exact(buf).await?;

        Ok(())
    }

    async fn write_page(&self, page_id: PageId, buf: &[u8]) -> Result<(), StorageError> {
        if buf.len() != PAGE_SIZE {
            return Err(StorageError::InvalidBufferSize {
                expected: PAGE_SIZE,
                actual: buf.len(),
            });
        }
        self.check_page(page_id)?;

        let mut file = self.file.lock().await;
        file.seek(std::io::SeekFrom::Start(page_id.byte_offset()))
            .await?;
        file.write_all(buf).await?;

        Ok(())
    }

    async fn write_range(
        &self,
        page_id: PageId,
        offset: usize,
        buf: &[u8],
    ) -> Result<(), StorageError> {
        self.check_page(page_id)?;
        check_range(page_id, offset, buf.len())?;

        let mut file = self.file.lock().await;
        file.seek(std::io::SeekFrom::Start(
            page_id.byte_offset() + offset as u64,
        ))
        .await?;
        file.write_all(buf).await?;
        file.flush().await?;

        Ok(())
    }

    async fn allocate_page(&self) -> Result<PageId, StorageError> {
        let mut file = self.file.lock().await;

        let page_num = self.page_count.load(Ordering::Acquire);
        let page_id = PageId::new(page_num);

        file.seek(std::io::SeekFrom::Start(page_id.byte_offset()))
            .await?;
        file.write_all(&[0u8; PAGE_SIZE]).await?;

        self.page_count.store(page_num + 1, Ordering::Release);

        Ok(page_id)
    }

    async fn page_count(&self) -> usize {
        self.page_count.load(Ordering::Acquire) as usize
    }

    async fn sync_all(&self) -> Result<(), StorageError> {
        let mut file = self.file.lock().await;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }
}
