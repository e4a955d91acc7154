//! The filenode editor.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::error::EditorError;
use super::view::{
    FieldView, ItemContents, ItemSummary, ItemView, PageListing, PageSummary, TupleHeaderView,
    WriteReport,
};
use crate::catalog::TypeCatalog;
use crate::format::{FieldText, ValueFormatter};
use crate::heap::HeapPage;
use crate::storage::{FileStorage, PAGE_SIZE, PageId, Storage};
use crate::tuple::{Datum, RawTuple, TupleCodec, TupleError};

/// Lists, decodes and rewrites tuples of one heap filenode.
///
/// Without a catalog tuples are read in raw mode (header plus undecoded
/// data); with one they are decoded attribute by attribute.
pub struct FilenodeEditor<S: Storage> {
    storage: S,
    catalog: Option<TypeCatalog>,
}

impl FilenodeEditor<FileStorage> {
    /// Opens a filenode for reading and in-place updates.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::Storage` if the file cannot be opened or its
    /// size is not a multiple of `PAGE_SIZE`.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, EditorError> {
        Ok(Self::new(FileStorage::open(path).await?))
    }

    /// Opens a filenode for `list` and `read` only.
    pub async fn open_read_only(path: impl Into<PathBuf>) -> Result<Self, EditorError> {
        Ok(Self::new(FileStorage::open_read_only(path).await?))
    }
}

impl<S: Storage> FilenodeEditor<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            catalog: None,
        }
    }

    /// Switches `read` to typed mode and enables `update`.
    pub fn with_catalog(mut self, catalog: TypeCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn catalog(&self) -> Option<&TypeCatalog> {
        self.catalog.as_ref()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub async fn page_count(&self) -> usize {
        self.storage.page_count().await
    }

    async fn load_page(&self, page: u64) -> Result<HeapPage<Vec<u8>>, EditorError> {
        let page_count = self.storage.page_count().await;
        if page >= page_count as u64 {
            return Err(EditorError::PageNotFound { page, page_count });
        }

        let mut data = vec![0u8; PAGE_SIZE];
        self.storage.read_page(PageId::new(page), &mut data).await?;
        debug!(page, "read page");

        HeapPage::parse(data).map_err(|source| EditorError::Heap { page, source })
    }

    /// Lists line pointers of one page, or of every page when `page` is
    /// `None`. Tuple payloads are never decoded.
    ///
    /// A page that cannot be read or parsed becomes a
    /// [`PageListing::Failed`] entry and the listing continues.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::PageNotFound` only when an explicitly
    /// requested page does not exist.
    pub async fn list(&self, page: Option<u64>) -> Result<Vec<PageListing>, EditorError> {
        let page_count = self.storage.page_count().await;
        let pages = match page {
            Some(page) if page >= page_count as u64 => {
                return Err(EditorError::PageNotFound { page, page_count });
            }
            Some(page) => page..page + 1,
            None => 0..page_count as u64,
        };

        let mut listings = Vec::new();
        for page in pages {
            let listing = match self.load_page(page).await {
                Ok(heap) => PageListing::Parsed {
                    page,
                    header: PageSummary::from(&heap.header()),
                    items: heap
                        .item_ids()
                        .map(|(item, item_id)| ItemSummary::new(item, item_id))
                        .collect(),
                },
                Err(err) => {
                    warn!(page, error = %err, "skipping unreadable page");
                    PageListing::Failed {
                        page,
                        kind: err.kind(),
                        message: err.to_string(),
                    }
                }
            };
            listings.push(listing);
        }
        Ok(listings)
    }

    /// Decodes one tuple, typed if a catalog is set, raw otherwise.
    ///
    /// # Errors
    ///
    /// - `ItemNotFound` kinds if the item does not exist or has no storage
    /// - `MalformedPage` if the page header is inconsistent
    /// - tuple decoding errors (`CatalogMismatch`, `UnsupportedVarlena`,
    ///   `AttributeOverrun`)
    pub async fn read(&self, page: u64, item: usize) -> Result<ItemView, EditorError> {
        let heap = self.load_page(page).await?;
        let span = heap
            .tuple_span(item)
            .map_err(|source| EditorError::Heap { page, source })?;
        let bytes = &heap.as_bytes()[span.clone()];
        let tuple_error = |source: TupleError| EditorError::Tuple { page, item, source };

        let (header, contents) = match &self.catalog {
            None => {
                let raw = RawTuple::decode(bytes).map_err(tuple_error)?;
                let header =
                    TupleHeaderView::new(&raw.header, raw.null_bitmap.as_ref(), raw.legacy_oid);
                let contents = ItemContents::Raw {
                    data: FieldText::from_bytes(&raw.data),
                };
                (header, contents)
            }
            Some(catalog) => {
                let typed = TupleCodec::new(catalog).decode(bytes).map_err(tuple_error)?;
                let header = TupleHeaderView::new(
                    &typed.header,
                    typed.null_bitmap.as_ref(),
                    typed.legacy_oid,
                );
                let fields = catalog
                    .iter()
                    .zip(&typed.attributes)
                    .map(|(attr, decoded)| {
                        FieldView::new(attr, decoded, ValueFormatter::format(attr, &decoded.datum))
                    })
                    .collect();
                let trailing =
                    (!typed.trailing.is_empty()).then(|| FieldText::from_bytes(&typed.trailing));
                (header, ItemContents::Typed { fields, trailing })
            }
        };
        debug!(page, item, offset = span.start, length = span.len(), "decoded tuple");

        Ok(ItemView {
            page,
            item,
            offset: span.start,
            length: span.len(),
            header,
            contents,
        })
    }

    /// Replaces every catalogued value of a tuple and writes it back in
    /// place. Header fields and attributes beyond the catalog are kept.
    ///
    /// # Errors
    ///
    /// - `EditorError::CatalogRequired` without a catalog
    /// - `SizeMismatch` if the re-encoded tuple is not exactly as long as
    ///   the stored one
    /// - any error `read` can return for the item
    pub async fn update(
        &self,
        page: u64,
        item: usize,
        values: Vec<Datum>,
    ) -> Result<WriteReport, EditorError> {
        let catalog = self.catalog.as_ref().ok_or(EditorError::CatalogRequired)?;
        let codec = TupleCodec::new(catalog);
        let tuple_error = |source: TupleError| EditorError::Tuple { page, item, source };

        let mut heap = self.load_page(page).await?;
        let current = heap
            .tuple(item)
            .map_err(|source| EditorError::Heap { page, source })?;
        let tuple = codec
            .decode(current)
            .and_then(|tuple| tuple.with_values(values))
            .map_err(tuple_error)?;
        let encoded = codec.encode(&tuple).map_err(tuple_error)?;

        self.write_tuple(&mut heap, page, item, &encoded).await
    }

    /// Like [`update`](Self::update), with values given as [`FieldText`]
    /// and parsed through the [`ValueFormatter`].
    pub async fn update_fields(
        &self,
        page: u64,
        item: usize,
        fields: &[FieldText],
    ) -> Result<WriteReport, EditorError> {
        let catalog = self.catalog.as_ref().ok_or(EditorError::CatalogRequired)?;
        let values = ValueFormatter::parse_all(catalog, fields)
            .map_err(|source| EditorError::Format { page, item, source })?;
        self.update(page, item, values).await
    }

    /// Overwrites the whole tuple (header included) with `bytes` verbatim.
    ///
    /// # Errors
    ///
    /// Returns a `SizeMismatch` kind if `bytes` is not exactly the stored
    /// tuple length.
    pub async fn raw_update(
        &self,
        page: u64,
        item: usize,
        bytes: &[u8],
    ) -> Result<WriteReport, EditorError> {
        let mut heap = self.load_page(page).await?;
        self.write_tuple(&mut heap, page, item, bytes).await
    }

    /// Overwrites only the data area (`t_hoff` to the end of the tuple),
    /// keeping header, null bitmap and padding.
    pub async fn raw_update_data(
        &self,
        page: u64,
        item: usize,
        data: &[u8],
    ) -> Result<WriteReport, EditorError> {
        let mut heap = self.load_page(page).await?;
        let current = heap
            .tuple(item)
            .map_err(|source| EditorError::Heap { page, source })?;
        let hoff = RawTuple::decode(current)
            .map_err(|source| EditorError::Tuple { page, item, source })?
            .data_offset();

        let mut bytes = current[..hoff].to_vec();
        bytes.extend_from_slice(data);
        self.write_tuple(&mut heap, page, item, &bytes).await
    }

    /// Copies `bytes` over the item's span in the page image and writes
    /// exactly that span to storage.
    async fn write_tuple(
        &self,
        heap: &mut HeapPage<Vec<u8>>,
        page: u64,
        item: usize,
        bytes: &[u8],
    ) -> Result<WriteReport, EditorError> {
        let offset = heap
            .replace(item, bytes)
            .map_err(|source| EditorError::Heap { page, source })?;

        let checksum = heap.header().checksum;
        if checksum != 0 {
            warn!(page, checksum, "page checksum is not recomputed and no longer matches");
        }

        let page_id = PageId::new(page);
        self.storage.write_range(page_id, offset, bytes).await?;
        self.storage.sync_all().await?;
        info!(page, item, offset, length = bytes.len(), "rewrote tuple in place");

        Ok(WriteReport {
            page,
            item,
            offset,
            file_offset: page_id.byte_offset() + offset as u64,
            length: bytes.len(),
        })
    }
}
