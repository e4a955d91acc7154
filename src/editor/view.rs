//! Serializable results of editor operations.

use std::fmt;

use serde::Serialize;

use super::error::ErrorKind;
use crate::catalog::Attribute;
use crate::format::FieldText;
use crate::heap::{ItemId, ItemStatus, PageHeader};
use crate::tuple::{DecodedAttribute, NullBitmap};
use crate::tx::TupleHeader;

/// Page header fields as shown in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub lsn: String,
    pub checksum: u16,
    pub flags: u16,
    pub lower: u16,
    pub upper: u16,
    pub special: u16,
    pub page_size: usize,
    pub layout_version: u8,
    pub prune_xid: u32,
    pub free_space: u16,
    pub is_new: bool,
}

impl From<&PageHeader> for PageSummary {
    fn from(header: &PageHeader) -> Self {
        Self {
            lsn: header.lsn_text(),
            checksum: header.checksum,
            flags: header.flags.bits(),
            lower: header.lower,
            upper: header.upper,
            special: header.special,
            page_size: header.page_size(),
            layout_version: header.layout_version(),
            prune_xid: header.prune_xid,
            free_space: header.free_space(),
            is_new: header.is_new(),
        }
    }
}

/// One line pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSummary {
    pub item: usize,
    pub offset: u16,
    pub length: u16,
    pub status: ItemStatus,
    /// Target item of a redirect line pointer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<usize>,
}

impl ItemSummary {
    pub fn new(item: usize, item_id: ItemId) -> Self {
        Self {
            item,
            offset: item_id.offset,
            length: item_id.length,
            status: item_id.status,
            redirect_to: item_id.redirect_target(),
        }
    }
}

/// Listing of one page; a page that fails to parse becomes a `Failed`
/// entry instead of aborting the listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PageListing {
    Parsed {
        page: u64,
        header: PageSummary,
        items: Vec<ItemSummary>,
    },
    Failed {
        page: u64,
        kind: ErrorKind,
        message: String,
    },
}

impl PageListing {
    pub fn page(&self) -> u64 {
        match self {
            PageListing::Parsed { page, .. } | PageListing::Failed { page, .. } => *page,
        }
    }
}

/// Tuple header fields with decoded flag names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TupleHeaderView {
    pub xmin: u32,
    pub xmax: u32,
    pub cid: u32,
    pub ctid: String,
    pub natts: usize,
    pub infomask2: u16,
    pub infomask: u16,
    /// Names of the set `t_infomask` and `t_infomask2` flag bits.
    pub flags: Vec<String>,
    pub hoff: u8,
    /// Null bitmap bytes in hex, absent without `HEAP_HASNULL`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub null_bitmap: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy_oid: Option<u32>,
}

impl TupleHeaderView {
    pub fn new(header: &TupleHeader, bitmap: Option<&NullBitmap>, legacy_oid: Option<u32>) -> Self {
        let flags = header
            .infomask
            .iter_names()
            .map(|(name, _)| name.to_string())
            .chain(
                header
                    .infomask2
                    .flags()
                    .iter_names()
                    .map(|(name, _)| name.to_string()),
            )
            .collect();
        Self {
            xmin: header.xmin.as_u32(),
            xmax: header.xmax.as_u32(),
            cid: header.cid.as_u32(),
            ctid: header.ctid.to_string(),
            natts: header.natts(),
            infomask2: header.infomask2.as_u16(),
            infomask: header.infomask.bits(),
            flags,
            hoff: header.hoff,
            null_bitmap: bitmap.map(|bitmap| hex::encode(bitmap.as_bytes())),
            legacy_oid,
        }
    }
}

/// One typed attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    /// Offset of the stored value within the tuple; absent for NULL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    pub value: FieldText,
}

impl FieldView {
    pub fn new(attr: &Attribute, decoded: &DecodedAttribute, value: FieldText) -> Self {
        Self {
            name: attr.name.clone(),
            type_name: attr.type_name.clone(),
            offset: decoded.offset,
            value,
        }
    }
}

/// Tuple contents in raw or typed mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ItemContents {
    /// Bytes from `t_hoff` to the end of the tuple.
    Raw { data: FieldText },
    Typed {
        fields: Vec<FieldView>,
        /// Undecoded bytes of attributes the catalog does not describe.
        #[serde(skip_serializing_if = "Option::is_none")]
        trailing: Option<FieldText>,
    },
}

/// A decoded tuple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    pub page: u64,
    pub item: usize,
    /// Offset of the tuple within the page.
    pub offset: usize,
    pub length: usize,
    pub header: TupleHeaderView,
    #[serde(flatten)]
    pub contents: ItemContents,
}

/// Location of bytes written by an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub page: u64,
    pub item: usize,
    /// Offset of the tuple within the page.
    pub offset: usize,
    /// Offset of the tuple within the filenode.
    pub file_offset: u64,
    pub length: usize,
}

impl fmt::Display for PageListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageListing::Parsed {
                page,
                header,
                items,
            } => {
                writeln!(
                    f,
                    "page {page}: lsn={} checksum={:#06x} flags={:#x} lower={} upper={} special={} version={} prune_xid={}",
                    header.lsn,
                    header.checksum,
                    header.flags,
                    header.lower,
                    header.upper,
                    header.special,
                    header.layout_version,
                    header.prune_xid,
                )?;
                if header.is_new {
                    writeln!(f, "  (new page)")?;
                }
                for item in items {
                    write!(
                        f,
                        "  item {}: offset={} length={} status={}",
                        item.item, item.offset, item.length, item.status
                    )?;
                    if let Some(target) = item.redirect_to {
                        write!(f, " -> item {target}")?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
            PageListing::Failed {
                page,
                kind,
                message,
            } => writeln!(f, "page {page}: error {kind}: {message}"),
        }
    }
}

impl fmt::Display for ItemView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = &self.header;
        writeln!(
            f,
            "page {} item {}: offset={} length={}",
            self.page, self.item, self.offset, self.length
        )?;
        writeln!(
            f,
            "  xmin={} xmax={} cid={} ctid={} natts={} infomask={:#06x} infomask2={:#06x} hoff={}",
            h.xmin, h.xmax, h.cid, h.ctid, h.natts, h.infomask, h.infomask2, h.hoff
        )?;
        if !h.flags.is_empty() {
            writeln!(f, "  flags: {}", h.flags.join(" "))?;
        }
        if let Some(bitmap) = &h.null_bitmap {
            writeln!(f, "  null bitmap: {bitmap}")?;
        }
        if let Some(oid) = h.legacy_oid {
            writeln!(f, "  oid: {oid}")?;
        }
        match &self.contents {
            ItemContents::Raw { data } => writeln!(f, "  data: {data}"),
            ItemContents::Typed { fields, trailing } => {
                for field in fields {
                    writeln!(f, "  {} ({}): {}", field.name, field.type_name, field.value)?;
                }
                if let Some(trailing) = trailing {
                    writeln!(f, "  trailing: {trailing}")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for WriteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page {} item {}: wrote {} bytes at offset {} (file offset {})",
            self.page, self.item, self.length, self.offset, self.file_offset
        )
    }
}
