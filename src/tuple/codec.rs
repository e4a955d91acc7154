//! Raw and catalog-driven tuple decoding, and re-encoding.

use tracing::trace;

use super::datum::Datum;
use super::error::TupleError;
use super::null_bitmap::NullBitmap;
use super::varlena::{VARATT_MAX, VARHDRSZ, VarlenaError, VarlenaForm, VarlenaHeader};
use crate::catalog::{Attribute, AttrLength, TypeCatalog};
use crate::heap::MAX_TUPLE_SIZE;
use crate::storage::max_align;
use crate::tx::{Infomask, TUPLE_HEADER_SIZE, TupleHeader};

/// Size of the OID that pre-12 `WITH OIDS` tables store just before `t_hoff`.
const LEGACY_OID_SIZE: usize = 4;

/// A tuple split into header, null bitmap and undecoded data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTuple {
    pub header: TupleHeader,
    pub null_bitmap: Option<NullBitmap>,
    /// OID of a `WITH OIDS` table row (`HEAP_HASOID_OLD`).
    pub legacy_oid: Option<u32>,
    /// Bytes from `t_hoff` to the end of the tuple.
    pub data: Vec<u8>,
}

impl RawTuple {
    /// Splits tuple bytes without a catalog.
    pub fn decode(bytes: &[u8]) -> Result<Self, TupleError> {
        let prefix = read_prefix(bytes)?;
        Ok(Self {
            header: prefix.header,
            null_bitmap: prefix.null_bitmap,
            legacy_oid: prefix.legacy_oid,
            data: bytes[prefix.header.hoff as usize..].to_vec(),
        })
    }

    /// Offset of the data area within the tuple.
    pub fn data_offset(&self) -> usize {
        self.header.hoff as usize
    }
}

/// One attribute as decoded from the tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAttribute {
    /// Offset of the stored value (varlena header included) from the tuple
    /// start; `None` for NULL.
    pub offset: Option<usize>,
    pub datum: Datum,
    /// Header form a varlena value was stored with.
    pub form: Option<VarlenaForm>,
}

impl DecodedAttribute {
    fn null() -> Self {
        Self {
            offset: None,
            datum: Datum::Null,
            form: None,
        }
    }
}

impl From<Datum> for DecodedAttribute {
    fn from(datum: Datum) -> Self {
        Self {
            offset: None,
            datum,
            form: None,
        }
    }
}

/// A tuple decoded against a [`TypeCatalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedTuple {
    pub header: TupleHeader,
    /// Bitmap as stored; also carries the null bits of attributes the
    /// catalog does not describe.
    pub null_bitmap: Option<NullBitmap>,
    pub legacy_oid: Option<u32>,
    /// One entry per catalog attribute.
    pub attributes: Vec<DecodedAttribute>,
    /// Undecoded bytes of attributes past the end of the catalog.
    pub trailing: Vec<u8>,
}

impl TypedTuple {
    /// Builds a fresh tuple whose attribute count equals `values.len()`.
    pub fn new(mut header: TupleHeader, values: Vec<Datum>) -> Self {
        header.infomask2 = header.infomask2.with_natts(values.len() as u16);
        Self {
            header,
            null_bitmap: None,
            legacy_oid: None,
            attributes: values.into_iter().map(DecodedAttribute::from).collect(),
            trailing: Vec::new(),
        }
    }

    pub fn values(&self) -> impl Iterator<Item = &Datum> {
        self.attributes.iter().map(|attr| &attr.datum)
    }

    /// Replaces every catalogued value, keeping header, trailing attributes
    /// and the stored varlena header forms.
    ///
    /// # Errors
    ///
    /// Returns `TupleError::ValueCount` if `values` has a different length
    /// than the decoded attribute list.
    pub fn with_values(mut self, values: Vec<Datum>) -> Result<Self, TupleError> {
        if values.len() != self.attributes.len() {
            return Err(TupleError::ValueCount {
                expected: self.attributes.len(),
                actual: values.len(),
            });
        }
        for (attr, datum) in self.attributes.iter_mut().zip(values) {
            attr.offset = None;
            attr.datum = datum;
        }
        Ok(self)
    }
}

/// Header, bitmap and legacy OID; everything before `t_hoff`.
struct Prefix {
    header: TupleHeader,
    null_bitmap: Option<NullBitmap>,
    legacy_oid: Option<u32>,
}

fn read_prefix(bytes: &[u8]) -> Result<Prefix, TupleError> {
    if bytes.len() < TUPLE_HEADER_SIZE {
        return Err(TupleError::AttributeOverrun {
            what: "tuple header".to_string(),
            offset: 0,
            needed: TUPLE_HEADER_SIZE,
            tuple_len: bytes.len(),
        });
    }

    let header = TupleHeader::read(bytes);
    let bitmap_end = TUPLE_HEADER_SIZE + header.bitmap_len();
    let has_oid = header.infomask.contains(Infomask::HASOID_OLD);
    let minimum = bitmap_end + if has_oid { LEGACY_OID_SIZE } else { 0 };
    let hoff = header.hoff as usize;
    if hoff < minimum || hoff > bytes.len() {
        return Err(TupleError::InvalidHeaderLength {
            hoff,
            minimum,
            tuple_len: bytes.len(),
        });
    }

    let null_bitmap = header
        .has_nulls()
        .then(|| NullBitmap::from_bytes(&bytes[TUPLE_HEADER_SIZE..bitmap_end], header.natts()));
    let legacy_oid = has_oid.then(|| {
        let at = hoff - LEGACY_OID_SIZE;
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    });

    Ok(Prefix {
        header,
        null_bitmap,
        legacy_oid,
    })
}

fn overrun(attribute: usize, offset: usize, needed: usize, tuple_len: usize) -> TupleError {
    TupleError::AttributeOverrun {
        what: format!("attribute {attribute}"),
        offset,
        needed,
        tuple_len,
    }
}

fn varlena_error(err: VarlenaError, attribute: usize, offset: usize, tuple_len: usize) -> TupleError {
    match err {
        VarlenaError::External => TupleError::UnsupportedVarlena {
            attribute,
            offset,
            form: "external",
        },
        VarlenaError::Compressed => TupleError::UnsupportedVarlena {
            attribute,
            offset,
            form: "compressed",
        },
        VarlenaError::Truncated { needed } => overrun(attribute, offset, needed, tuple_len),
        VarlenaError::InvalidLength(_) | VarlenaError::TooLong(_) => {
            overrun(attribute, offset, VARHDRSZ, tuple_len)
        }
    }
}

/// Returns `bytes[start..start + len]` or an overrun error.
fn take(bytes: &[u8], attribute: usize, start: usize, len: usize) -> Result<&[u8], TupleError> {
    start
        .checked_add(len)
        .and_then(|end| bytes.get(start..end))
        .ok_or_else(|| overrun(attribute, start, len, bytes.len()))
}

/// Start of a varlena value at `cursor`, following `att_align_pointer`:
/// a non-zero byte at an unaligned cursor is a 1-byte header and is not
/// aligned; pad bytes are always zero.
fn varlena_start(bytes: &[u8], cursor: usize, attr: &Attribute) -> usize {
    let aligned = attr.align.align(cursor);
    if aligned != cursor && bytes.get(cursor).is_some_and(|&b| b != 0) {
        cursor
    } else {
        aligned
    }
}

/// Catalog-driven tuple decoder and encoder.
pub struct TupleCodec<'a> {
    catalog: &'a TypeCatalog,
}

impl<'a> TupleCodec<'a> {
    pub fn new(catalog: &'a TypeCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &'a TypeCatalog {
        self.catalog
    }

    /// Decodes every catalogued attribute of a tuple.
    ///
    /// # Errors
    ///
    /// - `CatalogMismatch` if the catalog has more attributes than `natts`
    /// - `UnsupportedVarlena` for external or compressed values
    /// - `AttributeOverrun` if any read would pass the end of `bytes`
    pub fn decode(&self, bytes: &[u8]) -> Result<TypedTuple, TupleError> {
        let prefix = read_prefix(bytes)?;
        let natts = prefix.header.natts();
        if self.catalog.len() > natts {
            return Err(TupleError::CatalogMismatch {
                catalog: self.catalog.len(),
                natts,
            });
        }

        let mut cursor = prefix.header.hoff as usize;
        let mut attributes = Vec::with_capacity(self.catalog.len());
        for (index, attr) in self.catalog.iter().enumerate() {
            let is_null = prefix
                .null_bitmap
                .as_ref()
                .is_some_and(|bitmap| bitmap.is_null(index));
            if is_null {
                attributes.push(DecodedAttribute::null());
                continue;
            }

            let (decoded, next) = self.decode_attribute(bytes, cursor, index, attr)?;
            trace!(index, name = %attr.name, offset = ?decoded.offset, "decoded attribute");
            attributes.push(decoded);
            cursor = next;
        }

        Ok(TypedTuple {
            header: prefix.header,
            null_bitmap: prefix.null_bitmap,
            legacy_oid: prefix.legacy_oid,
            attributes,
            trailing: bytes[cursor..].to_vec(),
        })
    }

    fn decode_attribute(
        &self,
        bytes: &[u8],
        cursor: usize,
        index: usize,
        attr: &Attribute,
    ) -> Result<(DecodedAttribute, usize), TupleError> {
        match attr.length {
            AttrLength::Fixed(len) => {
                let start = attr.align.align(cursor);
                let value = take(bytes, index, start, len)?;
                let decoded = DecodedAttribute {
                    offset: Some(start),
                    datum: Datum::from(value),
                    form: None,
                };
                Ok((decoded, start + len))
            }
            AttrLength::Varlena => {
                let start = varlena_start(bytes, cursor, attr);
                let rest = bytes.get(start..).unwrap_or_default();
                let header = VarlenaHeader::parse(rest)
                    .map_err(|err| varlena_error(err, index, start, bytes.len()))?;
                let stored = take(bytes, index, start, header.total_len())?;
                let decoded = DecodedAttribute {
                    offset: Some(start),
                    datum: Datum::from(&stored[header.header_len()..]),
                    form: Some(header.form()),
                };
                Ok((decoded, start + header.total_len()))
            }
            AttrLength::CString => {
                let start = attr.align.align(cursor);
                let rest = bytes
                    .get(start..)
                    .ok_or_else(|| overrun(index, start, 1, bytes.len()))?;
                let nul = rest
                    .iter()
                    .position(|&b| b == 0)
                    .ok_or_else(|| overrun(index, start, rest.len() + 1, bytes.len()))?;
                let decoded = DecodedAttribute {
                    offset: Some(start),
                    datum: Datum::from(&rest[..nul]),
                    form: None,
                };
                Ok((decoded, start + nul + 1))
            }
        }
    }

    /// Encodes a tuple back into its on-disk bytes.
    ///
    /// The header is carried through except for `t_hoff`, `HEAP_HASNULL` and
    /// `HEAP_HASVARWIDTH`, which are recomputed. Varlena values keep the
    /// header form they were decoded with when it still fits, fresh values
    /// use the shortest form.
    ///
    /// # Errors
    ///
    /// - `ValueCount` / `CatalogMismatch` if the tuple does not match the catalog
    /// - `ValueLength` / `InvalidCString` for values of the wrong shape
    /// - `EncodingOverflow` if the result exceeds the maximum tuple size
    pub fn encode(&self, tuple: &TypedTuple) -> Result<Vec<u8>, TupleError> {
        if tuple.attributes.len() != self.catalog.len() {
            return Err(TupleError::ValueCount {
                expected: self.catalog.len(),
                actual: tuple.attributes.len(),
            });
        }
        let mut header = tuple.header;
        let natts = header.natts();
        if self.catalog.len() > natts {
            return Err(TupleError::CatalogMismatch {
                catalog: self.catalog.len(),
                natts,
            });
        }

        let mut bitmap = tuple
            .null_bitmap
            .clone()
            .filter(|bitmap| bitmap.natts() == natts)
            .unwrap_or_else(|| NullBitmap::all_present(natts));
        for (index, attr) in tuple.attributes.iter().enumerate() {
            bitmap.set_null(index, attr.datum.is_null());
        }
        let has_nulls = bitmap.has_nulls();

        let catalogued_varwidth = self
            .catalog
            .iter()
            .zip(&tuple.attributes)
            .any(|(attr, decoded)| attr.is_variable_width() && !decoded.datum.is_null());
        let trailing_varwidth =
            !tuple.trailing.is_empty() && header.infomask.contains(Infomask::HASVARWIDTH);

        header.infomask.set(Infomask::HASNULL, has_nulls);
        header
            .infomask
            .set(Infomask::HASVARWIDTH, catalogued_varwidth || trailing_varwidth);
        header
            .infomask
            .set(Infomask::HASOID_OLD, tuple.legacy_oid.is_some());

        let bitmap_len = if has_nulls { natts.div_ceil(8) } else { 0 };
        let oid_len = if tuple.legacy_oid.is_some() {
            LEGACY_OID_SIZE
        } else {
            0
        };
        let hoff = max_align(TUPLE_HEADER_SIZE + bitmap_len + oid_len);
        header.hoff = u8::try_from(hoff).map_err(|_| TupleError::EncodingOverflow {
            what: "tuple header",
            length: hoff,
            limit: u8::MAX as usize,
        })?;

        let mut out = vec![0u8; hoff];
        header.write(&mut out);
        if has_nulls {
            out[TUPLE_HEADER_SIZE..TUPLE_HEADER_SIZE + bitmap_len]
                .copy_from_slice(bitmap.as_bytes());
        }
        if let Some(oid) = tuple.legacy_oid {
            out[hoff - LEGACY_OID_SIZE..hoff].copy_from_slice(&oid.to_le_bytes());
        }

        for (index, (attr, decoded)) in self.catalog.iter().zip(&tuple.attributes).enumerate() {
            let Some(payload) = decoded.datum.as_bytes() else {
                continue;
            };
            encode_attribute(&mut out, index, attr, decoded.form, payload)?;
        }
        out.extend_from_slice(&tuple.trailing);

        if out.len() > MAX_TUPLE_SIZE {
            return Err(TupleError::EncodingOverflow {
                what: "tuple",
                length: out.len(),
                limit: MAX_TUPLE_SIZE,
            });
        }
        Ok(out)
    }
}

fn pad_to(out: &mut Vec<u8>, attr: &Attribute) {
    out.resize(attr.align.align(out.len()), 0);
}

fn encode_attribute(
    out: &mut Vec<u8>,
    index: usize,
    attr: &Attribute,
    form: Option<VarlenaForm>,
    payload: &[u8],
) -> Result<(), TupleError> {
    match attr.length {
        AttrLength::Fixed(len) => {
            if payload.len() != len {
                return Err(TupleError::ValueLength {
                    attribute: index,
                    name: attr.name.clone(),
                    expected: len,
                    actual: payload.len(),
                });
            }
            pad_to(out, attr);
            out.extend_from_slice(payload);
        }
        AttrLength::Varlena => {
            let header = VarlenaHeader::new(form.unwrap_or(VarlenaForm::Short), payload.len())
                .map_err(|_| TupleError::EncodingOverflow {
                    what: "varlena value",
                    length: payload.len(),
                    limit: VARATT_MAX - VARHDRSZ,
                })?;
            if header.form() == VarlenaForm::Long {
                pad_to(out, attr);
            }
            header.write_to(out);
            out.extend_from_slice(payload);
        }
        AttrLength::CString => {
            if payload.contains(&0) {
                return Err(TupleError::InvalidCString {
                    attribute: index,
                    name: attr.name.clone(),
                });
            }
            pad_to(out, attr);
            out.extend_from_slice(payload);
            out.push(0);
        }
    }
    Ok(())
}
