//! Varlena length headers (little-endian form).
//!
//! ```text
//! first byte  xxxxxxx1  1-byte header, total length = byte >> 1 (max 127)
//! first byte  00000001  1-byte external TOAST pointer      (unsupported)
//! first word  ......00  4-byte header, total length = word >> 2 (max 1GB-1)
//! first word  ......10  4-byte header, inline compressed   (unsupported)
//! ```
//!
//! The total length always includes the header itself, so the payload is
//! `total - 1` bytes for the short form and `total - 4` for the long form.
//! Short headers are never aligned; long headers sit at the attribute's
//! alignment boundary.

use thiserror::Error;

/// Size of the 4-byte header.
pub const VARHDRSZ: usize = 4;
/// Size of the 1-byte header.
pub const VARHDRSZ_SHORT: usize = 1;
/// Largest total length a 1-byte header can describe.
pub const VARATT_SHORT_MAX: usize = 0x7F;
/// Largest total length a 4-byte header can describe.
pub const VARATT_MAX: usize = 0x3FFF_FFFF;

const EXTERNAL_TAG: u8 = 0x01;
const SHORT_FLAG: u8 = 0x01;
const LONG_TAG_MASK: u32 = 0x03;
const LONG_UNCOMPRESSED: u32 = 0x00;

/// Which header form a varlena value uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarlenaForm {
    Short,
    Long,
}

/// Problems with a varlena header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VarlenaError {
    #[error("varlena header needs {needed} bytes")]
    Truncated { needed: usize },
    #[error("external TOAST pointer")]
    External,
    #[error("compressed varlena")]
    Compressed,
    #[error("declared length {0} is shorter than the header")]
    InvalidLength(usize),
    #[error("payload of {0} bytes does not fit a varlena header")]
    TooLong(usize),
}

/// A decoded inline, uncompressed varlena header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarlenaHeader {
    form: VarlenaForm,
    total_len: usize,
}

impl VarlenaHeader {
    /// Header of the given form for a payload of `payload_len` bytes.
    ///
    /// A short header is upgraded to a long one when the payload does not fit.
    pub fn new(form: VarlenaForm, payload_len: usize) -> Result<Self, VarlenaError> {
        if form == VarlenaForm::Short && payload_len + VARHDRSZ_SHORT <= VARATT_SHORT_MAX {
            return Ok(Self {
                form,
                total_len: payload_len + VARHDRSZ_SHORT,
            });
        }
        let total_len = payload_len
            .checked_add(VARHDRSZ)
            .filter(|&total| total <= VARATT_MAX)
            .ok_or(VarlenaError::TooLong(payload_len))?;
        Ok(Self {
            form: VarlenaForm::Long,
            total_len,
        })
    }

    /// Shortest header able to describe `payload_len` bytes.
    pub fn shortest(payload_len: usize) -> Result<Self, VarlenaError> {
        Self::new(VarlenaForm::Short, payload_len)
    }

    /// Parses the header at the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, VarlenaError> {
        let first = *bytes.first().ok_or(VarlenaError::Truncated { needed: 1 })?;

        if first == EXTERNAL_TAG {
            return Err(VarlenaError::External);
        }
        if first & SHORT_FLAG == SHORT_FLAG {
            return Ok(Self {
                form: VarlenaForm::Short,
                total_len: (first >> 1) as usize,
            });
        }

        let word = match bytes.get(..VARHDRSZ) {
            Some(b) => u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            None => return Err(VarlenaError::Truncated { needed: VARHDRSZ }),
        };
        if word & LONG_TAG_MASK != LONG_UNCOMPRESSED {
            return Err(VarlenaError::Compressed);
        }
        let total_len = (word >> 2) as usize;
        if total_len < VARHDRSZ {
            return Err(VarlenaError::InvalidLength(total_len));
        }
        Ok(Self {
            form: VarlenaForm::Long,
            total_len,
        })
    }

    pub fn form(&self) -> VarlenaForm {
        self.form
    }

    /// Header plus payload length.
    pub fn total_len(&self) -> usize {
        self.total_len
    }

    pub fn header_len(&self) -> usize {
        match self.form {
            VarlenaForm::Short => VARHDRSZ_SHORT,
            VarlenaForm::Long => VARHDRSZ,
        }
    }

    pub fn payload_len(&self) -> usize {
        self.total_len - self.header_len()
    }

    /// Appends the encoded header to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self.form {
            VarlenaForm::Short => out.push(((self.total_len as u8) << 1) | SHORT_FLAG),
            VarlenaForm::Long => out.extend_from_slice(&((self.total_len as u32) << 2).to_le_bytes()),
        }
    }
}
