//! NDR string types
//!
//! `[string]` strings are conformant varying arrays with a null terminator.
//!
//! Wire format:
//! ```text
//! max_count: u32    # Maximum elements including null (hoisted)
//! offset: u32       # Always 0
//! actual_count: u32 # Actual elements including null
//! chars[actual_count]
//! ```
//!
//! The automation `BSTR` is a unique pointer to a `FLAGGED_WORD_BLOB`, a
//! conformant structure carrying a byte length and a character count ahead
//! of the UTF-16 data. No terminator is transmitted.

use crate::arrays::check_varying;
use crate::size_info::{decode_elements, encode_elements, reconcile_count, saturating_count};
use crate::{
    decode_conformant, encode_conformant, NdrConformant, NdrDecode, NdrEncode, NdrError, NdrPtr,
    NdrReader, NdrWriter, Result, SizeInfo, UniquePtr,
};

/// Read the varying header of a string and return its actual count
fn read_string_header(r: &mut NdrReader<'_>, size: &SizeInfo, unit: usize) -> Result<usize> {
    let offset = r.read_u32()?;
    let actual = r.read_u32()?;
    if offset != 0 {
        return Err(NdrError::InvalidString(format!("non-zero offset {}", offset)));
    }
    check_varying(size.dim(0)?, offset, actual)?;
    r.check_count(actual as usize, unit)
}

/// ANSI string type (null-terminated char*)
///
/// Used for [string] annotated char* parameters in MIDL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NdrString(pub String);

impl NdrString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for NdrString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl NdrConformant for NdrString {
    fn ndr_size_info(&self) -> SizeInfo {
        SizeInfo::one(self.0.len() + 1)
    }

    fn encode_body<'a>(&'a self, w: &mut NdrWriter<'a>, size: &SizeInfo) -> Result<()> {
        let mut data = self.0.as_bytes().to_vec();
        data.push(0);
        let actual = data.len().min(size.dim(0)?);
        w.write_u32(0);
        w.write_count(actual)?;
        w.write_bytes(&data[..actual]);
        Ok(())
    }

    fn decode_body<'a>(&'a mut self, r: &mut NdrReader<'a>, size: &SizeInfo) -> Result<()> {
        let actual = read_string_header(r, size, 1)?;
        let mut data = r.read_bytes(actual)?.to_vec();
        if data.last() == Some(&0) {
            data.pop();
        }
        self.0 = String::from_utf8(data)?;
        Ok(())
    }
}

impl NdrEncode for NdrString {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        encode_conformant(self, w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for NdrString {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        decode_conformant(self, r)
    }

    fn ndr_align() -> usize {
        4
    }
}

/// Wide string type (null-terminated wchar_t*)
///
/// Used for [string] annotated wchar_t* parameters in MIDL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NdrWString(pub String);

impl NdrWString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    fn units(&self) -> Vec<u16> {
        self.0.encode_utf16().chain(std::iter::once(0)).collect()
    }
}

impl From<&str> for NdrWString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl NdrConformant for NdrWString {
    fn ndr_size_info(&self) -> SizeInfo {
        SizeInfo::one(self.0.encode_utf16().count() + 1)
    }

    fn encode_body<'a>(&'a self, w: &mut NdrWriter<'a>, size: &SizeInfo) -> Result<()> {
        let units = self.units();
        let actual = units.len().min(size.dim(0)?);
        w.write_u32(0);
        w.write_count(actual)?;
        for unit in &units[..actual] {
            w.write_u16(*unit);
        }
        Ok(())
    }

    fn decode_body<'a>(&'a mut self, r: &mut NdrReader<'a>, size: &SizeInfo) -> Result<()> {
        let actual = read_string_header(r, size, 2)?;
        let mut units = Vec::with_capacity(actual);
        for _ in 0..actual {
            units.push(r.read_u16()?);
        }
        if units.last() == Some(&0) {
            units.pop();
        }
        self.0 = char::decode_utf16(units).collect::<std::result::Result<String, _>>()?;
        Ok(())
    }
}

impl NdrEncode for NdrWString {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        encode_conformant(self, w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for NdrWString {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        decode_conformant(self, r)
    }

    fn ndr_align() -> usize {
        4
    }
}

/// `FLAGGED_WORD_BLOB`: `{ cBytes; clSize; [size_is(clSize)] asData[] }`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlaggedWordBlob {
    /// Length of the string in bytes
    pub cb_bytes: u32,
    /// Length of the string in characters; zero means "use `as_data`"
    pub cl_size: u32,
    pub as_data: Vec<u16>,
}

impl FlaggedWordBlob {
    pub fn new(s: &str) -> Self {
        let as_data: Vec<u16> = s.encode_utf16().collect();
        Self {
            cb_bytes: saturating_count(as_data.len().saturating_mul(2)),
            cl_size: saturating_count(as_data.len()),
            as_data,
        }
    }

    fn char_count(&self) -> usize {
        if self.cl_size == 0 {
            self.as_data.len()
        } else {
            self.cl_size as usize
        }
    }
}

impl NdrConformant for FlaggedWordBlob {
    fn ndr_size_info(&self) -> SizeInfo {
        SizeInfo::one(self.char_count())
    }

    fn encode_body<'a>(&'a self, w: &mut NdrWriter<'a>, size: &SizeInfo) -> Result<()> {
        let count = size.dim(0)?;
        let cb_bytes = if self.cb_bytes == 0 { count * 2 } else { self.cb_bytes as usize };
        w.write_count(cb_bytes)?;
        w.write_count(count)?;
        encode_elements(&self.as_data, count, w)
    }

    fn decode_body<'a>(&'a mut self, r: &mut NdrReader<'a>, size: &SizeInfo) -> Result<()> {
        self.cb_bytes = r.read_u32()?;
        self.cl_size = r.read_u32()?;
        let count = reconcile_count(size.dim(0)?, self.cl_size as usize);
        decode_elements(&mut self.as_data, count, r)
    }
}

crate::impl_ndr_conformant!(FlaggedWordBlob, 4);

/// Automation string (`BSTR`)
///
/// A null `BStr` writes a zero sentinel and nothing else. An empty one
/// writes a live pointer to a zero-length blob.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BStr(pub UniquePtr<FlaggedWordBlob>);

impl BStr {
    pub fn new(s: &str) -> Self {
        Self(UniquePtr::new(FlaggedWordBlob::new(s)))
    }

    pub fn null() -> Self {
        Self(UniquePtr::null())
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// The string value, or `None` for a null `BSTR`
    pub fn as_string(&self) -> Option<String> {
        self.0
            .as_ref()
            .map(|blob| String::from_utf16_lossy(&blob.as_data))
    }
}

impl From<&str> for BStr {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl NdrEncode for BStr {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        self.0.ndr_encode(w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for BStr {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.0.ndr_decode(r)
    }

    fn ndr_align() -> usize {
        4
    }
}
