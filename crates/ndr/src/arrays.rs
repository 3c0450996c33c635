//! NDR array types
//!
//! NDR supports several array types:
//!
//! - Fixed arrays: size known at compile time
//! - Conformant arrays: size determined at runtime, transmitted as prefix
//! - Varying arrays: subset of elements transmitted
//! - Conformant varying arrays: both conformant and varying
//!
//! Conformant arrays implement [`NdrConformant`], so an enclosing structure
//! can hoist their max count and pass it back down when it encodes or
//! decodes the elements.

use crate::size_info::{decode_elements, encode_elements, reconcile_count, saturating_count};
use crate::{
    decode_conformant, encode_conformant, NdrConformant, NdrDecode, NdrEncode, NdrError, NdrReader,
    NdrWriter, Result, SizeInfo,
};

/// Fixed-size array
///
/// Wire format: just the elements (no size prefix)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedArray<T, const N: usize> {
    pub elements: [T; N],
}

impl<T: Default, const N: usize> Default for FixedArray<T, N> {
    fn default() -> Self {
        Self {
            elements: std::array::from_fn(|_| T::default()),
        }
    }
}

impl<T, const N: usize> FixedArray<T, N> {
    pub fn new(elements: [T; N]) -> Self {
        Self { elements }
    }
}

impl<T: NdrEncode, const N: usize> NdrEncode for FixedArray<T, N> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        for elem in &self.elements {
            elem.ndr_encode(w)?;
        }
        Ok(())
    }

    fn ndr_align() -> usize {
        T::ndr_align()
    }
}

impl<T: NdrDecode, const N: usize> NdrDecode for FixedArray<T, N> {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        for elem in self.elements.iter_mut() {
            elem.ndr_decode(r)?;
        }
        Ok(())
    }

    fn ndr_align() -> usize {
        T::ndr_align()
    }
}

/// Conformant array
///
/// Wire format: max_count (u32), then max_count elements. The max count is
/// hoisted when the array is the trailing member of a structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConformantArray<T> {
    pub elements: Vec<T>,
}

impl<T> Default for ConformantArray<T> {
    fn default() -> Self {
        Self { elements: Vec::new() }
    }
}

impl<T> ConformantArray<T> {
    pub fn new(elements: Vec<T>) -> Self {
        Self { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn into_inner(self) -> Vec<T> {
        self.elements
    }
}

impl<T> From<Vec<T>> for ConformantArray<T> {
    fn from(elements: Vec<T>) -> Self {
        Self::new(elements)
    }
}

impl<T: NdrEncode + NdrDecode + Default> NdrConformant for ConformantArray<T> {
    fn ndr_size_info(&self) -> SizeInfo {
        SizeInfo::one(self.elements.len())
    }

    fn encode_body<'a>(&'a self, w: &mut NdrWriter<'a>, size: &SizeInfo) -> Result<()> {
        encode_elements(&self.elements, size.dim(0)?, w)
    }

    fn decode_body<'a>(&'a mut self, r: &mut NdrReader<'a>, size: &SizeInfo) -> Result<()> {
        decode_elements(&mut self.elements, size.dim(0)?, r)
    }
}

impl<T: NdrEncode + NdrDecode + Default> NdrEncode for ConformantArray<T> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        encode_conformant(self, w)
    }

    fn ndr_align() -> usize {
        4usize.max(<T as NdrEncode>::ndr_align())
    }
}

impl<T: NdrEncode + NdrDecode + Default> NdrDecode for ConformantArray<T> {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        decode_conformant(self, r)
    }

    fn ndr_align() -> usize {
        4usize.max(<T as NdrDecode>::ndr_align())
    }
}

/// Varying array
///
/// Wire format: offset (u32), actual_count (u32), then the elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaryingArray<T> {
    pub offset: u32,
    pub elements: Vec<T>,
}

impl<T> Default for VaryingArray<T> {
    fn default() -> Self {
        Self {
            offset: 0,
            elements: Vec::new(),
        }
    }
}

impl<T> VaryingArray<T> {
    pub fn new(elements: Vec<T>) -> Self {
        Self { offset: 0, elements }
    }
}

impl<T: NdrEncode> NdrEncode for VaryingArray<T> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_u32(self.offset);
        w.write_count(self.elements.len())?;
        for elem in &self.elements {
            elem.ndr_encode(w)?;
        }
        Ok(())
    }

    fn ndr_align() -> usize {
        4usize.max(T::ndr_align())
    }
}

impl<T: NdrDecode + Default> NdrDecode for VaryingArray<T> {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.offset = r.read_u32()?;
        let actual = r.read_u32()? as usize;
        decode_elements(&mut self.elements, actual, r)
    }

    fn ndr_align() -> usize {
        4usize.max(T::ndr_align())
    }
}

/// Conformant varying array
///
/// Wire format: max_count (u32, hoisted), offset (u32), actual_count (u32),
/// then actual_count elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConformantVaryingArray<T> {
    pub max_count: u32,
    pub offset: u32,
    pub elements: Vec<T>,
}

impl<T> Default for ConformantVaryingArray<T> {
    fn default() -> Self {
        Self {
            max_count: 0,
            offset: 0,
            elements: Vec::new(),
        }
    }
}

impl<T> ConformantVaryingArray<T> {
    pub fn new(elements: Vec<T>) -> Self {
        Self {
            max_count: saturating_count(elements.len()),
            offset: 0,
            elements,
        }
    }

    pub fn with_max(max_count: u32, elements: Vec<T>) -> Self {
        Self {
            max_count,
            offset: 0,
            elements,
        }
    }
}

/// Check the varying part of an array against its declared max count.
///
/// A max count of zero is reconciled to `offset + actual`.
pub(crate) fn check_varying(max_count: usize, offset: u32, actual: u32) -> Result<usize> {
    let end = (offset as usize)
        .checked_add(actual as usize)
        .ok_or(NdrError::IntegerOverflow("varying array bounds"))?;
    let max = reconcile_count(max_count, end);
    if end > max {
        return Err(NdrError::ConformanceMismatch {
            max_count: max as u32,
            offset,
            actual_count: actual,
        });
    }
    Ok(max)
}

impl<T: NdrEncode + NdrDecode + Default> NdrConformant for ConformantVaryingArray<T> {
    fn ndr_size_info(&self) -> SizeInfo {
        SizeInfo::one((self.max_count as usize).max(self.elements.len()))
    }

    fn encode_body<'a>(&'a self, w: &mut NdrWriter<'a>, size: &SizeInfo) -> Result<()> {
        let max = size.dim(0)?;
        let actual = self.elements.len().min(max);
        let actual_count =
            u32::try_from(actual).map_err(|_| NdrError::IntegerOverflow("actual count"))?;
        check_varying(max, self.offset, actual_count)?;
        w.write_u32(self.offset);
        w.write_count(actual)?;
        encode_elements(&self.elements, actual, w)
    }

    fn decode_body<'a>(&'a mut self, r: &mut NdrReader<'a>, size: &SizeInfo) -> Result<()> {
        self.offset = r.read_u32()?;
        let actual = r.read_u32()?;
        let max = check_varying(size.dim(0)?, self.offset, actual)?;
        self.max_count = u32::try_from(max).map_err(|_| NdrError::IntegerOverflow("max count"))?;
        decode_elements(&mut self.elements, actual as usize, r)
    }
}

impl<T: NdrEncode + NdrDecode + Default> NdrEncode for ConformantVaryingArray<T> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        encode_conformant(self, w)
    }

    fn ndr_align() -> usize {
        4usize.max(<T as NdrEncode>::ndr_align())
    }
}

impl<T: NdrEncode + NdrDecode + Default> NdrDecode for ConformantVaryingArray<T> {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        decode_conformant(self, r)
    }

    fn ndr_align() -> usize {
        4usize.max(<T as NdrDecode>::ndr_align())
    }
}
