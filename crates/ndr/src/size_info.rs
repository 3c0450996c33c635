//! Conformance ("size info") for arrays whose length is only known at runtime
//!
//! The outermost encoder of a conformant value declares its maximum counts
//! once, ahead of the value. Nested steps receive the declared [`SizeInfo`]
//! by reference and never re-declare it. A conformant structure hoists the
//! size info of its trailing array in front of its own fields.

use crate::{NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, Result};

/// Maximum element counts, one per dimension
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeInfo(Vec<usize>);

impl SizeInfo {
    pub fn new(dims: Vec<usize>) -> Self {
        Self(dims)
    }

    /// Size info for a one-dimensional array
    pub fn one(count: usize) -> Self {
        Self(vec![count])
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Count for dimension `index`
    pub fn dim(&self, index: usize) -> Result<usize> {
        self.0.get(index).copied().ok_or(NdrError::MissingDimension {
            needed: index + 1,
            have: self.0.len(),
        })
    }
}

/// Pick the element count to use when a declared max count and an explicit
/// length field disagree.
///
/// A declared count of zero alongside a non-zero explicit count trusts the
/// explicit count. Otherwise the declared count stands. Callers still bound
/// the result by the remaining buffer.
pub fn reconcile_count(declared: usize, explicit: usize) -> usize {
    if declared == 0 && explicit > 0 {
        explicit
    } else {
        declared
    }
}

/// Length of a local collection as a 32-bit wire count.
///
/// Lengths past `u32::MAX` saturate, so the mismatch surfaces when the
/// elements are encoded instead of as a silently wrapped count.
pub fn saturating_count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// A value whose encoding is preceded by hoisted size info
pub trait NdrConformant {
    /// Number of size info dimensions this value declares
    const DIMENSIONS: usize = 1;

    /// Size info derived from the current contents
    fn ndr_size_info(&self) -> SizeInfo;

    /// Encode everything after the size info, honoring `size`
    fn encode_body<'a>(&'a self, w: &mut NdrWriter<'a>, size: &SizeInfo) -> Result<()>;

    /// Decode everything after the size info, using `size`
    fn decode_body<'a>(&'a mut self, r: &mut NdrReader<'a>, size: &SizeInfo) -> Result<()>;
}

/// Declare the size info of `value` and encode its body
pub fn encode_conformant<'a, T: NdrConformant>(value: &'a T, w: &mut NdrWriter<'a>) -> Result<()> {
    let size = w.declare_size(value.ndr_size_info())?;
    value.encode_body(w, &size)
}

/// Read the size info of a `T` and decode its body
pub fn decode_conformant<'a, T: NdrConformant>(value: &'a mut T, r: &mut NdrReader<'a>) -> Result<()> {
    let size = r.declare_size(T::DIMENSIONS)?;
    value.decode_body(r, &size)
}

/// Implement `NdrEncode`/`NdrDecode` for a concrete [`NdrConformant`] type,
/// with the given alignment for the whole value.
#[macro_export]
macro_rules! impl_ndr_conformant {
    ($ty:ty, $align:expr) => {
        impl $crate::NdrEncode for $ty {
            fn ndr_encode<'a>(&'a self, w: &mut $crate::NdrWriter<'a>) -> $crate::Result<()> {
                $crate::encode_conformant(self, w)
            }

            fn ndr_align() -> usize {
                $align
            }
        }

        impl $crate::NdrDecode for $ty {
            fn ndr_decode<'a>(&'a mut self, r: &mut $crate::NdrReader<'a>) -> $crate::Result<()> {
                $crate::decode_conformant(self, r)
            }

            fn ndr_align() -> usize {
                $align
            }
        }
    };
}

/// Encode `count` elements from `items`, padding with defaults or truncating
pub fn encode_elements<'a, T: NdrEncode + Default>(
    items: &'a [T],
    count: usize,
    w: &mut NdrWriter<'a>,
) -> Result<()> {
    for item in items.iter().take(count) {
        item.ndr_encode(w)?;
    }
    for _ in items.len()..count {
        w.write_default::<T>()?;
    }
    Ok(())
}

/// Decode `count` elements into `items`, replacing its contents
pub fn decode_elements<'a, T: NdrDecode + Default>(
    items: &'a mut Vec<T>,
    count: usize,
    r: &mut NdrReader<'a>,
) -> Result<()> {
    let count = r.check_count(count, T::ndr_align())?;
    items.clear();
    items.resize_with(count, T::default);
    for item in items.iter_mut() {
        item.ndr_decode(r)?;
    }
    Ok(())
}
