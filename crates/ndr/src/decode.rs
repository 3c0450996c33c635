//! NDR decoding: the `NdrDecode` trait and the call-scoped reader
//!
//! Decoding is in place. A value is default-constructed and then filled; a
//! unique pointer allocates its referent slot when the sentinel is read and
//! queues that slot, so the deferred section decodes straight into it.

use std::collections::{HashSet, VecDeque};

use bytes::Bytes;
use tracing::trace;

use crate::error::{MAX_NDR_ALLOCATION_SIZE, MAX_NDR_ARRAY_ELEMENTS};
use crate::{NdrContext, NdrError, Result, SizeInfo};

/// Trait for types that can be decoded from NDR format
pub trait NdrDecode {
    /// Decode the immediate part of this value into `self`.
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()>;

    /// Get the NDR alignment requirement for this type
    fn ndr_align() -> usize
    where
        Self: Sized,
    {
        1
    }
}

/// Call-scoped NDR reader
pub struct NdrReader<'a> {
    buf: Bytes,
    pos: usize,
    ctx: NdrContext,
    seen: HashSet<u32>,
    deferred: VecDeque<&'a mut dyn NdrDecode>,
}

macro_rules! read_scalar {
    ($name:ident, $ty:ty, $size:expr) => {
        #[inline]
        pub fn $name(&mut self) -> Result<$ty> {
            self.read_align($size)?;
            let raw = self.take::<$size>()?;
            Ok(if self.ctx.little_endian {
                <$ty>::from_le_bytes(raw)
            } else {
                <$ty>::from_be_bytes(raw)
            })
        }
    };
}

impl<'a> NdrReader<'a> {
    /// Create a reader over one stub buffer
    pub fn new(buf: Bytes, ctx: NdrContext) -> Self {
        Self {
            buf,
            pos: 0,
            ctx,
            seen: HashSet::new(),
            deferred: VecDeque::new(),
        }
    }

    pub fn context(&self) -> &NdrContext {
        &self.ctx
    }

    /// Offset from the start of the scope
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Number of referents waiting for the deferred section
    pub fn pending(&self) -> usize {
        self.deferred.len()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        let have = self.remaining();
        if have < needed {
            return Err(NdrError::BufferUnderflow { needed, have });
        }
        Ok(())
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.ensure(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }

    /// Skip padding to the next `alignment` boundary
    pub fn read_align(&mut self, alignment: usize) -> Result<()> {
        let padding = NdrContext::align_padding(self.pos, alignment);
        self.ensure(padding)?;
        self.pos += padding;
        Ok(())
    }

    /// Skip the trailing gap of a structure
    pub fn read_trailing_gap(&mut self, alignment: usize) -> Result<()> {
        self.read_align(alignment)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take::<1>()?[0] as i8)
    }

    #[inline]
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    read_scalar!(read_u16, u16, 2);
    read_scalar!(read_i16, i16, 2);
    read_scalar!(read_u32, u32, 4);
    read_scalar!(read_i32, i32, 4);
    read_scalar!(read_u64, u64, 8);
    read_scalar!(read_i64, i64, 8);
    read_scalar!(read_f32, f32, 4);
    read_scalar!(read_f64, f64, 8);

    /// Read `len` raw bytes with no alignment
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        self.ensure(len)?;
        let out = self.buf.slice(self.pos..self.pos + len);
        self.pos += len;
        Ok(out)
    }

    /// Validate an element count against the hard limits and the buffer.
    ///
    /// `element_size` is a lower bound on the wire size of one element.
    pub fn check_count(&self, count: usize, element_size: usize) -> Result<usize> {
        if count > MAX_NDR_ARRAY_ELEMENTS {
            return Err(NdrError::AllocationLimitExceeded {
                requested: count,
                limit: MAX_NDR_ARRAY_ELEMENTS,
            });
        }
        let element_size = element_size.max(1);
        let bytes = count
            .checked_mul(element_size)
            .ok_or(NdrError::IntegerOverflow("array byte length"))?;
        if bytes > MAX_NDR_ALLOCATION_SIZE {
            return Err(NdrError::AllocationLimitExceeded {
                requested: bytes,
                limit: MAX_NDR_ALLOCATION_SIZE,
            });
        }
        let remaining = self.remaining();
        if bytes > remaining {
            return Err(NdrError::SizeExceedsBuffer {
                declared: count,
                element_size,
                remaining,
            });
        }
        Ok(count)
    }

    /// Read a count field and validate it as an element count
    pub fn read_count(&mut self, element_size: usize) -> Result<usize> {
        let count = self.read_u32()? as usize;
        self.check_count(count, element_size)
    }

    /// Read a unique pointer sentinel.
    ///
    /// Returns the referent id, or `None` for a null pointer. A referent id
    /// seen twice in one call scope is rejected since unique pointers never
    /// alias.
    pub fn read_pointer_id(&mut self) -> Result<Option<u32>> {
        let id = self.read_u32()?;
        if id == 0 {
            return Ok(None);
        }
        if !self.seen.insert(id) {
            return Err(NdrError::InvalidPointer(id));
        }
        Ok(Some(id))
    }

    /// Queue a referent slot for the deferred section
    pub fn defer(&mut self, slot: &'a mut dyn NdrDecode) {
        trace!(pending = self.deferred.len() + 1, "deferred referent slot queued");
        self.deferred.push_back(slot);
    }

    /// Decode every queued referent, depth-first in declaration order
    pub fn read_deferred(&mut self) -> Result<()> {
        while let Some(next) = self.deferred.pop_front() {
            let start = self.deferred.len();
            next.ndr_decode(self)?;
            let children: Vec<_> = self.deferred.drain(start..).collect();
            for child in children.into_iter().rev() {
                self.deferred.push_front(child);
            }
        }
        Ok(())
    }

    /// Read the size info of a conformant value: one u32 per dimension.
    ///
    /// Only the hard element limit applies here. A varying array may declare
    /// more than it transmits, so the buffer bound is enforced when the
    /// elements themselves are read.
    pub fn declare_size(&mut self, dimensions: usize) -> Result<SizeInfo> {
        let mut dims = Vec::with_capacity(dimensions);
        for _ in 0..dimensions {
            let dim = self.read_u32()? as usize;
            if dim > MAX_NDR_ARRAY_ELEMENTS {
                return Err(NdrError::AllocationLimitExceeded {
                    requested: dim,
                    limit: MAX_NDR_ARRAY_ELEMENTS,
                });
            }
            dims.push(dim);
        }
        Ok(SizeInfo::new(dims))
    }

    /// Decode a top-level parameter followed by its deferred section
    pub fn read_param<T: NdrDecode>(&mut self, value: &'a mut T) -> Result<()> {
        value.ndr_decode(self)?;
        self.read_deferred()
    }
}

/// Decode a single value from a complete stub
pub fn from_bytes<T: NdrDecode + Default>(ctx: NdrContext, buf: Bytes) -> Result<T> {
    let mut value = T::default();
    {
        let mut r = NdrReader::new(buf, ctx);
        r.read_param(&mut value)?;
    }
    Ok(value)
}
