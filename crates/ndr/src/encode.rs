//! NDR encoding: the `NdrEncode` trait and the call-scoped writer
//!
//! An [`NdrWriter`] is one marshaling pass. It owns the output buffer, the
//! referent id counter and the queue of deferred referents, so two calls
//! never share pointer identity or size info.

use std::collections::VecDeque;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::{NdrContext, NdrError, Result, SizeInfo};

/// First referent id handed out in a marshaling pass.
pub const FIRST_REFERENT_ID: u32 = 0x0002_0000;

/// Distance between consecutive referent ids.
pub const REFERENT_ID_STEP: u32 = 4;

/// Trait for types that can be encoded to NDR format
///
/// The writer is parameterized by the lifetime of the value being encoded so
/// that pointer referents can be queued by reference and written later, in
/// the deferred section.
pub trait NdrEncode {
    /// Encode the immediate part of this value. Pointer referents go through
    /// [`NdrWriter::write_pointer`] and are emitted by `write_deferred`.
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()>;

    /// Get the NDR alignment requirement for this type
    fn ndr_align() -> usize
    where
        Self: Sized,
    {
        1
    }
}

/// Call-scoped NDR writer
pub struct NdrWriter<'a> {
    buf: BytesMut,
    ctx: NdrContext,
    base: usize,
    next_referent: u32,
    deferred: VecDeque<&'a dyn NdrEncode>,
}

macro_rules! write_scalar {
    ($name:ident, $ty:ty, $size:expr, $put_le:ident, $put_be:ident) => {
        #[inline]
        pub fn $name(&mut self, value: $ty) {
            self.write_align($size);
            if self.ctx.little_endian {
                self.buf.$put_le(value);
            } else {
                self.buf.$put_be(value);
            }
        }
    };
}

impl<'a> NdrWriter<'a> {
    /// Create a writer for one call scope
    pub fn new(ctx: NdrContext) -> Self {
        Self::with_offset(ctx, 0, FIRST_REFERENT_ID)
    }

    fn with_offset(ctx: NdrContext, base: usize, next_referent: u32) -> Self {
        Self {
            buf: BytesMut::new(),
            ctx,
            base,
            next_referent,
            deferred: VecDeque::new(),
        }
    }

    pub fn context(&self) -> &NdrContext {
        &self.ctx
    }

    /// Offset from the start of the scope, used for alignment
    pub fn position(&self) -> usize {
        self.base + self.buf.len()
    }

    /// Number of referents waiting for the deferred section
    pub fn pending(&self) -> usize {
        self.deferred.len()
    }

    /// Pad with zeros to the next `alignment` boundary
    pub fn write_align(&mut self, alignment: usize) {
        let padding = NdrContext::align_padding(self.position(), alignment);
        self.buf.put_bytes(0, padding);
    }

    /// Pad a structure out to a multiple of its natural alignment
    pub fn write_trailing_gap(&mut self, alignment: usize) {
        self.write_align(alignment);
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    #[inline]
    pub fn write_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(value as u8);
    }

    write_scalar!(write_u16, u16, 2, put_u16_le, put_u16);
    write_scalar!(write_i16, i16, 2, put_i16_le, put_i16);
    write_scalar!(write_u32, u32, 4, put_u32_le, put_u32);
    write_scalar!(write_i32, i32, 4, put_i32_le, put_i32);
    write_scalar!(write_u64, u64, 8, put_u64_le, put_u64);
    write_scalar!(write_i64, i64, 8, put_i64_le, put_i64);
    write_scalar!(write_f32, f32, 4, put_f32_le, put_f32);
    write_scalar!(write_f64, f64, 8, put_f64_le, put_f64);

    /// Write raw bytes with no alignment
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buf.put_slice(data);
    }

    /// Write a count field as a u32, failing if it does not fit
    pub fn write_count(&mut self, count: usize) -> Result<()> {
        let count = u32::try_from(count).map_err(|_| NdrError::IntegerOverflow("element count"))?;
        self.write_u32(count);
        Ok(())
    }

    /// Write a unique pointer sentinel and queue its referent.
    ///
    /// A null pointer writes `0` and queues nothing.
    pub fn write_pointer(&mut self, referent: Option<&'a dyn NdrEncode>) -> Result<()> {
        match referent {
            None => {
                self.write_u32(0);
            }
            Some(referent) => {
                let id = self.next_referent;
                self.next_referent = id
                    .checked_add(REFERENT_ID_STEP)
                    .ok_or(NdrError::IntegerOverflow("referent id"))?;
                self.write_u32(id);
                self.deferred.push_back(referent);
                trace!(referent_id = id, "deferred referent queued");
            }
        }
        Ok(())
    }

    /// Write every queued referent.
    ///
    /// Referents queued while a referent is being written are emitted right
    /// after it, before its later siblings.
    pub fn write_deferred(&mut self) -> Result<()> {
        while let Some(next) = self.deferred.pop_front() {
            let start = self.deferred.len();
            next.ndr_encode(self)?;
            let children: Vec<_> = self.deferred.drain(start..).collect();
            for child in children.into_iter().rev() {
                self.deferred.push_front(child);
            }
        }
        Ok(())
    }

    /// Declare the size info of a conformant value: one u32 per dimension
    pub fn declare_size(&mut self, size: SizeInfo) -> Result<SizeInfo> {
        for &dim in size.dims() {
            self.write_count(dim)?;
        }
        Ok(size)
    }

    /// Encode a default-valued `T`, used to pad short arrays
    pub fn write_default<T: NdrEncode + Default>(&mut self) -> Result<()> {
        let value = T::default();
        let mut scratch = NdrWriter::with_offset(self.ctx, self.position(), self.next_referent);
        value.ndr_encode(&mut scratch)?;
        scratch.write_deferred()?;
        self.next_referent = scratch.next_referent;
        self.buf.extend_from_slice(&scratch.buf);
        Ok(())
    }

    /// Encode a top-level parameter followed by its deferred section
    pub fn write_param<T: NdrEncode>(&mut self, value: &'a T) -> Result<()> {
        value.ndr_encode(self)?;
        self.write_deferred()
    }

    /// Finish the scope and hand back the stub bytes
    pub fn into_bytes(self) -> Result<Bytes> {
        if !self.deferred.is_empty() {
            return Err(NdrError::PendingReferents(self.deferred.len()));
        }
        Ok(self.buf.freeze())
    }
}

/// Encode a single value as a complete stub
pub fn to_bytes<T: NdrEncode>(ctx: NdrContext, value: &T) -> Result<Bytes> {
    let mut w = NdrWriter::new(ctx);
    w.write_param(value)?;
    w.into_bytes()
}
