//! Discriminated (non-encapsulated) unions
//!
//! The discriminant travels outside the union payload. On the wire a union
//! is: alignment pad, discriminant, alignment pad, selected arm. Each arm
//! owns its own layout; there is no shared offset between arms.

use crate::{NdrError, NdrReader, NdrWriter, Result};

/// A tagged union with an external discriminant
pub trait NdrUnion {
    /// Name used in decode errors
    const NAME: &'static str;

    /// Alignment applied around the discriminant, the largest arm alignment
    const ARM_ALIGN: usize;

    /// Width of the discriminant on the wire, 2 or 4 bytes
    const SWITCH_WIDTH: usize = 4;

    /// Discriminant selecting the current arm
    fn discriminant(&self) -> u32;

    /// Encode the payload of the current arm
    fn encode_arm<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()>;

    /// Replace `self` with the arm selected by `discriminant` and decode it.
    ///
    /// Unknown discriminants must fail with [`unsupported`].
    fn decode_arm<'a>(&'a mut self, discriminant: u32, r: &mut NdrReader<'a>) -> Result<()>;
}

/// Error for a discriminant with no arm in `U`
pub fn unsupported<U: NdrUnion>(value: u32) -> NdrError {
    NdrError::UnsupportedDiscriminant {
        union: U::NAME,
        value,
    }
}

impl<'a> NdrWriter<'a> {
    /// Write a union: pad, discriminant, pad, arm
    pub fn write_union<U: NdrUnion>(&mut self, value: &'a U) -> Result<()> {
        self.write_align(U::ARM_ALIGN);
        let discriminant = value.discriminant();
        if U::SWITCH_WIDTH == 2 {
            let short = u16::try_from(discriminant).map_err(|_| unsupported::<U>(discriminant))?;
            self.write_u16(short);
        } else {
            self.write_u32(discriminant);
        }
        self.write_align(U::ARM_ALIGN);
        value.encode_arm(self)
    }
}

impl<'a> NdrReader<'a> {
    /// Read a union into `value` and return the discriminant that selected it
    pub fn read_union<U: NdrUnion>(&mut self, value: &'a mut U) -> Result<u32> {
        self.read_align(U::ARM_ALIGN)?;
        let discriminant = if U::SWITCH_WIDTH == 2 {
            self.read_u16()? as u32
        } else {
            self.read_u32()?
        };
        self.read_align(U::ARM_ALIGN)?;
        value.decode_arm(discriminant, self)?;
        Ok(discriminant)
    }
}
