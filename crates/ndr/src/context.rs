//! NDR encoding/decoding context
//!
//! The context carries the negotiated data representation. Writers and
//! readers consult it for byte order; everything else is call-local.

/// Data representation label for little-endian ASCII IEEE (`0x10`).
pub const DREP_LITTLE_ENDIAN: u8 = 0x10;

/// Data representation label for big-endian ASCII IEEE (`0x00`).
pub const DREP_BIG_ENDIAN: u8 = 0x00;

/// NDR encoding/decoding context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NdrContext {
    /// Whether to use little-endian byte order
    pub little_endian: bool,
}

impl Default for NdrContext {
    fn default() -> Self {
        Self::new()
    }
}

impl NdrContext {
    /// Create a new NDR context with little-endian byte order (default)
    pub fn new() -> Self {
        Self { little_endian: true }
    }

    /// Create a context with big-endian byte order
    pub fn big_endian() -> Self {
        Self { little_endian: false }
    }

    /// Create a context from the first byte of a PDU data representation
    pub fn from_drep(drep: u8) -> Self {
        Self {
            little_endian: drep & 0xF0 == DREP_LITTLE_ENDIAN,
        }
    }

    /// Data representation label for this context
    pub fn drep(&self) -> u8 {
        if self.little_endian {
            DREP_LITTLE_ENDIAN
        } else {
            DREP_BIG_ENDIAN
        }
    }

    /// Calculate padding needed to align to the given boundary
    #[inline]
    pub fn align_padding(position: usize, alignment: usize) -> usize {
        if alignment <= 1 {
            return 0;
        }
        let remainder = position % alignment;
        if remainder == 0 {
            0
        } else {
            alignment - remainder
        }
    }
}
