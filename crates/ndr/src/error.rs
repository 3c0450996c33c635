//! NDR error types

use thiserror::Error;

/// Upper bound on the element count of any single conformant array.
pub const MAX_NDR_ARRAY_ELEMENTS: usize = 16 * 1024 * 1024;

/// Upper bound on the bytes a single decoded array may allocate.
pub const MAX_NDR_ALLOCATION_SIZE: usize = 64 * 1024 * 1024;

/// NDR encoding/decoding errors
#[derive(Debug, Error)]
pub enum NdrError {
    /// Buffer underflow - not enough data
    #[error("buffer underflow: needed {needed} bytes, have {have}")]
    BufferUnderflow { needed: usize, have: usize },

    /// A declared element count cannot fit in what is left of the buffer
    #[error("declared size {declared} x {element_size} bytes exceeds remaining buffer of {remaining} bytes")]
    SizeExceedsBuffer {
        declared: usize,
        element_size: usize,
        remaining: usize,
    },

    /// Invalid string - not null terminated or invalid encoding
    #[error("invalid string: {0}")]
    InvalidString(String),

    /// Invalid pointer - unexpected referent ID
    #[error("invalid pointer: referent ID {0:#010x}")]
    InvalidPointer(u32),

    /// Union discriminant with no matching arm
    #[error("unsupported discriminant {value} for union {union}")]
    UnsupportedDiscriminant { union: &'static str, value: u32 },

    /// Invalid enum value
    #[error("invalid enum value: {0}")]
    InvalidEnumValue(i32),

    /// Conformance mismatch
    #[error("conformance mismatch: max_count={max_count}, offset={offset}, actual_count={actual_count}")]
    ConformanceMismatch {
        max_count: u32,
        offset: u32,
        actual_count: u32,
    },

    /// Size info has fewer dimensions than the consumer expects
    #[error("size info has {have} dimensions, need {needed}")]
    MissingDimension { needed: usize, have: usize },

    /// Array or allocation above the hard limits
    #[error("allocation limit exceeded: {requested} > {limit}")]
    AllocationLimitExceeded { requested: usize, limit: usize },

    /// Arithmetic overflow while computing a size
    #[error("integer overflow computing {0}")]
    IntegerOverflow(&'static str),

    /// Deferred referents left over where none may be produced
    #[error("{0} deferred referents left unwritten")]
    PendingReferents(usize),

    /// UTF-16 decoding error
    #[error("UTF-16 error: {0}")]
    Utf16Error(#[from] std::char::DecodeUtf16Error),

    /// UTF-8 decoding error
    #[error("UTF-8 error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
}

/// Result type for NDR operations
pub type Result<T> = std::result::Result<T, NdrError>;
