//! NDR (Network Data Representation) runtime library
//!
//! This crate is the codec underneath MSRPC stubs, implementing the NDR20
//! wire format as specified in DCE RPC and MS-RPCE.
//!
//! # NDR Wire Format
//!
//! NDR is the standard encoding for DCE RPC data. Key characteristics:
//! - Primitives align to their natural size (1, 2, 4, or 8 bytes)
//! - Structures align to their largest member
//! - Unique pointers are a 4-byte referent id; the referent is written in a
//!   deferred section after the immediate fields of the top-level parameter
//! - Conformant data carries its max count ahead of the enclosing structure
//! - Unions carry their discriminant outside the arm payload
//! - Strings are conformant varying arrays with null terminator
//!
//! All marshaling state (referent ids, deferred queue) lives in one
//! [`NdrWriter`] or [`NdrReader`], which is the scope of a single call.

mod arrays;
mod context;
mod decode;
mod encode;
mod error;
mod pointers;
mod primitives;
mod size_info;
mod strings;
mod union;

pub use arrays::{ConformantArray, ConformantVaryingArray, FixedArray, VaryingArray};
pub use context::{NdrContext, DREP_BIG_ENDIAN, DREP_LITTLE_ENDIAN};
pub use decode::{from_bytes, NdrDecode, NdrReader};
pub use encode::{to_bytes, NdrEncode, NdrWriter, FIRST_REFERENT_ID, REFERENT_ID_STEP};
pub use error::{NdrError, Result, MAX_NDR_ALLOCATION_SIZE, MAX_NDR_ARRAY_ELEMENTS};
pub use pointers::{NdrPtr, RefPtr, UniquePtr};
pub use primitives::{ErrorStatusT, Hresult};
pub use size_info::{
    decode_conformant, decode_elements, encode_conformant, encode_elements, reconcile_count,
    saturating_count, NdrConformant, SizeInfo,
};
pub use strings::{BStr, FlaggedWordBlob, NdrString, NdrWString};
pub use union::{unsupported, NdrUnion};

/// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};
