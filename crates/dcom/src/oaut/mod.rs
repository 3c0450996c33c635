//! OLE automation types (MS-OAUT)

mod safearray;

pub use safearray::{features, sf_type, SafeArray, SafeArrayBound, SafeArrayUnion, SizedArray};

/// Automation strings are the NDR codec's `BSTR`
pub use msrpc_ndr::{BStr, FlaggedWordBlob};
