//! Core DCOM types (MS-DCOM 2.2)
//!
//! - Identifiers: OXID, OID, IPID, causality id, IID/CLSID
//! - ORPC headers: ORPCTHIS, ORPCTHAT and their extensions
//! - Object references: MInterfacePointer, OBJREF, STDOBJREF, DUALSTRINGARRAY

mod error;
mod identifiers;
mod interface_pointer;
mod objref;
mod orpc;
mod stdobjref;
mod stringbinding;

pub use error::{DcomError, Result};
pub use identifiers::{Causality, Clsid, Iid, Ipid, Oid, Oxid};
pub use interface_pointer::InterfacePointer;
pub use objref::{
    objref_flags, ObjRef, ObjRefBody, ObjRefCustom, ObjRefHandler, ObjRefStandard,
    OBJREF_SIGNATURE,
};
pub use orpc::{extent_ids, ComVersion, ExtentSlots, OrpcExtent, OrpcExtentArray, OrpcThat, OrpcThis};
pub use stdobjref::{flags as sorf_flags, StdObjRef};
pub use stringbinding::{protocol_id, DualStringArray, SecurityBinding, StringBinding};

/// Well-known interface UUIDs
pub mod iid {
    /// IUnknown interface UUID
    pub const IUNKNOWN: &str = "00000000-0000-0000-c000-000000000046";
    /// IDispatch interface UUID
    pub const IDISPATCH: &str = "00020400-0000-0000-c000-000000000046";
}

/// Well-known CLSID values
pub mod clsid {
    /// Standard marshaler CLSID
    pub const STD_MARSHAL: &str = "00000017-0000-0000-c000-000000000046";
}
