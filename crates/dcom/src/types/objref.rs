//! OBJREF structure (MS-DCOM 2.2.18)
//!
//! OBJREF is the marshaled form of a COM interface pointer. It travels as
//! the opaque `abData` of an [`InterfacePointer`](super::InterfacePointer)
//! and names the object exporter, object and IPID a client must address.

use msrpc_ndr::{
    from_bytes, to_bytes, Bytes, NdrContext, NdrDecode, NdrEncode, NdrReader, NdrWriter,
};

use super::error::{DcomError, Result};
use super::identifiers::{Clsid, Iid, Ipid, Oid, Oxid};
use super::stdobjref::StdObjRef;
use super::stringbinding::DualStringArray;

/// OBJREF signature, "MEOW" in little-endian
pub const OBJREF_SIGNATURE: u32 = 0x574F454D;

/// OBJREF flags indicating the variant type
pub mod objref_flags {
    pub const OBJREF_STANDARD: u32 = 0x00000001;
    pub const OBJREF_HANDLER: u32 = 0x00000002;
    pub const OBJREF_CUSTOM: u32 = 0x00000004;
}

/// OBJREF_STANDARD (MS-DCOM 2.2.18.4)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjRefStandard {
    pub std: StdObjRef,
    /// Resolver string bindings
    pub resolver_addr: DualStringArray,
}

impl ObjRefStandard {
    pub fn new(std: StdObjRef, resolver_addr: DualStringArray) -> Self {
        Self { std, resolver_addr }
    }

    /// Create a minimal reference for local use
    pub fn local(oxid: Oxid, oid: Oid, ipid: Ipid) -> Self {
        Self::new(StdObjRef::new_noping(oxid, oid, ipid, 1), DualStringArray::new())
    }
}

/// OBJREF_HANDLER (MS-DCOM 2.2.18.5)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjRefHandler {
    pub std: StdObjRef,
    /// Handler to load in place of the standard proxy
    pub clsid: Clsid,
    pub resolver_addr: DualStringArray,
}

/// OBJREF_CUSTOM (MS-DCOM 2.2.18.6)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjRefCustom {
    /// Class of the unmarshaler
    pub clsid: Clsid,
    /// Must be zero when sent, ignored on receipt
    pub cb_extension: u32,
    pub data: Bytes,
}

impl ObjRefCustom {
    pub fn new(clsid: Clsid, data: Bytes) -> Self {
        Self {
            clsid,
            cb_extension: 0,
            data,
        }
    }
}

/// The variant part of an OBJREF, selected by its flags
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjRefBody {
    Standard(ObjRefStandard),
    Handler(ObjRefHandler),
    Custom(ObjRefCustom),
}

impl Default for ObjRefBody {
    fn default() -> Self {
        Self::Standard(ObjRefStandard::default())
    }
}

/// OBJREF (MS-DCOM 2.2.18.1)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjRef {
    /// Interface the reference was marshaled for
    pub iid: Iid,
    pub body: ObjRefBody,
}

impl ObjRef {
    /// Header size (signature + flags)
    pub const HEADER_SIZE: usize = 8;

    pub fn standard(iid: Iid, std: StdObjRef, resolver_addr: DualStringArray) -> Self {
        Self {
            iid,
            body: ObjRefBody::Standard(ObjRefStandard::new(std, resolver_addr)),
        }
    }

    pub fn flags(&self) -> u32 {
        match self.body {
            ObjRefBody::Standard(_) => objref_flags::OBJREF_STANDARD,
            ObjRefBody::Handler(_) => objref_flags::OBJREF_HANDLER,
            ObjRefBody::Custom(_) => objref_flags::OBJREF_CUSTOM,
        }
    }

    /// The STDOBJREF of a standard or handler reference
    pub fn std_obj_ref(&self) -> Option<&StdObjRef> {
        match &self.body {
            ObjRefBody::Standard(s) => Some(&s.std),
            ObjRefBody::Handler(h) => Some(&h.std),
            ObjRefBody::Custom(_) => None,
        }
    }

    /// IPID to address calls on the referenced interface
    pub fn ipid(&self) -> Option<Ipid> {
        self.std_obj_ref().map(|std| std.ipid)
    }

    /// Parse an OBJREF from the bytes of an interface pointer
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::HEADER_SIZE {
            return Err(DcomError::InvalidObjRef(format!(
                "{} bytes is shorter than the header",
                data.len()
            )));
        }
        let signature = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        if signature != OBJREF_SIGNATURE {
            return Err(DcomError::InvalidObjRef(format!(
                "invalid signature: expected 0x{:08x}, got 0x{:08x}",
                OBJREF_SIGNATURE, signature
            )));
        }
        let flags = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        if !matches!(
            flags,
            objref_flags::OBJREF_STANDARD | objref_flags::OBJREF_HANDLER | objref_flags::OBJREF_CUSTOM
        ) {
            return Err(DcomError::InvalidObjRef(format!(
                "unsupported OBJREF flags: 0x{:08x}",
                flags
            )));
        }
        Ok(from_bytes(NdrContext::new(), Bytes::copy_from_slice(data))?)
    }

    /// Serialize for use as interface pointer data
    pub fn to_bytes(&self) -> Result<Bytes> {
        Ok(to_bytes(NdrContext::new(), self)?)
    }
}

impl NdrEncode for ObjRef {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> {
        w.write_align(8);
        w.write_u32(OBJREF_SIGNATURE);
        w.write_u32(self.flags());
        self.iid.ndr_encode(w)?;
        match &self.body {
            ObjRefBody::Standard(s) => {
                s.std.ndr_encode(w)?;
                s.resolver_addr.ndr_encode(w)
            }
            ObjRefBody::Handler(h) => {
                h.std.ndr_encode(w)?;
                h.clsid.ndr_encode(w)?;
                h.resolver_addr.ndr_encode(w)
            }
            ObjRefBody::Custom(c) => {
                c.clsid.ndr_encode(w)?;
                w.write_u32(c.cb_extension);
                w.write_count(c.data.len())?;
                w.write_bytes(&c.data);
                Ok(())
            }
        }
    }

    fn ndr_align() -> usize {
        8
    }
}

impl NdrDecode for ObjRef {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> {
        r.read_align(8)?;
        let _signature = r.read_u32()?;
        let flags = r.read_u32()?;
        self.iid.ndr_decode(r)?;
        self.body = match flags {
            objref_flags::OBJREF_STANDARD => ObjRefBody::Standard(ObjRefStandard::default()),
            objref_flags::OBJREF_HANDLER => ObjRefBody::Handler(ObjRefHandler::default()),
            objref_flags::OBJREF_CUSTOM => ObjRefBody::Custom(ObjRefCustom::default()),
            other => return Err(msrpc_ndr::NdrError::InvalidEnumValue(other as i32)),
        };
        match &mut self.body {
            ObjRefBody::Standard(s) => {
                s.std.ndr_decode(r)?;
                s.resolver_addr.ndr_decode(r)
            }
            ObjRefBody::Handler(h) => {
                h.std.ndr_decode(r)?;
                h.clsid.ndr_decode(r)?;
                h.resolver_addr.ndr_decode(r)
            }
            ObjRefBody::Custom(c) => {
                c.clsid.ndr_decode(r)?;
                c.cb_extension = r.read_u32()?;
                let size = r.read_count(1)?;
                c.data = r.read_bytes(size)?;
                Ok(())
            }
        }
    }

    fn ndr_align() -> usize {
        8
    }
}
