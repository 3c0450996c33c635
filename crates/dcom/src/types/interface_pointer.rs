//! MInterfacePointer (MS-DCOM 2.2.14)
//!
//! Interface pointers cross the wire as a conformant structure wrapping a
//! marshaled OBJREF.

use msrpc_ndr::{
    decode_elements, encode_elements, impl_ndr_conformant, reconcile_count, saturating_count,
    NdrConformant, NdrReader, NdrWriter, SizeInfo,
};

use super::error::{DcomError, Result};
use super::identifiers::Ipid;
use super::objref::ObjRef;

/// `MInterfacePointer { ulCntData; [size_is(ulCntData)] abData[] }`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterfacePointer {
    /// Byte count of `ab_data`; zero means "use the data length"
    pub cnt_data: u32,
    pub ab_data: Vec<u8>,
}

impl InterfacePointer {
    pub fn new(ab_data: Vec<u8>) -> Self {
        Self {
            cnt_data: saturating_count(ab_data.len()),
            ab_data,
        }
    }

    pub fn from_objref(objref: &ObjRef) -> Result<Self> {
        Ok(Self::new(objref.to_bytes()?.to_vec()))
    }

    fn data_count(&self) -> usize {
        if self.cnt_data == 0 {
            self.ab_data.len()
        } else {
            self.cnt_data as usize
        }
    }

    /// Parse the OBJREF this pointer carries
    pub fn objref(&self) -> Result<ObjRef> {
        let len = self.data_count().min(self.ab_data.len());
        ObjRef::parse(&self.ab_data[..len])
    }

    /// IPID of the referenced interface.
    ///
    /// Custom-marshaled references carry no IPID.
    pub fn ipid(&self) -> Result<Ipid> {
        self.objref()?
            .ipid()
            .ok_or_else(|| DcomError::InvalidObjRef("custom OBJREF carries no IPID".into()))
    }
}

impl NdrConformant for InterfacePointer {
    fn ndr_size_info(&self) -> SizeInfo {
        SizeInfo::one(self.data_count())
    }

    fn encode_body<'a>(&'a self, w: &mut NdrWriter<'a>, size: &SizeInfo) -> msrpc_ndr::Result<()> {
        let count = size.dim(0)?;
        w.write_align(4);
        w.write_count(count)?;
        encode_elements(&self.ab_data, count, w)
    }

    fn decode_body<'a>(&'a mut self, r: &mut NdrReader<'a>, size: &SizeInfo) -> msrpc_ndr::Result<()> {
        r.read_align(4)?;
        self.cnt_data = r.read_u32()?;
        let count = reconcile_count(size.dim(0)?, self.cnt_data as usize);
        decode_elements(&mut self.ab_data, count, r)
    }
}

impl_ndr_conformant!(InterfacePointer, 4);
