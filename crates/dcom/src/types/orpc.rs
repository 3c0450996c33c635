//! ORPC (Object RPC) header types (MS-DCOM 2.2.13, 2.2.14)
//!
//! These structures are the implicit first parameter of every ORPC request
//! ([`OrpcThis`]) and response ([`OrpcThat`]).

use msrpc::Uuid;
use msrpc_ndr::{
    decode_elements, encode_elements, impl_ndr_conformant, reconcile_count, saturating_count,
    NdrConformant, NdrDecode, NdrEncode, NdrReader, NdrWriter, Result, SizeInfo, UniquePtr,
};

use super::identifiers::Causality;

/// COM version structure (MS-DCOM 2.2.11)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComVersion {
    pub major: u16,
    pub minor: u16,
}

impl ComVersion {
    /// DCOM version 5.1 (Windows 2000)
    pub const DCOM_5_1: Self = Self { major: 5, minor: 1 };
    /// DCOM version 5.4 (Windows XP/2003)
    pub const DCOM_5_4: Self = Self { major: 5, minor: 4 };
    /// DCOM version 5.6 (Windows Vista)
    pub const DCOM_5_6: Self = Self { major: 5, minor: 6 };
    /// DCOM version 5.7 (Windows 7)
    pub const DCOM_5_7: Self = Self { major: 5, minor: 7 };

    pub fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

impl Default for ComVersion {
    fn default() -> Self {
        Self::DCOM_5_7
    }
}

impl NdrEncode for ComVersion {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_u16(self.major);
        w.write_u16(self.minor);
        Ok(())
    }

    fn ndr_align() -> usize {
        2
    }
}

impl NdrDecode for ComVersion {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.major = r.read_u16()?;
        self.minor = r.read_u16()?;
        Ok(())
    }

    fn ndr_align() -> usize {
        2
    }
}

/// `ORPC_EXTENT`: an opaque blob identified by a GUID
///
/// `data` is transmitted rounded up to a multiple of 8 bytes; `size` holds
/// the unpadded length.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrpcExtent {
    pub id: Uuid,
    pub size: u32,
    pub data: Vec<u8>,
}

impl OrpcExtent {
    pub fn new(id: Uuid, data: Vec<u8>) -> Self {
        Self {
            id,
            size: saturating_count(data.len()),
            data,
        }
    }

    fn effective_size(&self) -> u32 {
        if self.size == 0 {
            saturating_count(self.data.len())
        } else {
            self.size
        }
    }

    /// Extent data without the alignment padding
    pub fn payload(&self) -> &[u8] {
        let len = (self.size as usize).min(self.data.len());
        &self.data[..len]
    }
}

fn round8(size: u32) -> usize {
    (size as usize + 7) & !7
}

impl NdrConformant for OrpcExtent {
    fn ndr_size_info(&self) -> SizeInfo {
        SizeInfo::one(round8(self.effective_size()))
    }

    fn encode_body<'a>(&'a self, w: &mut NdrWriter<'a>, size: &SizeInfo) -> Result<()> {
        w.write_align(4);
        self.id.ndr_encode(w)?;
        w.write_u32(self.effective_size());
        encode_elements(&self.data, size.dim(0)?, w)
    }

    fn decode_body<'a>(&'a mut self, r: &mut NdrReader<'a>, size: &SizeInfo) -> Result<()> {
        r.read_align(4)?;
        self.id.ndr_decode(r)?;
        self.size = r.read_u32()?;
        let count = reconcile_count(size.dim(0)?, round8(self.size));
        decode_elements(&mut self.data, count, r)
    }
}

impl_ndr_conformant!(OrpcExtent, 4);

/// The conformant array of extent slots behind `ORPC_EXTENT_ARRAY.extent`
///
/// The slot count is the extent count rounded up to an even number; unused
/// slots are null.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtentSlots {
    /// Slot count expected by the enclosing array, zero when unknown
    count: u32,
    pub extents: Vec<UniquePtr<OrpcExtent>>,
}

impl ExtentSlots {
    pub fn new(extents: Vec<OrpcExtent>) -> Self {
        Self {
            count: 0,
            extents: extents.into_iter().map(UniquePtr::new).collect(),
        }
    }
}

impl NdrConformant for ExtentSlots {
    fn ndr_size_info(&self) -> SizeInfo {
        let count = if self.count == 0 {
            (self.extents.len() + 1) & !1
        } else {
            self.count as usize
        };
        SizeInfo::one(count)
    }

    fn encode_body<'a>(&'a self, w: &mut NdrWriter<'a>, size: &SizeInfo) -> Result<()> {
        encode_elements(&self.extents, size.dim(0)?, w)
    }

    fn decode_body<'a>(&'a mut self, r: &mut NdrReader<'a>, size: &SizeInfo) -> Result<()> {
        let count = reconcile_count(size.dim(0)?, self.count as usize);
        self.count = count as u32;
        decode_elements(&mut self.extents, count, r)
    }
}

impl_ndr_conformant!(ExtentSlots, 4);

/// `ORPC_EXTENT_ARRAY`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrpcExtentArray {
    /// Number of non-null extents
    pub size: u32,
    pub reserved: u32,
    pub extent: UniquePtr<ExtentSlots>,
}

impl OrpcExtentArray {
    pub fn new(extents: Vec<OrpcExtent>) -> Self {
        Self {
            size: saturating_count(extents.len()),
            reserved: 0,
            extent: UniquePtr::new(ExtentSlots::new(extents)),
        }
    }

    /// Non-null extents in slot order
    pub fn extents(&self) -> impl Iterator<Item = &OrpcExtent> {
        self.extent
            .as_ref()
            .into_iter()
            .flat_map(|slots| slots.extents.iter().filter_map(|e| e.as_ref()))
    }

    /// First extent with the given id
    pub fn find(&self, id: &Uuid) -> Option<&OrpcExtent> {
        self.extents().find(|e| e.id == *id)
    }

    fn effective_size(&self) -> u32 {
        if self.size == 0 {
            self.extents().count() as u32
        } else {
            self.size
        }
    }
}

impl NdrEncode for OrpcExtentArray {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(4);
        w.write_u32(self.effective_size());
        w.write_u32(0);
        self.extent.ndr_encode(w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for OrpcExtentArray {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(4)?;
        self.size = r.read_u32()?;
        self.reserved = r.read_u32()?;
        let slots = ((self.size as u64 + 1) & !1) as u32;
        match r.read_pointer_id()? {
            None => self.extent = UniquePtr::null(),
            Some(_) => {
                let list = self.extent.0.insert(Box::new(ExtentSlots {
                    count: slots,
                    extents: Vec::new(),
                }));
                r.defer(&mut **list);
            }
        }
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

/// ORPCTHIS structure (MS-DCOM 2.2.13)
///
/// Sent with every ORPC request from client to server.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrpcThis {
    pub version: ComVersion,
    /// Must be 0 on ORPC invocations
    pub flags: u32,
    pub reserved1: u32,
    /// Causality ID (UUID identifying the call chain)
    pub cid: Causality,
    pub extensions: UniquePtr<OrpcExtentArray>,
}

impl OrpcThis {
    /// Create a new ORPCTHIS with a fresh causality id
    pub fn new() -> Self {
        Self::with_causality(Causality::generate())
    }

    /// Create with a specific causality ID
    pub fn with_causality(cid: Causality) -> Self {
        Self {
            cid,
            ..Default::default()
        }
    }

    pub fn with_extensions(mut self, extensions: OrpcExtentArray) -> Self {
        self.extensions = UniquePtr::new(extensions);
        self
    }
}

impl NdrEncode for OrpcThis {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(4);
        self.version.ndr_encode(w)?;
        w.write_u32(self.flags);
        w.write_u32(0);
        self.cid.ndr_encode(w)?;
        self.extensions.ndr_encode(w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for OrpcThis {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(4)?;
        self.version.ndr_decode(r)?;
        self.flags = r.read_u32()?;
        self.reserved1 = r.read_u32()?;
        self.cid.ndr_decode(r)?;
        self.extensions.ndr_decode(r)
    }

    fn ndr_align() -> usize {
        4
    }
}

/// ORPCTHAT structure (MS-DCOM 2.2.14)
///
/// Sent with every ORPC response from server to client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrpcThat {
    pub flags: u32,
    pub extensions: UniquePtr<OrpcExtentArray>,
}

impl OrpcThat {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NdrEncode for OrpcThat {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(4);
        w.write_u32(self.flags);
        self.extensions.ndr_encode(w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for OrpcThat {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(4)?;
        self.flags = r.read_u32()?;
        self.extensions.ndr_decode(r)
    }

    fn ndr_align() -> usize {
        4
    }
}

/// Well-known extension UUIDs
pub mod extent_ids {
    /// Error information extension (MS-DCOM 2.2.21.1)
    pub const ERROR_INFO: &str = "0000031c-0000-0000-c000-000000000046";
}
