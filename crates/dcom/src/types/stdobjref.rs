//! STDOBJREF structure (MS-DCOM 2.2.18.2)
//!
//! Standard Object Reference - the core structure that identifies
//! a marshaled interface pointer.

use msrpc_ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter, Result};

use super::identifiers::{Ipid, Oid, Oxid};

/// STDOBJREF flags (SORF_*)
pub mod flags {
    pub const SORF_NULL: u32 = 0x00000000;
    /// The reference is machine-local and is not pinged
    pub const SORF_NOPING: u32 = 0x00001000;
}

/// Standard Object Reference (40 bytes)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StdObjRef {
    /// SORF_* flags
    pub flags: u32,
    /// Number of public references held
    pub public_refs: u32,
    pub oxid: Oxid,
    pub oid: Oid,
    pub ipid: Ipid,
}

impl StdObjRef {
    /// Size in bytes (4 + 4 + 8 + 8 + 16 = 40)
    pub const SIZE: usize = 40;

    pub fn new(oxid: Oxid, oid: Oid, ipid: Ipid, public_refs: u32) -> Self {
        Self {
            flags: flags::SORF_NULL,
            public_refs,
            oxid,
            oid,
            ipid,
        }
    }

    /// Create a STDOBJREF that doesn't require pinging
    pub fn new_noping(oxid: Oxid, oid: Oid, ipid: Ipid, public_refs: u32) -> Self {
        Self {
            flags: flags::SORF_NOPING,
            ..Self::new(oxid, oid, ipid, public_refs)
        }
    }

    pub fn requires_pinging(&self) -> bool {
        (self.flags & flags::SORF_NOPING) == 0
    }
}

impl NdrEncode for StdObjRef {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(8);
        w.write_u32(self.flags);
        w.write_u32(self.public_refs);
        self.oxid.ndr_encode(w)?;
        self.oid.ndr_encode(w)?;
        self.ipid.ndr_encode(w)
    }

    fn ndr_align() -> usize {
        8
    }
}

impl NdrDecode for StdObjRef {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(8)?;
        self.flags = r.read_u32()?;
        self.public_refs = r.read_u32()?;
        self.oxid.ndr_decode(r)?;
        self.oid.ndr_decode(r)?;
        self.ipid.ndr_decode(r)
    }

    fn ndr_align() -> usize {
        8
    }
}
