//! SAFEARRAY (MS-OAUT 2.2.30.10)
//!
//! Only the marshaled form (`wireSAFEARRAY`) is modeled. `cDims` sizes the
//! trailing bounds array, so it is hoisted ahead of the structure like any
//! conformant member.

use msrpc_ndr::{
    decode_elements, encode_elements, impl_ndr_conformant, reconcile_count, saturating_count,
    unsupported, BStr, ConformantArray, NdrConformant, NdrDecode, NdrEncode, NdrReader, NdrUnion,
    NdrWriter, SizeInfo, UniquePtr,
};

/// `fFeatures` bits
pub mod features {
    pub const FADF_AUTO: u16 = 0x0001;
    pub const FADF_STATIC: u16 = 0x0002;
    pub const FADF_EMBEDDED: u16 = 0x0004;
    pub const FADF_FIXEDSIZE: u16 = 0x0010;
    pub const FADF_RECORD: u16 = 0x0020;
    pub const FADF_HAVEIID: u16 = 0x0040;
    pub const FADF_HAVEVARTYPE: u16 = 0x0080;
    pub const FADF_BSTR: u16 = 0x0100;
    pub const FADF_UNKNOWN: u16 = 0x0200;
    pub const FADF_DISPATCH: u16 = 0x0400;
    pub const FADF_VARIANT: u16 = 0x0800;
}

/// `SF_TYPE` discriminants of the array union
pub mod sf_type {
    pub const SF_I2: u32 = 0x0002;
    pub const SF_I4: u32 = 0x0003;
    pub const SF_BSTR: u32 = 0x0008;
    pub const SF_I1: u32 = 0x0010;
    pub const SF_I8: u32 = 0x0014;
}

/// `SAFEARRAYBOUND`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SafeArrayBound {
    pub c_elements: u32,
    pub l_lbound: i32,
}

impl SafeArrayBound {
    pub fn new(c_elements: u32) -> Self {
        Self {
            c_elements,
            l_lbound: 0,
        }
    }
}

impl NdrEncode for SafeArrayBound {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> {
        w.write_u32(self.c_elements);
        w.write_i32(self.l_lbound);
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for SafeArrayBound {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> {
        self.c_elements = r.read_u32()?;
        self.l_lbound = r.read_i32()?;
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

/// `{ ULONG Size; [size_is(Size)] T *pData; }`, the shape shared by every
/// union arm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizedArray<T> {
    /// Element count; zero means "the number of elements"
    pub size: u32,
    pub data: UniquePtr<ConformantArray<T>>,
}

impl<T> Default for SizedArray<T> {
    fn default() -> Self {
        Self {
            size: 0,
            data: UniquePtr::null(),
        }
    }
}

impl<T> SizedArray<T> {
    pub fn new(elements: Vec<T>) -> Self {
        Self {
            size: saturating_count(elements.len()),
            data: UniquePtr::new(ConformantArray::new(elements)),
        }
    }

    pub fn elements(&self) -> &[T] {
        self.data.as_ref().map(|a| a.elements.as_slice()).unwrap_or(&[])
    }

    fn count(&self) -> usize {
        match self.size {
            0 => self.elements().len(),
            size => size as usize,
        }
    }
}

impl<T: NdrEncode + NdrDecode + Default> NdrEncode for SizedArray<T> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> {
        w.write_align(4);
        w.write_count(self.count())?;
        self.data.ndr_encode(w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl<T: NdrEncode + NdrDecode + Default> NdrDecode for SizedArray<T> {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> {
        r.read_align(4)?;
        self.size = r.read_u32()?;
        self.data.ndr_decode(r)
    }

    fn ndr_align() -> usize {
        4
    }
}

/// `SAFEARRAYUNION`, selected by `sfType`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafeArrayUnion {
    Bstr(SizedArray<BStr>),
    Byte(SizedArray<u8>),
    Word(SizedArray<u16>),
    Dword(SizedArray<u32>),
    Hyper(SizedArray<u64>),
}

impl Default for SafeArrayUnion {
    fn default() -> Self {
        Self::Byte(SizedArray::default())
    }
}

impl NdrUnion for SafeArrayUnion {
    const NAME: &'static str = "SAFEARRAYUNION";
    const ARM_ALIGN: usize = 4;

    fn discriminant(&self) -> u32 {
        match self {
            Self::Bstr(_) => sf_type::SF_BSTR,
            Self::Byte(_) => sf_type::SF_I1,
            Self::Word(_) => sf_type::SF_I2,
            Self::Dword(_) => sf_type::SF_I4,
            Self::Hyper(_) => sf_type::SF_I8,
        }
    }

    fn encode_arm<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> {
        match self {
            Self::Bstr(arm) => arm.ndr_encode(w),
            Self::Byte(arm) => arm.ndr_encode(w),
            Self::Word(arm) => arm.ndr_encode(w),
            Self::Dword(arm) => arm.ndr_encode(w),
            Self::Hyper(arm) => arm.ndr_encode(w),
        }
    }

    fn decode_arm<'a>(&'a mut self, discriminant: u32, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> {
        *self = match discriminant {
            sf_type::SF_BSTR => Self::Bstr(SizedArray::default()),
            sf_type::SF_I1 => Self::Byte(SizedArray::default()),
            sf_type::SF_I2 => Self::Word(SizedArray::default()),
            sf_type::SF_I4 => Self::Dword(SizedArray::default()),
            sf_type::SF_I8 => Self::Hyper(SizedArray::default()),
            other => return Err(unsupported::<Self>(other)),
        };
        match self {
            Self::Bstr(arm) => arm.ndr_decode(r),
            Self::Byte(arm) => arm.ndr_decode(r),
            Self::Word(arm) => arm.ndr_decode(r),
            Self::Dword(arm) => arm.ndr_decode(r),
            Self::Hyper(arm) => arm.ndr_decode(r),
        }
    }
}

/// `wireSAFEARRAY`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafeArray {
    /// `cDims`; zero means "the number of bounds"
    pub dims: u16,
    pub features: u16,
    /// Size of one element in bytes
    pub cb_elements: u32,
    pub locks: u32,
    pub data: SafeArrayUnion,
    pub bounds: Vec<SafeArrayBound>,
}

impl SafeArray {
    fn one_dimension(features: u16, cb_elements: u32, data: SafeArrayUnion, len: usize) -> Self {
        Self {
            dims: 1,
            features,
            cb_elements,
            locks: 0,
            data,
            bounds: vec![SafeArrayBound::new(saturating_count(len))],
        }
    }

    /// One-dimensional array of bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::one_dimension(
            features::FADF_HAVEVARTYPE,
            1,
            SafeArrayUnion::Byte(SizedArray::new(bytes.to_vec())),
            bytes.len(),
        )
    }

    /// One-dimensional array of BSTRs
    pub fn from_strings<S: AsRef<str>>(strings: &[S]) -> Self {
        let bstrs = strings.iter().map(|s| BStr::new(s.as_ref())).collect();
        Self::one_dimension(
            features::FADF_BSTR | features::FADF_HAVEVARTYPE,
            4,
            SafeArrayUnion::Bstr(SizedArray::new(bstrs)),
            strings.len(),
        )
    }

    pub fn from_u32s(values: &[u32]) -> Self {
        Self::one_dimension(
            features::FADF_HAVEVARTYPE,
            4,
            SafeArrayUnion::Dword(SizedArray::new(values.to_vec())),
            values.len(),
        )
    }

    /// The bytes of a byte array
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.data {
            SafeArrayUnion::Byte(arm) => Some(arm.elements()),
            _ => None,
        }
    }

    /// The strings of a BSTR array; null BSTRs read as empty strings
    pub fn as_strings(&self) -> Option<Vec<String>> {
        match &self.data {
            SafeArrayUnion::Bstr(arm) => Some(
                arm.elements()
                    .iter()
                    .map(|b| b.as_string().unwrap_or_default())
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn as_u32s(&self) -> Option<&[u32]> {
        match &self.data {
            SafeArrayUnion::Dword(arm) => Some(arm.elements()),
            _ => None,
        }
    }

    /// Total element count across all dimensions
    pub fn element_count(&self) -> u64 {
        self.bounds.iter().map(|b| b.c_elements as u64).product()
    }

    fn dim_count(&self) -> usize {
        match self.dims {
            0 => self.bounds.len(),
            dims => dims as usize,
        }
    }
}

impl NdrConformant for SafeArray {
    fn ndr_size_info(&self) -> SizeInfo {
        SizeInfo::one(self.dim_count())
    }

    fn encode_body<'a>(&'a self, w: &mut NdrWriter<'a>, size: &SizeInfo) -> msrpc_ndr::Result<()> {
        let count = size.dim(0)?;
        let dims =
            u16::try_from(count).map_err(|_| msrpc_ndr::NdrError::IntegerOverflow("cDims"))?;
        w.write_align(4);
        w.write_u16(dims);
        w.write_u16(self.features);
        w.write_u32(self.cb_elements);
        w.write_u32(self.locks);
        w.write_union(&self.data)?;
        encode_elements(&self.bounds, count, w)
    }

    fn decode_body<'a>(&'a mut self, r: &mut NdrReader<'a>, size: &SizeInfo) -> msrpc_ndr::Result<()> {
        r.read_align(4)?;
        self.dims = r.read_u16()?;
        self.features = r.read_u16()?;
        self.cb_elements = r.read_u32()?;
        self.locks = r.read_u32()?;
        r.read_union(&mut self.data)?;
        let count = reconcile_count(size.dim(0)?, self.dims as usize);
        decode_elements(&mut self.bounds, count, r)
    }
}

impl_ndr_conformant!(SafeArray, 4);
