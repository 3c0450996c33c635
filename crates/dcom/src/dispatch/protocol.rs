//! IDispatch wire protocol (MS-OAUT 3.1.4)
//!
//! Only the name-resolution half of IDispatch is carried here:
//! GetTypeInfoCount and GetIDsOfNames. Opnums 0-2 belong to IUnknown and
//! are never sent over ORPC.

use msrpc::{Operation, RpcError, SyntaxId, Uuid};
use msrpc_ndr::{
    decode_elements, encode_elements, NdrError, NdrReader, NdrWString, NdrWriter, SizeInfo,
    UniquePtr,
};

use crate::client::OrpcOperation;
use crate::types::{Iid, OrpcThat, OrpcThis};

/// IDispatch interface UUID, 00020400-0000-0000-c000-000000000046
pub const IDISPATCH_IID: Uuid = Uuid {
    time_low: 0x0002_0400,
    time_mid: 0,
    time_hi_and_version: 0,
    clock_seq_hi_and_reserved: 0xc0,
    clock_seq_low: 0,
    node: [0, 0, 0, 0, 0, 0x46],
};

/// IDispatch v0.0
pub const IDISPATCH_SYNTAX: SyntaxId = SyntaxId {
    uuid: IDISPATCH_IID,
    version: 0,
};

/// Operation numbers for IDispatch
pub mod opnum {
    pub const GET_TYPE_INFO_COUNT: u16 = 3;
    pub const GET_TYPE_INFO: u16 = 4;
    pub const GET_IDS_OF_NAMES: u16 = 5;
    pub const INVOKE: u16 = 6;
}

/// Number of opnums IDispatch occupies; derived interfaces start here
pub const IDISPATCH_OPNUM_COUNT: u16 = 7;

/// Upper bound of `cNames`
pub const MAX_NAMES: u32 = 16384;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetTypeInfoCountRequest {
    pub this: OrpcThis,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetTypeInfoCountResponse {
    pub that: OrpcThat,
    /// 1 if the object provides type information, otherwise 0
    pub type_info_count: u32,
    pub ret: i32,
}

/// `HRESULT GetTypeInfoCount([out] UINT *pctinfo)`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetTypeInfoCount {
    pub request: GetTypeInfoCountRequest,
    pub response: GetTypeInfoCountResponse,
}

impl From<GetTypeInfoCountRequest> for GetTypeInfoCount {
    fn from(request: GetTypeInfoCountRequest) -> Self {
        Self {
            request,
            ..Default::default()
        }
    }
}

impl From<GetTypeInfoCount> for GetTypeInfoCountResponse {
    fn from(op: GetTypeInfoCount) -> Self {
        op.response
    }
}

impl Operation for GetTypeInfoCount {
    fn op_num(&self) -> u16 {
        opnum::GET_TYPE_INFO_COUNT
    }

    fn op_name(&self) -> &'static str {
        "/IDispatch/v0/GetTypeInfoCount"
    }

    fn marshal_request<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> {
        w.write_param(&self.request.this)
    }

    fn unmarshal_request<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> {
        r.read_param(&mut self.request.this)
    }

    fn marshal_response<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> {
        w.write_param(&self.response.that)?;
        w.write_u32(self.response.type_info_count);
        w.write_i32(self.response.ret);
        Ok(())
    }

    fn unmarshal_response<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> {
        r.read_param(&mut self.response.that)?;
        self.response.type_info_count = r.read_u32()?;
        self.response.ret = r.read_i32()?;
        Ok(())
    }

    fn return_code(&self) -> i32 {
        self.response.ret
    }
}

impl OrpcOperation for GetTypeInfoCount {
    fn orpc_this(&mut self) -> &mut OrpcThis {
        &mut self.request.this
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetIDsOfNamesRequest {
    pub this: OrpcThis,
    /// Reserved, sent as IID_NULL
    pub iid: Iid,
    /// Names to resolve; empty names travel as null pointers
    pub names: Vec<UniquePtr<NdrWString>>,
    /// `cNames`; zero means "the number of names"
    pub names_count: u32,
    pub lcid: u32,
}

impl GetIDsOfNamesRequest {
    pub fn new<S: AsRef<str>>(names: &[S], lcid: u32) -> Self {
        Self {
            names: names
                .iter()
                .map(|name| match name.as_ref() {
                    "" => UniquePtr::null(),
                    name => UniquePtr::new(NdrWString::new(name)),
                })
                .collect(),
            lcid,
            ..Default::default()
        }
    }

    /// The requested names, with null pointers read as empty names
    pub fn names(&self) -> Vec<String> {
        self.names
            .iter()
            .map(|name| name.as_ref().map(|s| s.as_str().to_string()).unwrap_or_default())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetIDsOfNamesResponse {
    pub that: OrpcThat,
    /// One DISPID per requested name
    pub disp_ids: Vec<i32>,
    pub ret: i32,
}

/// `HRESULT GetIDsOfNames(REFIID riid, [size_is(cNames)] LPOLESTR *rgszNames,
/// UINT cNames, LCID lcid, [out, size_is(cNames)] DISPID *rgDispId)`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetIDsOfNames {
    pub request: GetIDsOfNamesRequest,
    pub response: GetIDsOfNamesResponse,
}

impl GetIDsOfNames {
    /// `cNames` sizes both the names and the returned DISPIDs
    fn names_count(&self) -> usize {
        self.request.names_count as usize
    }
}

impl From<GetIDsOfNamesRequest> for GetIDsOfNames {
    fn from(request: GetIDsOfNamesRequest) -> Self {
        Self {
            request,
            ..Default::default()
        }
    }
}

impl From<GetIDsOfNames> for GetIDsOfNamesResponse {
    fn from(op: GetIDsOfNames) -> Self {
        op.response
    }
}

impl Operation for GetIDsOfNames {
    fn op_num(&self) -> u16 {
        opnum::GET_IDS_OF_NAMES
    }

    fn op_name(&self) -> &'static str {
        "/IDispatch/v0/GetIDsOfNames"
    }

    fn prepare_request(&mut self) -> msrpc::Result<()> {
        if self.request.names_count == 0 {
            self.request.names_count = u32::try_from(self.request.names.len()).unwrap_or(u32::MAX);
        }
        if self.request.names_count > MAX_NAMES {
            return Err(RpcError::OutOfRange {
                op: self.op_name(),
                field: "cNames",
                value: self.request.names_count as u64,
                max: MAX_NAMES as u64,
            });
        }
        Ok(())
    }

    fn marshal_request<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> {
        w.write_param(&self.request.this)?;
        w.write_param(&self.request.iid)?;
        let size = w.declare_size(SizeInfo::one(self.names_count()))?;
        encode_elements(&self.request.names, size.dim(0)?, w)?;
        w.write_deferred()?;
        w.write_u32(self.request.names_count);
        w.write_u32(self.request.lcid);
        Ok(())
    }

    fn unmarshal_request<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> {
        r.read_param(&mut self.request.this)?;
        r.read_param(&mut self.request.iid)?;
        let size = r.declare_size(1)?;
        let declared = size.dim(0)?;
        decode_elements(&mut self.request.names, declared, r)?;
        r.read_deferred()?;
        self.request.names_count = r.read_u32()?;
        self.request.lcid = r.read_u32()?;

        // cNames sizes the response, so it must be in range and agree with
        // the names array actually received
        let names_count = self.request.names_count;
        if names_count > MAX_NAMES {
            return Err(NdrError::AllocationLimitExceeded {
                requested: names_count as usize,
                limit: MAX_NAMES as usize,
            });
        }
        if names_count as usize != declared {
            return Err(NdrError::ConformanceMismatch {
                max_count: u32::try_from(declared).unwrap_or(u32::MAX),
                offset: 0,
                actual_count: names_count,
            });
        }
        Ok(())
    }

    fn marshal_response<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> {
        w.write_param(&self.response.that)?;
        let size = w.declare_size(SizeInfo::one(self.names_count()))?;
        encode_elements(&self.response.disp_ids, size.dim(0)?, w)?;
        w.write_i32(self.response.ret);
        Ok(())
    }

    fn unmarshal_response<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> {
        r.read_param(&mut self.response.that)?;
        let size = r.declare_size(1)?;
        decode_elements(&mut self.response.disp_ids, size.dim(0)?, r)?;
        self.response.ret = r.read_i32()?;
        Ok(())
    }

    fn return_code(&self) -> i32 {
        self.response.ret
    }
}

impl OrpcOperation for GetIDsOfNames {
    fn orpc_this(&mut self) -> &mut OrpcThis {
        &mut self.request.this
    }
}
