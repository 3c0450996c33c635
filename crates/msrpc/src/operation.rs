//! Operation envelope
//!
//! An [`Operation`] is one method of one interface: a request half the client
//! fills and the server reads, and a response half flowing back. Both halves
//! are marshaled with a fresh writer or reader per call, so nothing about one
//! call's pointers or sizes leaks into the next.

use bytes::Bytes;
use msrpc_ndr::{NdrContext, NdrError, NdrReader, NdrWriter};
use tracing::debug;

use crate::error::{Result, RpcError};

/// One numbered method of an interface.
///
/// Each top-level parameter is marshaled with `write_param` / `read_param`
/// so its deferred referents follow it directly.
pub trait Operation: Send {
    /// Method index within the interface
    fn op_num(&self) -> u16;

    /// Fully-qualified name, used to tag errors, e.g. `/IDispatch/v0/GetIDsOfNames`
    fn op_name(&self) -> &'static str;

    /// Fill derived fields (lengths, counts) before the request is marshaled
    fn prepare_request(&mut self) -> Result<()> {
        Ok(())
    }

    /// Fill derived fields before the response is marshaled
    fn prepare_response(&mut self) -> Result<()> {
        Ok(())
    }

    fn marshal_request<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()>;

    fn unmarshal_request<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()>;

    fn marshal_response<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()>;

    fn unmarshal_response<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()>;

    /// Method return value from the response; zero means success
    fn return_code(&self) -> i32 {
        0
    }
}

/// Marshal the request half of `op` into a stub
pub fn encode_request(op: &mut dyn Operation, ctx: NdrContext) -> Result<Bytes> {
    let name = op.op_name();
    op.prepare_request()?;
    let op: &dyn Operation = op;
    let mut w = NdrWriter::new(ctx);
    op.marshal_request(&mut w).map_err(RpcError::ndr(name))?;
    let stub = w.into_bytes().map_err(RpcError::ndr(name))?;
    debug!(op = name, opnum = op.op_num(), len = stub.len(), "request marshaled");
    Ok(stub)
}

/// Marshal the response half of `op` into a stub
pub fn encode_response(op: &mut dyn Operation, ctx: NdrContext) -> Result<Bytes> {
    let name = op.op_name();
    op.prepare_response()?;
    let op: &dyn Operation = op;
    let mut w = NdrWriter::new(ctx);
    op.marshal_response(&mut w).map_err(RpcError::ndr(name))?;
    let stub = w.into_bytes().map_err(RpcError::ndr(name))?;
    debug!(op = name, opnum = op.op_num(), len = stub.len(), "response marshaled");
    Ok(stub)
}

/// Unmarshal a request stub into `op`
pub fn decode_request(op: &mut dyn Operation, ctx: NdrContext, stub: Bytes) -> Result<()> {
    let name = op.op_name();
    let mut r = NdrReader::new(stub, ctx);
    op.unmarshal_request(&mut r).map_err(RpcError::ndr(name))?;
    finish(r, name)
}

/// Unmarshal a response stub into `op`
pub fn decode_response(op: &mut dyn Operation, ctx: NdrContext, stub: Bytes) -> Result<()> {
    let name = op.op_name();
    let mut r = NdrReader::new(stub, ctx);
    op.unmarshal_response(&mut r).map_err(RpcError::ndr(name))?;
    finish(r, name)
}

fn finish(r: NdrReader<'_>, name: &'static str) -> Result<()> {
    if r.pending() > 0 {
        return Err(RpcError::Ndr {
            op: name,
            source: NdrError::PendingReferents(r.pending()),
        });
    }
    if r.remaining() > 0 {
        debug!(op = name, trailing = r.remaining(), "ignoring trailing stub bytes");
    }
    Ok(())
}
