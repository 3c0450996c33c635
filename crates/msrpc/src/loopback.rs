//! In-process transport
//!
//! [`LoopbackTransport`] hands request stubs straight to an [`RpcServer`]
//! in the same process. Server-side failures come back the way a remote
//! peer reports them: as fault codes, except for unimplemented opnums and
//! unknown interfaces, which keep their own errors.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use msrpc_ndr::NdrContext;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Result, RpcError};
use crate::server::{CallContext, RpcServer};
use crate::syntax::SyntaxId;
use crate::transport::{BindRequest, CallRequest, Transport};

/// Transport that dispatches to an in-process server
pub struct LoopbackTransport {
    server: Arc<RpcServer>,
    ndr: NdrContext,
    contexts: RwLock<HashMap<u16, SyntaxId>>,
}

impl LoopbackTransport {
    pub fn new(server: Arc<RpcServer>) -> Self {
        Self::with_ndr(server, NdrContext::default())
    }

    /// Use `ndr` as the data representation of every call
    pub fn with_ndr(server: Arc<RpcServer>, ndr: NdrContext) -> Self {
        Self {
            server,
            ndr,
            contexts: RwLock::new(HashMap::new()),
        }
    }

    /// Number of presentation contexts negotiated so far
    pub fn context_count(&self) -> usize {
        self.contexts.read().len()
    }

    fn negotiate(&self, request: &BindRequest) -> Result<()> {
        if self.server.interface(&request.syntax).is_none() {
            return Err(RpcError::BindFailed(format!(
                "abstract syntax {} not supported",
                request.syntax
            )));
        }
        self.contexts
            .write()
            .insert(request.context_id, request.syntax);
        debug!(
            context_id = request.context_id,
            syntax = %request.syntax,
            "presentation context accepted"
        );
        Ok(())
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn bind(&self, request: &BindRequest) -> Result<()> {
        self.negotiate(request)
    }

    async fn alter_context(&self, request: &BindRequest) -> Result<()> {
        self.negotiate(request)
    }

    async fn call(&self, request: CallRequest) -> Result<Bytes> {
        let syntax = self
            .contexts
            .read()
            .get(&request.context_id)
            .copied()
            .ok_or(RpcError::ContextMismatch)?;

        let ctx = CallContext::new(syntax, request.opnum)
            .with_object(request.object)
            .with_ndr(self.ndr);

        match self.server.dispatch(ctx, request.stub).await {
            Ok(response) => Ok(response),
            Err(e @ RpcError::NotImplemented { .. }) => Err(e),
            Err(e @ RpcError::InterfaceNotFound(_)) => Err(e),
            Err(e) => Err(RpcError::Fault(e.fault_code())),
        }
    }
}
