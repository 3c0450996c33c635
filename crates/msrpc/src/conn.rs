//! Client connections and bound interfaces
//!
//! A [`Conn`] owns one transport association. Each [`Conn::bind`] negotiates
//! a presentation context and returns a [`BoundConn`] for making calls on
//! that interface. A bound connection is shared between concurrent calls;
//! every call marshals with its own writer and reader.

use std::sync::atomic::{AtomicU16, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Result, RpcError};
use crate::operation::{decode_response, encode_request, Operation};
use crate::options::{AuthLevel, BindOptions, CallOptions, ConnConfig};
use crate::status::Status;
use crate::syntax::SyntaxId;
use crate::transport::{BindRequest, CallRequest, Transport};

/// A client association with one server
pub struct Conn {
    transport: Arc<dyn Transport>,
    config: ConnConfig,
    next_context: AtomicU16,
    bound: RwLock<Vec<Arc<BoundConn>>>,
}

impl Conn {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, ConnConfig::default())
    }

    pub fn with_config(transport: Arc<dyn Transport>, config: ConnConfig) -> Self {
        Self {
            transport,
            config,
            next_context: AtomicU16::new(0),
            bound: RwLock::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &ConnConfig {
        &self.config
    }

    /// Number of presentation contexts bound so far
    pub fn bound_count(&self) -> usize {
        self.bound.read().len()
    }

    /// Bind `syntax` on this connection.
    ///
    /// With [`BindOptions::superclass`] set, no bind is sent: the derived
    /// client's context is returned, so an embedded base-interface client
    /// shares it. That context must belong to this connection.
    pub async fn bind(&self, syntax: SyntaxId, options: BindOptions) -> Result<Arc<BoundConn>> {
        if let Some(derived) = options.superclass {
            let owned = self.bound.read().iter().any(|b| Arc::ptr_eq(b, &derived));
            if !owned {
                return Err(RpcError::NotBound);
            }
            debug!(
                syntax = %syntax,
                context_id = derived.context_id(),
                derived = %derived.syntax(),
                "superclass bind reuses derived context"
            );
            return Ok(derived);
        }

        let context_id = self.next_context.fetch_add(1, Ordering::SeqCst);
        let request = BindRequest {
            context_id,
            syntax,
            auth_level: options.auth_level,
        };
        self.transport.bind(&request).await?;
        info!(
            "Bound {} on context {} (auth level {:?})",
            syntax, context_id, options.auth_level
        );

        let bound = Arc::new(BoundConn {
            transport: Arc::clone(&self.transport),
            config: self.config.clone(),
            state: RwLock::new(BindState {
                context_id,
                syntax,
                auth_level: options.auth_level,
            }),
            calls: AtomicU32::new(0),
        });
        self.bound.write().push(Arc::clone(&bound));
        Ok(bound)
    }
}

#[derive(Debug, Clone, Copy)]
struct BindState {
    context_id: u16,
    syntax: SyntaxId,
    auth_level: AuthLevel,
}

/// An interface bound on a connection
pub struct BoundConn {
    transport: Arc<dyn Transport>,
    config: ConnConfig,
    state: RwLock<BindState>,
    calls: AtomicU32,
}

impl std::fmt::Debug for BoundConn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundConn")
            .field("state", &*self.state.read())
            .field("calls", &self.call_count())
            .finish()
    }
}

impl BoundConn {
    pub fn context_id(&self) -> u16 {
        self.state.read().context_id
    }

    pub fn syntax(&self) -> SyntaxId {
        self.state.read().syntax
    }

    pub fn auth_level(&self) -> AuthLevel {
        self.state.read().auth_level
    }

    pub fn config(&self) -> &ConnConfig {
        &self.config
    }

    /// Number of calls sent on this context
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Renegotiate the presentation context with new options
    pub async fn alter_context(&self, options: BindOptions) -> Result<()> {
        let mut request = {
            let state = self.state.read();
            BindRequest {
                context_id: state.context_id,
                syntax: state.syntax,
                auth_level: state.auth_level,
            }
        };
        request.auth_level = options.auth_level;
        self.transport.alter_context(&request).await?;
        self.state.write().auth_level = options.auth_level;
        info!(
            "Altered context {} to auth level {:?}",
            request.context_id, options.auth_level
        );
        Ok(())
    }

    /// Send `op` and fill its response half.
    ///
    /// The return code is not inspected; see [`BoundConn::call`].
    pub async fn invoke(&self, op: &mut dyn Operation, options: &CallOptions) -> Result<()> {
        let name = op.op_name();
        let opnum = op.op_num();

        let stub = encode_request(op, self.config.ndr)?;
        if stub.len() > self.config.max_stub_size {
            return Err(RpcError::StubTooLarge {
                size: stub.len(),
                max: self.config.max_stub_size,
            }
            .in_call(name));
        }

        let request = CallRequest {
            context_id: self.context_id(),
            opnum,
            object: options.object,
            stub,
        };
        self.calls.fetch_add(1, Ordering::Relaxed);
        debug!(op = name, opnum, object = ?options.object, "sending request");

        let timeout = options.timeout.unwrap_or(self.config.call_timeout);
        let response = match tokio::time::timeout(timeout, self.transport.call(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(e.in_call(name)),
            Err(_) => {
                warn!(op = name, ?timeout, "call timed out");
                return Err(RpcError::Timeout { op: name });
            }
        };

        debug!(op = name, len = response.len(), "response received");
        decode_response(op, self.config.ndr, response)
    }

    /// Send `op`, failing with the mapped status if its return code is non-zero
    pub async fn call<O: Operation>(&self, mut op: O, options: &CallOptions) -> Result<O> {
        self.invoke(&mut op, options).await?;
        match op.return_code() {
            0 => Ok(op),
            code => Err(self.error_for(&op, code)),
        }
    }

    /// Error for a non-zero return code of `op`
    pub fn error_for(&self, op: &dyn Operation, code: i32) -> RpcError {
        let status = Status::from_code(code);
        warn!(op = op.op_name(), %status, "call returned failure");
        RpcError::Status {
            op: op.op_name(),
            status,
        }
    }
}
