//! ORPC client
//!
//! An [`ObjectClient`] addresses one interface of one remote object over a
//! bound connection. Every call carries the object's IPID as the request
//! object UUID and an ORPCTHIS header stamped with the client's causality.

use std::sync::Arc;

use msrpc::{BindOptions, BoundConn, CallOptions, Conn, Operation, RpcError, SyntaxId};
use tracing::debug;

use crate::types::{Causality, Iid, Ipid, OrpcThis};

/// An operation whose request starts with an ORPCTHIS header
pub trait OrpcOperation: Operation {
    fn orpc_this(&mut self) -> &mut OrpcThis;
}

/// Which remote interface a client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectIdentity {
    pub iid: Iid,
    /// Unset until the client is pointed at an object
    pub ipid: Option<Ipid>,
    /// Stamped on calls whose ORPCTHIS has no causality of its own
    pub causality: Causality,
}

impl ObjectIdentity {
    pub fn new(iid: Iid) -> Self {
        Self {
            iid,
            ipid: None,
            causality: Causality::generate(),
        }
    }
}

/// Client for one interface of a remote object
#[derive(Clone)]
pub struct ObjectClient {
    conn: Arc<BoundConn>,
    identity: ObjectIdentity,
}

impl ObjectClient {
    /// Bind `syntax` on `conn` and build a client for that interface.
    ///
    /// With `options.superclass` set, the derived client's context is
    /// reused instead of binding again.
    pub async fn bind(conn: &Conn, syntax: SyntaxId, options: BindOptions) -> msrpc::Result<Self> {
        let bound = conn.bind(syntax, options).await?;
        Ok(Self::new(bound, Iid::from(syntax.uuid)))
    }

    pub fn new(conn: Arc<BoundConn>, iid: Iid) -> Self {
        Self {
            conn,
            identity: ObjectIdentity::new(iid),
        }
    }

    pub fn conn(&self) -> &Arc<BoundConn> {
        &self.conn
    }

    pub fn identity(&self) -> &ObjectIdentity {
        &self.identity
    }

    pub fn ipid(&self) -> Option<Ipid> {
        self.identity.ipid
    }

    /// A client for the object behind `ipid`, sharing this client's context
    pub fn with_ipid(&self, ipid: Ipid) -> Self {
        let mut client = self.clone();
        client.identity.ipid = Some(ipid);
        client
    }

    /// A client for base interface `iid` of the same object.
    ///
    /// Base interface methods are called on the derived interface's context
    /// and IPID.
    pub fn superclass(&self, iid: Iid) -> Self {
        let mut client = self.clone();
        client.identity.iid = iid;
        client
    }

    pub async fn alter_context(&self, options: BindOptions) -> msrpc::Result<()> {
        self.conn.alter_context(options).await
    }

    /// Call options addressing this client's object.
    ///
    /// An object already set in `options` wins over the client's IPID.
    pub fn call_options(&self, op: &'static str, options: &CallOptions) -> msrpc::Result<CallOptions> {
        if options.has_object() {
            return Ok(options.clone());
        }
        match self.identity.ipid {
            Some(ipid) if !ipid.is_nil() => Ok(options.clone().with_object(ipid.0)),
            _ => Err(RpcError::MissingOption { op, option: "ipid" }),
        }
    }

    /// Send `op` to the object, failing on a non-zero return code
    pub async fn invoke<O: OrpcOperation>(&self, mut op: O, options: &CallOptions) -> msrpc::Result<O> {
        let options = self.call_options(op.op_name(), options)?;
        let this = op.orpc_this();
        if this.cid.is_nil() {
            this.cid = self.identity.causality;
        }
        debug!(op = op.op_name(), object = ?options.object, "ORPC call");
        self.conn.call(op, &options).await
    }
}

impl std::fmt::Debug for ObjectClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectClient")
            .field("context_id", &self.conn.context_id())
            .field("identity", &self.identity)
            .finish()
    }
}
