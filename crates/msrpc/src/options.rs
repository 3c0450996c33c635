//! Bind, call and connection options

use std::sync::Arc;
use std::time::Duration;

use msrpc_ndr::NdrContext;

use crate::conn::BoundConn;
use crate::syntax::Uuid;

/// Default upper bound on a single request or response stub
pub const DEFAULT_MAX_STUB_SIZE: usize = 4 * 1024 * 1024;

/// Authentication level negotiated at bind (MS-RPCE 2.2.1.1.8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AuthLevel {
    /// Use whatever the transport negotiates
    #[default]
    Default = 0,
    /// No authentication
    None = 1,
    /// Connect-level authentication (authenticate at connection)
    Connect = 2,
    /// Call-level authentication (authenticate each call)
    Call = 3,
    /// Packet-level authentication (authenticate each packet)
    Pkt = 4,
    /// Packet integrity (sign each packet)
    PktIntegrity = 5,
    /// Packet privacy (encrypt each packet)
    PktPrivacy = 6,
}

/// Options applied when binding an interface on a connection
#[derive(Debug, Clone, Default)]
pub struct BindOptions {
    pub auth_level: AuthLevel,
    /// Context of the derived interface's client. When set, no bind is
    /// sent and the embedded base client shares this context.
    pub superclass: Option<Arc<BoundConn>>,
}

impl BindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auth_level(mut self, level: AuthLevel) -> Self {
        self.auth_level = level;
        self
    }

    pub fn superclass(mut self, derived: &Arc<BoundConn>) -> Self {
        self.superclass = Some(Arc::clone(derived));
        self
    }
}

/// Per-call options
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Object UUID sent with the request (the IPID for DCOM calls)
    pub object: Option<Uuid>,
    /// Overrides the connection's call timeout
    pub timeout: Option<Duration>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, object: Uuid) -> Self {
        self.object = Some(object);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn has_object(&self) -> bool {
        self.object.is_some_and(|o| !o.is_nil())
    }
}

/// Connection configuration
#[derive(Debug, Clone)]
pub struct ConnConfig {
    /// Data representation used for every call on the connection
    pub ndr: NdrContext,
    pub call_timeout: Duration,
    pub max_stub_size: usize,
}

impl Default for ConnConfig {
    fn default() -> Self {
        Self {
            ndr: NdrContext::default(),
            call_timeout: Duration::from_secs(30),
            max_stub_size: DEFAULT_MAX_STUB_SIZE,
        }
    }
}

impl ConnConfig {
    pub fn with_ndr(mut self, ndr: NdrContext) -> Self {
        self.ndr = ndr;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_max_stub_size(mut self, size: usize) -> Self {
        self.max_stub_size = size;
        self
    }
}
