//! Transport boundary
//!
//! A [`Transport`] moves finished stubs. Framing, fragmentation and
//! authentication live behind it; the connection only hands it a
//! presentation context, an opnum, an optional object UUID and the stub.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::options::AuthLevel;
use crate::syntax::{SyntaxId, Uuid};

/// Presentation context negotiation for one interface
#[derive(Debug, Clone)]
pub struct BindRequest {
    pub context_id: u16,
    pub syntax: SyntaxId,
    pub auth_level: AuthLevel,
}

/// One request stub ready to send
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub context_id: u16,
    pub opnum: u16,
    /// Object UUID, carried in the request header when present
    pub object: Option<Uuid>,
    pub stub: Bytes,
}

/// Carries bound calls to a server
#[async_trait]
pub trait Transport: Send + Sync {
    /// Negotiate a new presentation context
    async fn bind(&self, request: &BindRequest) -> Result<()>;

    /// Add or change a presentation context on an established association
    async fn alter_context(&self, request: &BindRequest) -> Result<()>;

    /// Send one request and wait for its response stub
    async fn call(&self, request: CallRequest) -> Result<Bytes>;
}
