//! Server-side dispatch
//!
//! An [`Interface`] maps opnums to handlers. A handler decodes the request
//! half of its operation, runs the application logic and hands back the
//! operation with its response half filled; [`Interface::dispatch`] then
//! marshals that response. The dispatch table is immutable once built, so
//! interfaces are shared between concurrent calls without locking.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use msrpc_ndr::NdrContext;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Result, RpcError};
use crate::operation::{decode_request, encode_response, Operation};
use crate::options::DEFAULT_MAX_STUB_SIZE;
use crate::syntax::{SyntaxId, Uuid};

/// Future returned by an operation handler
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Box<dyn Operation>>> + Send>>;

/// Operation handler: decodes the request stub and produces the completed operation
pub type OperationHandler = Arc<dyn Fn(CallContext, Bytes) -> HandlerFuture + Send + Sync>;

/// Per-call information handed to handlers
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Interface the call was bound to
    pub interface: SyntaxId,
    pub opnum: u16,
    /// Object UUID from the request header (the IPID for DCOM calls)
    pub object: Option<Uuid>,
    pub ndr: NdrContext,
}

impl CallContext {
    pub fn new(interface: SyntaxId, opnum: u16) -> Self {
        Self {
            interface,
            opnum,
            object: None,
            ndr: NdrContext::default(),
        }
    }

    pub fn with_object(mut self, object: Option<Uuid>) -> Self {
        self.object = object;
        self
    }

    pub fn with_ndr(mut self, ndr: NdrContext) -> Self {
        self.ndr = ndr;
        self
    }
}

/// Interface definition - contains operations for a specific interface version
pub struct Interface {
    pub syntax: SyntaxId,
    name: String,
    operations: HashMap<u16, OperationHandler>,
}

impl Interface {
    pub fn new(uuid: Uuid, major_version: u16, minor_version: u16) -> Self {
        Self::from_syntax(SyntaxId::new(uuid, major_version, minor_version))
    }

    pub fn from_syntax(syntax: SyntaxId) -> Self {
        Self {
            syntax,
            name: syntax.uuid.to_string(),
            operations: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a raw handler
    pub fn register_handler(&mut self, opnum: u16, handler: OperationHandler) {
        self.operations.insert(opnum, handler);
    }

    /// Register a typed operation handler.
    ///
    /// The request is decoded into a default `O` before `handler` runs.
    pub fn register_operation<O, F, Fut>(&mut self, opnum: u16, handler: F)
    where
        O: Operation + Default + 'static,
        F: Fn(CallContext, O) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        self.register_handler(
            opnum,
            Arc::new(move |ctx: CallContext, stub: Bytes| -> HandlerFuture {
                let handler = Arc::clone(&handler);
                Box::pin(async move {
                    let mut op = O::default();
                    decode_request(&mut op, ctx.ndr, stub)?;
                    let op = handler(ctx, op).await?;
                    Ok(Box::new(op) as Box<dyn Operation>)
                })
            }),
        );
    }

    /// Get an operation handler
    pub fn get_operation(&self, opnum: u16) -> Option<&OperationHandler> {
        self.operations.get(&opnum)
    }

    /// Registered opnums in ascending order
    pub fn opnums(&self) -> Vec<u16> {
        let mut opnums: Vec<u16> = self.operations.keys().copied().collect();
        opnums.sort_unstable();
        opnums
    }

    /// Decode and run one call, returning the completed operation
    pub async fn handle(&self, ctx: CallContext, stub: Bytes) -> Result<Box<dyn Operation>> {
        let opnum = ctx.opnum;
        let handler = match self.get_operation(opnum) {
            Some(handler) => Arc::clone(handler),
            None => {
                warn!(interface = %self.name, opnum, "operation not implemented");
                return Err(RpcError::NotImplemented {
                    interface: self.name.clone(),
                    opnum,
                });
            }
        };
        debug!(interface = %self.name, opnum, len = stub.len(), "dispatching");
        handler(ctx, stub).await
    }

    /// Run one call and marshal its response stub
    pub async fn dispatch(&self, ctx: CallContext, stub: Bytes) -> Result<Bytes> {
        let ndr = ctx.ndr;
        let mut op = self.handle(ctx, stub).await?;
        encode_response(op.as_mut(), ndr)
    }
}

/// Builder for creating interfaces with a fluent API
pub struct InterfaceBuilder {
    interface: Interface,
}

impl InterfaceBuilder {
    pub fn new(uuid: &str, major_version: u16, minor_version: u16) -> Option<Self> {
        let uuid = Uuid::parse(uuid)?;
        Some(Self {
            interface: Interface::new(uuid, major_version, minor_version),
        })
    }

    pub fn from_syntax(syntax: SyntaxId) -> Self {
        Self {
            interface: Interface::from_syntax(syntax),
        }
    }

    /// Human-readable interface name used in errors and logs
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.interface.name = name.into();
        self
    }

    pub fn operation<O, F, Fut>(mut self, opnum: u16, handler: F) -> Self
    where
        O: Operation + Default + 'static,
        F: Fn(CallContext, O) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O>> + Send + 'static,
    {
        self.interface.register_operation(opnum, handler);
        self
    }

    pub fn handler(mut self, opnum: u16, handler: OperationHandler) -> Self {
        self.interface.register_handler(opnum, handler);
        self
    }

    /// Serve every opnum of `base` this interface does not define itself.
    ///
    /// Derived interfaces share the opnums of the interface they extend, so
    /// those calls are answered by the base handlers.
    pub fn inherit(mut self, base: &Interface) -> Self {
        for (opnum, handler) in &base.operations {
            self.interface
                .operations
                .entry(*opnum)
                .or_insert_with(|| Arc::clone(handler));
        }
        self
    }

    pub fn build(self) -> Interface {
        self.interface
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub max_stub_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_stub_size: DEFAULT_MAX_STUB_SIZE,
        }
    }
}

/// Server statistics
#[derive(Debug, Default)]
pub struct ServerStats {
    pub requests_received: AtomicU64,
    pub requests_processed: AtomicU64,
    pub requests_failed: AtomicU64,
    pub requests_not_implemented: AtomicU64,
    pub bytes_received: AtomicU64,
    pub bytes_sent: AtomicU64,
}

impl ServerStats {
    pub fn snapshot(&self) -> ServerStatsSnapshot {
        ServerStatsSnapshot {
            requests_received: self.requests_received.load(Ordering::Relaxed),
            requests_processed: self.requests_processed.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            requests_not_implemented: self.requests_not_implemented.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of server statistics
#[derive(Debug, Clone)]
pub struct ServerStatsSnapshot {
    pub requests_received: u64,
    pub requests_processed: u64,
    pub requests_failed: u64,
    pub requests_not_implemented: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
}

/// Registry of interfaces served in one process
pub struct RpcServer {
    interfaces: RwLock<HashMap<Uuid, Arc<Interface>>>,
    config: ServerConfig,
    stats: ServerStats,
}

impl Default for RpcServer {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcServer {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            interfaces: RwLock::new(HashMap::new()),
            config,
            stats: ServerStats::default(),
        }
    }

    /// Get server statistics
    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }

    /// Register an interface with the server
    pub fn register_interface(&self, interface: Interface) {
        info!(
            "Registering interface: {} ({})",
            interface.name, interface.syntax
        );
        self.interfaces
            .write()
            .insert(interface.syntax.uuid, Arc::new(interface));
    }

    /// Look up a registered interface by its syntax
    pub fn interface(&self, syntax: &SyntaxId) -> Option<Arc<Interface>> {
        self.interfaces
            .read()
            .get(&syntax.uuid)
            .filter(|iface| iface.syntax.major_version() == syntax.major_version())
            .cloned()
    }

    /// Dispatch one request stub and return the response stub
    pub async fn dispatch(&self, ctx: CallContext, stub: Bytes) -> Result<Bytes> {
        self.stats.requests_received.fetch_add(1, Ordering::Relaxed);
        self.stats
            .bytes_received
            .fetch_add(stub.len() as u64, Ordering::Relaxed);

        if stub.len() > self.config.max_stub_size {
            self.stats.requests_failed.fetch_add(1, Ordering::Relaxed);
            return Err(RpcError::StubTooLarge {
                size: stub.len(),
                max: self.config.max_stub_size,
            });
        }

        // Release lock before calling handler
        let interface = match self.interface(&ctx.interface) {
            Some(interface) => interface,
            None => {
                self.stats.requests_failed.fetch_add(1, Ordering::Relaxed);
                return Err(RpcError::InterfaceNotFound(ctx.interface.to_string()));
            }
        };

        match interface.dispatch(ctx, stub).await {
            Ok(response) => {
                self.stats.requests_processed.fetch_add(1, Ordering::Relaxed);
                self.stats
                    .bytes_sent
                    .fetch_add(response.len() as u64, Ordering::Relaxed);
                Ok(response)
            }
            Err(e) => {
                if matches!(e, RpcError::NotImplemented { .. }) {
                    self.stats
                        .requests_not_implemented
                        .fetch_add(1, Ordering::Relaxed);
                }
                self.stats.requests_failed.fetch_add(1, Ordering::Relaxed);
                warn!("Operation error: {}", e);
                Err(e)
            }
        }
    }
}
