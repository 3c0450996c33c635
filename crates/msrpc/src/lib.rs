//! MSRPC operation runtime
//!
//! This crate sits between generated interface stubs and a transport. It
//! provides:
//!
//! - UUID and syntax identifiers
//! - The [`Operation`] envelope: request/response marshaling through
//!   `msrpc-ndr`, one writer or reader per call
//! - Client connections ([`Conn`], [`BoundConn`]) with bind, alter-context
//!   and superclass binds
//! - Server dispatch ([`Interface`], [`InterfaceBuilder`], [`RpcServer`])
//!   with base-interface delegation
//! - A status taxonomy mapping HRESULT, NTSTATUS and Win32 codes
//! - An in-process [`LoopbackTransport`]
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use msrpc::{BindOptions, CallOptions, Conn, InterfaceBuilder, LoopbackTransport, RpcServer};
//! # use msrpc::Operation;
//! # use msrpc_ndr::{NdrReader, NdrWriter};
//! # #[derive(Default)]
//! # struct Ping { value: u32 }
//! # impl Operation for Ping {
//! #     fn op_num(&self) -> u16 { 0 }
//! #     fn op_name(&self) -> &'static str { "/IPing/v1/Ping" }
//! #     fn marshal_request<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> { w.write_param(&self.value) }
//! #     fn unmarshal_request<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> { r.read_param(&mut self.value) }
//! #     fn marshal_response<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> { w.write_param(&self.value) }
//! #     fn unmarshal_response<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> { r.read_param(&mut self.value) }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> msrpc::Result<()> {
//!     let interface = InterfaceBuilder::new("12345678-1234-1234-1234-123456789012", 1, 0)
//!         .unwrap()
//!         .operation(0, |_ctx, mut op: Ping| async move {
//!             op.value += 1;
//!             Ok(op)
//!         })
//!         .build();
//!     let syntax = interface.syntax;
//!
//!     let server = Arc::new(RpcServer::new());
//!     server.register_interface(interface);
//!
//!     let conn = Conn::new(Arc::new(LoopbackTransport::new(server)));
//!     let bound = conn.bind(syntax, BindOptions::default()).await?;
//!     let pong = bound.call(Ping { value: 1 }, &CallOptions::default()).await?;
//!     assert_eq!(pong.value, 2);
//!     Ok(())
//! }
//! ```

pub mod conn;
pub mod error;
pub mod loopback;
pub mod operation;
pub mod options;
pub mod server;
pub mod status;
pub mod syntax;
pub mod transport;

pub use conn::{BoundConn, Conn};
pub use error::{Result, RpcError};
pub use loopback::LoopbackTransport;
pub use operation::{decode_request, decode_response, encode_request, encode_response, Operation};
pub use options::{AuthLevel, BindOptions, CallOptions, ConnConfig, DEFAULT_MAX_STUB_SIZE};
pub use server::{
    CallContext, HandlerFuture, Interface, InterfaceBuilder, OperationHandler, RpcServer,
    ServerConfig, ServerStats, ServerStatsSnapshot,
};
pub use status::{hresult, nca, ntstatus, win32, Status};
pub use syntax::{SyntaxId, Uuid, NDR_SYNTAX_UUID, NDR_SYNTAX_VERSION};
pub use transport::{BindRequest, CallRequest, Transport};
