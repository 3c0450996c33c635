//! Common test utilities for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use msrpc::{
    hresult, BindOptions, BoundConn, Conn, Interface, InterfaceBuilder, LoopbackTransport,
    Operation, RpcServer, SyntaxId,
};
use msrpc_ndr::{ConformantArray, NdrReader, NdrWString, NdrWriter, UniquePtr};

/// Echo interface used across test categories
pub const ECHO_UUID: &str = "12345678-1234-abcd-ef00-0123456789ab";
pub const ECHO_VERSION: (u16, u16) = (1, 0);

pub mod echo_opnum {
    pub const ECHO: u16 = 0;
    pub const SUM: u16 = 1;
    pub const MEASURE: u16 = 2;
}

static LOGGING: Once = Once::new();

/// Install a `tracing` subscriber once per test binary; `RUST_LOG` filters it
pub fn init_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

pub fn echo_syntax() -> SyntaxId {
    SyntaxId::parse(ECHO_UUID, ECHO_VERSION.0, ECHO_VERSION.1).expect("valid echo UUID")
}

/// `HRESULT Echo([in, string] wchar_t *text, [out, string] wchar_t **reply)`.
///
/// A text of the form `status:XXXXXXXX` makes the server return that code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Echo {
    pub text: NdrWString,
    pub reply: NdrWString,
    pub ret: i32,
}

impl Echo {
    pub fn new(text: &str) -> Self {
        Self {
            text: NdrWString::new(text),
            ..Default::default()
        }
    }
}

impl Operation for Echo {
    fn op_num(&self) -> u16 {
        echo_opnum::ECHO
    }

    fn op_name(&self) -> &'static str {
        "/IEcho/v1/Echo"
    }

    fn marshal_request<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> {
        w.write_param(&self.text)
    }

    fn unmarshal_request<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> {
        r.read_param(&mut self.text)
    }

    fn marshal_response<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> {
        w.write_param(&self.reply)?;
        w.write_i32(self.ret);
        Ok(())
    }

    fn unmarshal_response<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> {
        r.read_param(&mut self.reply)?;
        self.ret = r.read_i32()?;
        Ok(())
    }

    fn return_code(&self) -> i32 {
        self.ret
    }
}

/// `HRESULT Sum([in] long count, [in, size_is(count)] long *values, [out] hyper *total)`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sum {
    pub values: ConformantArray<i32>,
    pub total: i64,
    pub ret: i32,
}

impl Operation for Sum {
    fn op_num(&self) -> u16 {
        echo_opnum::SUM
    }

    fn op_name(&self) -> &'static str {
        "/IEcho/v1/Sum"
    }

    fn marshal_request<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> {
        w.write_count(self.values.len())?;
        w.write_param(&self.values)
    }

    fn unmarshal_request<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> {
        let _count = r.read_u32()?;
        r.read_param(&mut self.values)
    }

    fn marshal_response<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> {
        w.write_i64(self.total);
        w.write_i32(self.ret);
        Ok(())
    }

    fn unmarshal_response<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> {
        self.total = r.read_i64()?;
        self.ret = r.read_i32()?;
        Ok(())
    }

    fn return_code(&self) -> i32 {
        self.ret
    }
}

/// `HRESULT Measure([in, unique, string] wchar_t *text, [out] long *length)`.
///
/// A null text measures as -1, an empty one as 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Measure {
    pub text: UniquePtr<NdrWString>,
    pub length: i32,
    pub ret: i32,
}

impl Operation for Measure {
    fn op_num(&self) -> u16 {
        echo_opnum::MEASURE
    }

    fn op_name(&self) -> &'static str {
        "/IEcho/v1/Measure"
    }

    fn marshal_request<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> {
        w.write_param(&self.text)
    }

    fn unmarshal_request<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> {
        r.read_param(&mut self.text)
    }

    fn marshal_response<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> {
        w.write_i32(self.length);
        w.write_i32(self.ret);
        Ok(())
    }

    fn unmarshal_response<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> {
        self.length = r.read_i32()?;
        self.ret = r.read_i32()?;
        Ok(())
    }

    fn return_code(&self) -> i32 {
        self.ret
    }
}

/// Echo interface with opnums 0, 1 and 2
pub fn create_echo_interface() -> Interface {
    InterfaceBuilder::from_syntax(echo_syntax())
        .name("IEcho")
        .operation(echo_opnum::ECHO, |_ctx, mut op: Echo| async move {
            match op.text.as_str().strip_prefix("status:") {
                Some(code) => {
                    op.ret = u32::from_str_radix(code, 16).unwrap_or(hresult::E_FAIL) as i32;
                }
                None => op.reply = op.text.clone(),
            }
            Ok(op)
        })
        .operation(echo_opnum::SUM, |_ctx, mut op: Sum| async move {
            op.total = op.values.elements.iter().map(|&v| v as i64).sum();
            Ok(op)
        })
        .operation(echo_opnum::MEASURE, |_ctx, mut op: Measure| async move {
            op.length = op
                .text
                .as_ref()
                .map(|s| s.as_str().encode_utf16().count() as i32)
                .unwrap_or(-1);
            Ok(op)
        })
        .build()
}

/// Server with the given interfaces registered
pub fn start_test_server(interfaces: Vec<Interface>) -> Arc<RpcServer> {
    let server = Arc::new(RpcServer::new());
    for interface in interfaces {
        server.register_interface(interface);
    }
    server
}

/// Connection to an in-process server
pub fn connect(server: Arc<RpcServer>) -> Conn {
    Conn::new(Arc::new(LoopbackTransport::new(server)))
}

/// Echo interface bound on a fresh connection
pub async fn connect_echo() -> Arc<BoundConn> {
    let conn = connect(start_test_server(vec![create_echo_interface()]));
    conn.bind(echo_syntax(), BindOptions::default())
        .await
        .expect("bind echo interface")
}

/// Success and latency counters shared between concurrent tasks
pub struct ConcurrentStats {
    success: AtomicU64,
    failure: AtomicU64,
    total_latency_ns: AtomicU64,
    min_latency_ns: AtomicU64,
    max_latency_ns: AtomicU64,
}

impl ConcurrentStats {
    pub fn new() -> Self {
        Self {
            success: AtomicU64::new(0),
            failure: AtomicU64::new(0),
            total_latency_ns: AtomicU64::new(0),
            min_latency_ns: AtomicU64::new(u64::MAX),
            max_latency_ns: AtomicU64::new(0),
        }
    }

    pub fn record_success(&self, latency: Duration) {
        let ns = latency.as_nanos() as u64;
        self.success.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ns.fetch_add(ns, Ordering::Relaxed);
        self.min_latency_ns.fetch_min(ns, Ordering::Relaxed);
        self.max_latency_ns.fetch_max(ns, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failure.fetch_add(1, Ordering::Relaxed);
    }

    pub fn success_count(&self) -> u64 {
        self.success.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure.load(Ordering::Relaxed)
    }

    pub fn avg_latency(&self) -> Duration {
        match self.success_count() {
            0 => Duration::ZERO,
            n => Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / n),
        }
    }

    pub fn max_latency(&self) -> Duration {
        Duration::from_nanos(self.max_latency_ns.load(Ordering::Relaxed))
    }
}

impl Default for ConcurrentStats {
    fn default() -> Self {
        Self::new()
    }
}
