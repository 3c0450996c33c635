//! Error types for MSRPC calls

use msrpc_ndr::NdrError;
use thiserror::Error;

use crate::status::{nca, Status};

/// RPC error types
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Marshaling failure, tagged with the operation it happened in
    #[error("{op}: {source}")]
    Ndr {
        op: &'static str,
        #[source]
        source: NdrError,
    },

    /// The call completed but the server returned a failure code
    #[error("{op}: {status}")]
    Status { op: &'static str, status: Status },

    #[error("{interface}: operation {opnum} is not implemented")]
    NotImplemented { interface: String, opnum: u16 },

    /// A required call option was not supplied; raised before sending
    #[error("{op}: {option} is missing")]
    MissingOption {
        op: &'static str,
        option: &'static str,
    },

    /// A parameter failed a range check while the request was prepared
    #[error("{op}: {field} {value} is out of range (max {max})")]
    OutOfRange {
        op: &'static str,
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("invalid UUID: {0}")]
    InvalidUuid(String),

    #[error("not bound")]
    NotBound,

    #[error("bind failed: {0}")]
    BindFailed(String),

    #[error("interface not found: {0}")]
    InterfaceNotFound(String),

    #[error("fault: status 0x{0:08x}")]
    Fault(u32),

    #[error("context mismatch")]
    ContextMismatch,

    #[error("connection closed")]
    ConnectionClosed,

    #[error("{op}: timeout")]
    Timeout { op: &'static str },

    #[error("stub too large: {size} bytes exceeds maximum {max}")]
    StubTooLarge { size: usize, max: usize },

    /// Transport or server failure of a named call
    #[error("{op}: {source}")]
    Call {
        op: &'static str,
        #[source]
        source: Box<RpcError>,
    },
}

impl RpcError {
    /// Attach the operation name unless the error already names it
    pub fn in_call(self, op: &'static str) -> RpcError {
        match self {
            e @ (RpcError::Ndr { .. }
            | RpcError::Status { .. }
            | RpcError::MissingOption { .. }
            | RpcError::OutOfRange { .. }
            | RpcError::Timeout { .. }
            | RpcError::Call { .. }) => e,
            other => RpcError::Call {
                op,
                source: Box::new(other),
            },
        }
    }

    /// The underlying error with any call tagging removed
    pub fn root(&self) -> &RpcError {
        match self {
            RpcError::Call { source, .. } => source.root(),
            other => other,
        }
    }

    /// Tag a codec error with the operation it belongs to
    pub fn ndr(op: &'static str) -> impl FnOnce(NdrError) -> RpcError {
        move |source| RpcError::Ndr { op, source }
    }

    /// The fault status a server reports for this error
    pub fn fault_code(&self) -> u32 {
        match self {
            RpcError::Fault(code) => *code,
            RpcError::NotImplemented { .. } => nca::NCA_S_OP_RNG_ERROR,
            RpcError::InterfaceNotFound(_) => nca::NCA_S_UNK_IF,
            RpcError::Ndr { .. } => nca::NCA_S_FAULT_NDR,
            RpcError::ContextMismatch => nca::NCA_S_FAULT_CONTEXT_MISMATCH,
            RpcError::Status { status, .. } => status.code(),
            RpcError::Call { source, .. } => source.fault_code(),
            _ => nca::NCA_S_FAULT_UNSPEC,
        }
    }

    /// The status carried by a failed call, if it got that far
    pub fn status(&self) -> Option<Status> {
        match self.root() {
            RpcError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;
