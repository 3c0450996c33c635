//! DCOM error types

use msrpc::{hresult, RpcError, Status};
use msrpc_ndr::NdrError;
use thiserror::Error;

use super::identifiers::{Iid, Ipid};

/// Result type for DCOM operations
pub type Result<T> = std::result::Result<T, DcomError>;

/// DCOM-specific errors
#[derive(Error, Debug)]
pub enum DcomError {
    /// Failure of the underlying call, already tagged with the operation
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("marshaling error: {0}")]
    Ndr(#[from] NdrError),

    /// The object does not implement the requested interface
    #[error("interface not supported: {0}")]
    NoInterface(Iid),

    /// No object is exported under the IPID
    #[error("object not connected: {0}")]
    ObjectNotConnected(Ipid),

    #[error("invalid OBJREF: {0}")]
    InvalidObjRef(String),
}

impl DcomError {
    /// HRESULT a server reports for this error
    pub fn hresult(&self) -> u32 {
        match self {
            DcomError::Rpc(e) => e.fault_code(),
            DcomError::Ndr(_) => msrpc::nca::NCA_S_FAULT_NDR,
            DcomError::NoInterface(_) => hresult::E_NOINTERFACE,
            DcomError::ObjectNotConnected(_) => hresult::CO_E_OBJNOTCONNECTED,
            DcomError::InvalidObjRef(_) => hresult::E_INVALIDARG,
        }
    }

    /// The status carried by a failed call, if it got that far
    pub fn status(&self) -> Option<Status> {
        match self {
            DcomError::Rpc(e) => e.status(),
            _ => None,
        }
    }
}

impl From<DcomError> for RpcError {
    fn from(err: DcomError) -> Self {
        match err {
            DcomError::Rpc(e) => e,
            other => RpcError::Fault(other.hresult()),
        }
    }
}
