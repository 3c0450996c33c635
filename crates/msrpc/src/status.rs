//! Result-code taxonomy
//!
//! Responses carry a 32-bit signed result code where zero means success.
//! [`Status`] maps a code to the name and message of a known HRESULT,
//! NTSTATUS or Win32 error, keeping the raw value for unknown codes.

use std::fmt;

/// Well-known HRESULT values
pub mod hresult {
    pub const S_OK: u32 = 0x00000000;
    pub const S_FALSE: u32 = 0x00000001;
    pub const E_NOTIMPL: u32 = 0x80004001;
    pub const E_NOINTERFACE: u32 = 0x80004002;
    pub const E_POINTER: u32 = 0x80004003;
    pub const E_ABORT: u32 = 0x80004004;
    pub const E_FAIL: u32 = 0x80004005;
    pub const E_UNEXPECTED: u32 = 0x8000FFFF;
    pub const E_ACCESSDENIED: u32 = 0x80070005;
    pub const E_HANDLE: u32 = 0x80070006;
    pub const E_OUTOFMEMORY: u32 = 0x8007000E;
    pub const E_INVALIDARG: u32 = 0x80070057;
    pub const REGDB_E_CLASSNOTREG: u32 = 0x80040154;
    pub const CO_E_OBJNOTCONNECTED: u32 = 0x800401FD;
    pub const RPC_E_DISCONNECTED: u32 = 0x80010108;
    pub const RPC_E_SERVER_DIED: u32 = 0x80010007;
    pub const RPC_E_TOO_LATE: u32 = 0x80010119;
    pub const DISP_E_UNKNOWNINTERFACE: u32 = 0x80020001;
    pub const DISP_E_MEMBERNOTFOUND: u32 = 0x80020003;
    pub const DISP_E_UNKNOWNNAME: u32 = 0x80020006;
    pub const DISP_E_BADINDEX: u32 = 0x8002000B;
    pub const DISP_E_ARRAYISLOCKED: u32 = 0x8002000D;
}

/// Well-known Win32 error codes
pub mod win32 {
    pub const ERROR_SUCCESS: u32 = 0;
    pub const ERROR_FILE_NOT_FOUND: u32 = 2;
    pub const ERROR_ACCESS_DENIED: u32 = 5;
    pub const ERROR_INVALID_HANDLE: u32 = 6;
    pub const ERROR_NOT_ENOUGH_MEMORY: u32 = 8;
    pub const ERROR_NOT_SUPPORTED: u32 = 50;
    pub const ERROR_INVALID_PARAMETER: u32 = 87;
    pub const ERROR_INSUFFICIENT_BUFFER: u32 = 122;
    pub const ERROR_MORE_DATA: u32 = 234;
    pub const ERROR_NO_MORE_ITEMS: u32 = 259;
    pub const RPC_S_INVALID_BINDING: u32 = 1702;
    pub const RPC_S_UNKNOWN_IF: u32 = 1717;
    pub const RPC_S_PROCNUM_OUT_OF_RANGE: u32 = 1745;
}

/// Well-known NTSTATUS values
pub mod ntstatus {
    pub const STATUS_INVALID_PARAMETER: u32 = 0xC000000D;
    pub const STATUS_ACCESS_DENIED: u32 = 0xC0000022;
    pub const STATUS_OBJECT_NAME_NOT_FOUND: u32 = 0xC0000034;
    pub const STATUS_NOT_SUPPORTED: u32 = 0xC00000BB;
}

/// Fault status codes carried in a fault PDU
pub mod nca {
    pub const NCA_S_OP_RNG_ERROR: u32 = 0x1C010002;
    pub const NCA_S_UNK_IF: u32 = 0x1C010003;
    pub const NCA_S_PROTO_ERROR: u32 = 0x1C01000B;
    pub const NCA_S_FAULT_NDR: u32 = 0x000006F7;
    pub const NCA_S_FAULT_CONTEXT_MISMATCH: u32 = 0x1C00001A;
    pub const NCA_S_FAULT_UNSPEC: u32 = 0x1C000012;
}

struct Entry {
    code: u32,
    name: &'static str,
    message: &'static str,
}

macro_rules! entries {
    ($($module:ident :: $name:ident => $message:expr,)*) => {
        &[$(Entry { code: $module::$name, name: stringify!($name), message: $message },)*]
    };
}

static TABLE: &[Entry] = entries! {
    hresult::S_FALSE => "the operation completed with a false result",
    hresult::E_NOTIMPL => "not implemented",
    hresult::E_NOINTERFACE => "no such interface supported",
    hresult::E_POINTER => "invalid pointer",
    hresult::E_ABORT => "operation aborted",
    hresult::E_FAIL => "unspecified failure",
    hresult::E_UNEXPECTED => "catastrophic failure",
    hresult::E_ACCESSDENIED => "general access denied error",
    hresult::E_HANDLE => "invalid handle",
    hresult::E_OUTOFMEMORY => "not enough memory",
    hresult::E_INVALIDARG => "one or more arguments are invalid",
    hresult::REGDB_E_CLASSNOTREG => "class not registered",
    hresult::CO_E_OBJNOTCONNECTED => "object is not connected to server",
    hresult::RPC_E_DISCONNECTED => "the object invoked has disconnected from its clients",
    hresult::RPC_E_SERVER_DIED => "the remote server died",
    hresult::RPC_E_TOO_LATE => "the call was made too late",
    hresult::DISP_E_UNKNOWNINTERFACE => "unknown interface",
    hresult::DISP_E_MEMBERNOTFOUND => "member not found",
    hresult::DISP_E_UNKNOWNNAME => "unknown name",
    hresult::DISP_E_BADINDEX => "invalid index",
    hresult::DISP_E_ARRAYISLOCKED => "memory is locked",
    win32::ERROR_FILE_NOT_FOUND => "the system cannot find the file specified",
    win32::ERROR_ACCESS_DENIED => "access is denied",
    win32::ERROR_INVALID_HANDLE => "the handle is invalid",
    win32::ERROR_NOT_ENOUGH_MEMORY => "not enough memory resources are available",
    win32::ERROR_NOT_SUPPORTED => "the request is not supported",
    win32::ERROR_INVALID_PARAMETER => "the parameter is incorrect",
    win32::ERROR_INSUFFICIENT_BUFFER => "the data area passed to a system call is too small",
    win32::ERROR_MORE_DATA => "more data is available",
    win32::ERROR_NO_MORE_ITEMS => "no more data is available",
    win32::RPC_S_INVALID_BINDING => "the binding handle is invalid",
    win32::RPC_S_UNKNOWN_IF => "the interface is unknown",
    win32::RPC_S_PROCNUM_OUT_OF_RANGE => "the procedure number is out of range",
    ntstatus::STATUS_INVALID_PARAMETER => "an invalid parameter was passed",
    ntstatus::STATUS_ACCESS_DENIED => "access denied",
    ntstatus::STATUS_OBJECT_NAME_NOT_FOUND => "the object name is not found",
    ntstatus::STATUS_NOT_SUPPORTED => "the request is not supported",
    nca::NCA_S_OP_RNG_ERROR => "operation number out of range",
    nca::NCA_S_UNK_IF => "unknown interface",
    nca::NCA_S_PROTO_ERROR => "protocol error",
    nca::NCA_S_FAULT_NDR => "NDR stub data error",
    nca::NCA_S_FAULT_CONTEXT_MISMATCH => "context handle mismatch",
    nca::NCA_S_FAULT_UNSPEC => "unspecified fault",
};

/// A response result code and its place in the taxonomy
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub u32);

impl Status {
    pub const OK: Status = Status(hresult::S_OK);

    /// Status for the signed return value carried in a response
    pub fn from_code(code: i32) -> Self {
        Self(code as u32)
    }

    pub fn code(&self) -> u32 {
        self.0
    }

    pub fn is_success(&self) -> bool {
        self.0 == 0
    }

    /// Severity bit set: a failure HRESULT or error NTSTATUS
    pub fn is_failure_hresult(&self) -> bool {
        self.0 & 0x8000_0000 != 0
    }

    fn entry(&self) -> Option<&'static Entry> {
        TABLE.iter().find(|e| e.code == self.0)
    }

    /// Symbolic name, e.g. `E_INVALIDARG`
    pub fn name(&self) -> Option<&'static str> {
        self.entry().map(|e| e.name)
    }

    pub fn message(&self) -> Option<&'static str> {
        self.entry().map(|e| e.message)
    }
}

impl From<i32> for Status {
    fn from(code: i32) -> Self {
        Self::from_code(code)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.entry() {
            Some(e) => write!(f, "{} (0x{:08x})", e.name, self.0),
            None if self.is_success() => write!(f, "success (0x{:08x})", self.0),
            None => write!(f, "unknown status (0x{:08x})", self.0),
        }
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "Status({}, 0x{:08x})", name, self.0),
            None => write!(f, "Status(0x{:08x})", self.0),
        }
    }
}
