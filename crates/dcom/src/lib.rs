//! DCOM ORPC extension over MSRPC
//!
//! DCOM calls are ordinary MSRPC calls with two additions: the request's
//! object UUID names the target interface pointer (IPID), and every request
//! and response starts with a causality header (ORPCTHIS / ORPCTHAT).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  IDispatch client/server    │  OLE automation (SAFEARRAY)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ObjectClient (IPID, causality)  │  ObjectExporter (IPIDs)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ORPCTHIS/ORPCTHAT  │  OBJREF / MInterfacePointer           │
//! ├─────────────────────────────────────────────────────────────┤
//! │         msrpc (operations, bind, dispatch)                  │
//! │         msrpc-ndr (NDR20 codec)                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Concepts
//!
//! - **OXID**: Object Exporter ID, identifies the exporting apartment
//! - **OID**: Object ID within an exporter
//! - **IPID**: Interface Pointer ID, addresses one interface of one object
//! - **Superclass**: a derived interface's client embeds its base client,
//!   which calls on the same context and IPID
//!
//! # Modules
//!
//! - [`types`]: identifiers, ORPC headers and object references
//! - [`client`]: the ORPC object client
//! - [`server`]: the IPID object table
//! - [`dispatch`]: IDispatch
//! - [`oaut`]: OLE automation types

pub mod client;
pub mod dispatch;
pub mod oaut;
pub mod server;
pub mod types;

pub use client::{ObjectClient, ObjectIdentity, OrpcOperation};
pub use dispatch::{dispatch_interface, Dispatch, DispatchClient};
pub use oaut::SafeArray;
pub use server::ObjectExporter;
pub use types::{
    Causality, ComVersion, DcomError, DualStringArray, Iid, InterfacePointer, Ipid, ObjRef, Oid,
    OrpcExtent, OrpcExtentArray, OrpcThat, OrpcThis, Oxid, Result, StdObjRef, StringBinding,
};

/// DCOM version supported by this implementation
pub const DCOM_VERSION: ComVersion = ComVersion::DCOM_5_7;
