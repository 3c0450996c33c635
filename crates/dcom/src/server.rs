//! Server-side object table
//!
//! An [`ObjectExporter`] hands out IPIDs for the interfaces it serves and
//! resolves the object UUID of each incoming ORPC call back to the
//! implementation. Interface handlers look their object up through
//! [`ObjectExporter::resolve`].

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use msrpc::CallContext;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::types::{
    DcomError, DualStringArray, Iid, InterfacePointer, Ipid, ObjRef, Oid, Oxid, Result, StdObjRef,
};

/// One exported interface of one object
struct IpidEntry {
    oid: Oid,
    iid: Iid,
    object: Box<dyn Any + Send + Sync>,
}

/// Table of the objects exported by one object exporter
pub struct ObjectExporter {
    oxid: Oxid,
    bindings: DualStringArray,
    ipids: RwLock<HashMap<Ipid, IpidEntry>>,
    /// Calls rejected because their IPID was unknown
    rejected: AtomicU32,
}

impl ObjectExporter {
    pub fn new(bindings: DualStringArray) -> Self {
        Self {
            oxid: Oxid::generate(),
            bindings,
            ipids: RwLock::new(HashMap::new()),
            rejected: AtomicU32::new(0),
        }
    }

    pub fn oxid(&self) -> Oxid {
        self.oxid
    }

    pub fn bindings(&self) -> &DualStringArray {
        &self.bindings
    }

    /// Number of exported interfaces
    pub fn len(&self) -> usize {
        self.ipids.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ipids.read().is_empty()
    }

    pub fn rejected_calls(&self) -> u32 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Export `object` as interface `iid` of a new object.
    ///
    /// `T` is the handle the interface's handlers look up, typically an
    /// `Arc<dyn Trait>`.
    pub fn export<T: Any + Send + Sync>(&self, iid: Iid, object: T) -> StdObjRef {
        self.export_on(Oid::generate(), iid, object)
    }

    /// Export another interface of an existing object
    pub fn export_on<T: Any + Send + Sync>(&self, oid: Oid, iid: Iid, object: T) -> StdObjRef {
        let ipid = Ipid::generate();
        self.ipids.write().insert(
            ipid,
            IpidEntry {
                oid,
                iid,
                object: Box::new(object),
            },
        );
        info!("Exported {:?} of {:?} as {:?}", iid, oid, ipid);
        StdObjRef::new(self.oxid, oid, ipid, 1)
    }

    /// Marshal the interface behind `ipid` for a client
    pub fn interface_pointer(&self, ipid: &Ipid) -> Result<InterfacePointer> {
        let (oid, iid) = {
            let ipids = self.ipids.read();
            let entry = ipids.get(ipid).ok_or(DcomError::ObjectNotConnected(*ipid))?;
            (entry.oid, entry.iid)
        };
        let std = StdObjRef::new(self.oxid, oid, *ipid, 1);
        InterfacePointer::from_objref(&ObjRef::standard(iid, std, self.bindings.clone()))
    }

    /// Look up the object exported under `ipid`.
    ///
    /// Fails with `NoInterface` when the IPID names a different interface
    /// type than `T`.
    pub fn lookup<T: Any + Clone>(&self, ipid: &Ipid) -> Result<T> {
        let ipids = self.ipids.read();
        let entry = ipids.get(ipid).ok_or(DcomError::ObjectNotConnected(*ipid))?;
        entry
            .object
            .downcast_ref::<T>()
            .cloned()
            .ok_or(DcomError::NoInterface(entry.iid))
    }

    /// Resolve the object addressed by an incoming call
    pub fn resolve<T: Any + Clone>(&self, ctx: &CallContext) -> Result<T> {
        let ipid = Ipid::from(ctx.object.unwrap_or_default());
        match self.lookup(&ipid) {
            Ok(object) => {
                debug!(opnum = ctx.opnum, ?ipid, "object resolved");
                Ok(object)
            }
            Err(e) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(opnum = ctx.opnum, ?ipid, "call rejected: {}", e);
                Err(e)
            }
        }
    }

    /// Stop serving `ipid`; later calls fail as not connected
    pub fn disconnect(&self, ipid: &Ipid) -> bool {
        let removed = self.ipids.write().remove(ipid).is_some();
        if removed {
            info!("Disconnected {:?}", ipid);
        }
        removed
    }
}

impl Default for ObjectExporter {
    fn default() -> Self {
        Self::new(DualStringArray::new())
    }
}
