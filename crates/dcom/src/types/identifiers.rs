//! DCOM identifier types (MS-DCOM 2.2.18)
//!
//! These are the core identifiers used throughout DCOM:
//! - OXID: Object Exporter Identifier
//! - OID: Object Identifier
//! - IPID: Interface Pointer Identifier
//! - CID: Causality Identifier
//! - IID/CLSID: interface and class identifiers

use std::fmt;

use msrpc::Uuid;
use msrpc_ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter, Result};

macro_rules! u64_id {
    ($(#[$meta:meta])* $name:ident, $label:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub u64);

        impl $name {
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Generate a random identifier
            pub fn generate() -> Self {
                let bytes = *uuid::Uuid::new_v4().as_bytes();
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&bytes[..8]);
                Self(u64::from_le_bytes(raw))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({:016x})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:016x}", self.0)
            }
        }

        impl NdrEncode for $name {
            fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
                w.write_u64(self.0);
                Ok(())
            }

            fn ndr_align() -> usize {
                8
            }
        }

        impl NdrDecode for $name {
            fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
                self.0 = r.read_u64()?;
                Ok(())
            }

            fn ndr_align() -> usize {
                8
            }
        }
    };
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $label:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Generate a random identifier
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn nil() -> Self {
                Self(Uuid::NIL)
            }

            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }

            /// Get the underlying UUID
            pub fn uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl NdrEncode for $name {
            fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
                self.0.ndr_encode(w)
            }

            fn ndr_align() -> usize {
                4
            }
        }

        impl NdrDecode for $name {
            fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
                self.0.ndr_decode(r)
            }

            fn ndr_align() -> usize {
                4
            }
        }
    };
}

u64_id!(
    /// Object Exporter Identifier (8 bytes)
    ///
    /// Identifies the object exporter (apartment) that hosts an object.
    Oxid,
    "OXID"
);

u64_id!(
    /// Object Identifier (8 bytes)
    ///
    /// Identifies a COM object within an object exporter.
    Oid,
    "OID"
);

uuid_id!(
    /// Interface Pointer Identifier
    ///
    /// Names one interface on one object. Clients send it as the object
    /// UUID of every ORPC request.
    Ipid,
    "IPID"
);

uuid_id!(
    /// Causality identifier carried in ORPCTHIS
    ///
    /// Calls made on behalf of one logical chain share a causality id.
    Causality,
    "CID"
);

uuid_id!(Iid, "IID");

uuid_id!(Clsid, "CLSID");
