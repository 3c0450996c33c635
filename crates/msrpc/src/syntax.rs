//! Interface and object identifiers
//!
//! UUIDs travel in NDR as `{ u32, u16, u16, u8[8] }` aligned to 4 bytes,
//! in the byte order of the call.

use std::fmt;
use std::str::FromStr;

use msrpc_ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter};

use crate::error::RpcError;

/// DCE UUID (GUID)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Uuid {
    pub time_low: u32,
    pub time_mid: u16,
    pub time_hi_and_version: u16,
    pub clock_seq_hi_and_reserved: u8,
    pub clock_seq_low: u8,
    pub node: [u8; 6],
}

impl Uuid {
    /// Nil UUID (all zeros)
    pub const NIL: Self = Self {
        time_low: 0,
        time_mid: 0,
        time_hi_and_version: 0,
        clock_seq_hi_and_reserved: 0,
        clock_seq_low: 0,
        node: [0; 6],
    };

    /// Parse from string format "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx".
    ///
    /// Surrounding braces are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().trim_start_matches('{').trim_end_matches('}');
        if s.len() != 36 {
            return None;
        }
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 5 || parts[3].len() != 4 || parts[4].len() != 12 {
            return None;
        }

        let time_low = u32::from_str_radix(parts[0], 16).ok()?;
        let time_mid = u16::from_str_radix(parts[1], 16).ok()?;
        let time_hi_and_version = u16::from_str_radix(parts[2], 16).ok()?;
        let clock = u16::from_str_radix(parts[3], 16).ok()?;

        let mut node = [0u8; 6];
        for (i, byte) in node.iter_mut().enumerate() {
            *byte = u8::from_str_radix(parts[4].get(i * 2..i * 2 + 2)?, 16).ok()?;
        }

        Some(Self {
            time_low,
            time_mid,
            time_hi_and_version,
            clock_seq_hi_and_reserved: (clock >> 8) as u8,
            clock_seq_low: clock as u8,
            node,
        })
    }

    /// Generate a random (version 4) UUID
    pub fn new_v4() -> Self {
        Self::from_bytes_be(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Build from the canonical big-endian (RFC 4122) byte layout
    pub fn from_bytes_be(b: [u8; 16]) -> Self {
        Self {
            time_low: u32::from_be_bytes([b[0], b[1], b[2], b[3]]),
            time_mid: u16::from_be_bytes([b[4], b[5]]),
            time_hi_and_version: u16::from_be_bytes([b[6], b[7]]),
            clock_seq_hi_and_reserved: b[8],
            clock_seq_low: b[9],
            node: [b[10], b[11], b[12], b[13], b[14], b[15]],
        }
    }

    /// Encode UUID to 16 bytes in little-endian (GUID) format
    pub fn to_bytes_le(&self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[0..4].copy_from_slice(&self.time_low.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.time_mid.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.time_hi_and_version.to_le_bytes());
        bytes[8] = self.clock_seq_hi_and_reserved;
        bytes[9] = self.clock_seq_low;
        bytes[10..16].copy_from_slice(&self.node);
        bytes
    }

    /// Decode UUID from 16 bytes in little-endian (GUID) format
    pub fn from_bytes_le(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 16 {
            return None;
        }
        Some(Self {
            time_low: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            time_mid: u16::from_le_bytes([bytes[4], bytes[5]]),
            time_hi_and_version: u16::from_le_bytes([bytes[6], bytes[7]]),
            clock_seq_hi_and_reserved: bytes[8],
            clock_seq_low: bytes[9],
            node: [bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]],
        })
    }

    pub fn is_nil(&self) -> bool {
        *self == Self::NIL
    }
}

impl FromStr for Uuid {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| RpcError::InvalidUuid(s.to_string()))
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.time_low,
            self.time_mid,
            self.time_hi_and_version,
            self.clock_seq_hi_and_reserved,
            self.clock_seq_low,
            self.node[0],
            self.node[1],
            self.node[2],
            self.node[3],
            self.node[4],
            self.node[5]
        )
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uuid({})", self)
    }
}

impl NdrEncode for Uuid {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> {
        w.write_u32(self.time_low);
        w.write_u16(self.time_mid);
        w.write_u16(self.time_hi_and_version);
        w.write_u8(self.clock_seq_hi_and_reserved);
        w.write_u8(self.clock_seq_low);
        w.write_bytes(&self.node);
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for Uuid {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> {
        self.time_low = r.read_u32()?;
        self.time_mid = r.read_u16()?;
        self.time_hi_and_version = r.read_u16()?;
        self.clock_seq_hi_and_reserved = r.read_u8()?;
        self.clock_seq_low = r.read_u8()?;
        self.node.copy_from_slice(&r.read_bytes(6)?);
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

/// Syntax ID - interface UUID with version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyntaxId {
    pub uuid: Uuid,
    pub version: u32, // major in lower 16 bits, minor in upper 16 bits
}

impl SyntaxId {
    pub fn new(uuid: Uuid, major: u16, minor: u16) -> Self {
        Self {
            uuid,
            version: (major as u32) | ((minor as u32) << 16),
        }
    }

    /// Parse the interface UUID from its string form
    pub fn parse(uuid: &str, major: u16, minor: u16) -> Option<Self> {
        Uuid::parse(uuid).map(|uuid| Self::new(uuid, major, minor))
    }

    pub fn major_version(&self) -> u16 {
        self.version as u16
    }

    pub fn minor_version(&self) -> u16 {
        (self.version >> 16) as u16
    }
}

impl fmt::Display for SyntaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}.{}", self.uuid, self.major_version(), self.minor_version())
    }
}

/// NDR Transfer Syntax UUID
pub const NDR_SYNTAX_UUID: &str = "8a885d04-1ceb-11c9-9fe8-08002b104860";
pub const NDR_SYNTAX_VERSION: u32 = 2;
