//! String binding and dual string array types (MS-DCOM 2.2.19)
//!
//! A DUALSTRINGARRAY carries the resolver addresses of an object exporter
//! inside an OBJREF. It is a flat array of 16-bit words: string bindings
//! first, then security bindings, each section closed by a zero word.

use std::fmt;

use msrpc_ndr::{NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, Result};

/// Protocol tower identifiers
pub mod protocol_id {
    /// TCP/IP protocol
    pub const NCACN_IP_TCP: u16 = 0x07;
    /// Named pipes protocol
    pub const NCACN_NP: u16 = 0x0F;
    /// Local RPC
    pub const NCALRPC: u16 = 0x10;
    /// HTTP protocol
    pub const NCACN_HTTP: u16 = 0x1F;
}

/// String binding (MS-DCOM 2.2.19.3)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringBinding {
    /// Tower ID (protocol sequence)
    pub tower_id: u16,
    pub network_addr: String,
}

impl StringBinding {
    pub fn new(tower_id: u16, network_addr: impl Into<String>) -> Self {
        Self {
            tower_id,
            network_addr: network_addr.into(),
        }
    }

    /// Create a TCP/IP binding
    pub fn tcp(addr: &str) -> Self {
        Self::new(protocol_id::NCACN_IP_TCP, addr)
    }

    fn push_words(&self, words: &mut Vec<u16>) {
        words.push(self.tower_id);
        words.extend(self.network_addr.encode_utf16());
        words.push(0);
    }
}

impl fmt::Display for StringBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let proto = match self.tower_id {
            protocol_id::NCACN_IP_TCP => "ncacn_ip_tcp",
            protocol_id::NCACN_NP => "ncacn_np",
            protocol_id::NCACN_HTTP => "ncacn_http",
            protocol_id::NCALRPC => "ncalrpc",
            _ => "unknown",
        };
        write!(f, "{}:{}", proto, self.network_addr)
    }
}

/// Security binding (MS-DCOM 2.2.19.4)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecurityBinding {
    /// Authentication service (NTLM, Kerberos, etc.)
    pub authn_svc: u16,
    /// Authorization service, `0xffff` when unspecified
    pub authz_svc: u16,
    pub principal_name: String,
}

impl SecurityBinding {
    pub fn new(authn_svc: u16, authz_svc: u16, principal_name: impl Into<String>) -> Self {
        Self {
            authn_svc,
            authz_svc,
            principal_name: principal_name.into(),
        }
    }

    fn push_words(&self, words: &mut Vec<u16>) {
        words.push(self.authn_svc);
        words.push(self.authz_svc);
        words.extend(self.principal_name.encode_utf16());
        words.push(0);
    }
}

/// DUALSTRINGARRAY (MS-DCOM 2.2.19.2)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DualStringArray {
    pub string_bindings: Vec<StringBinding>,
    pub security_bindings: Vec<SecurityBinding>,
}

impl DualStringArray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Array holding one TCP binding and no security bindings
    pub fn with_tcp_binding(addr: &str) -> Self {
        Self {
            string_bindings: vec![StringBinding::tcp(addr)],
            security_bindings: Vec::new(),
        }
    }

    /// Flatten to `(wSecurityOffset, aStringArray)`
    fn to_words(&self) -> (u16, Vec<u16>) {
        let mut words = Vec::new();
        for binding in &self.string_bindings {
            binding.push_words(&mut words);
        }
        if self.string_bindings.is_empty() {
            words.push(0);
        }
        words.push(0);
        let security_offset = words.len() as u16;
        for binding in &self.security_bindings {
            binding.push_words(&mut words);
        }
        if self.security_bindings.is_empty() {
            words.push(0);
        }
        words.push(0);
        (security_offset, words)
    }

    fn from_words(words: &[u16], security_offset: usize) -> Result<Self> {
        let (strings, security) = words.split_at(security_offset);
        let mut string_bindings = Vec::new();
        for entry in entries(strings) {
            let (&tower_id, addr) = entry.split_first().unwrap_or((&0, &[][..]));
            string_bindings.push(StringBinding::new(tower_id, utf16(addr)?));
        }
        let mut security_bindings = Vec::new();
        let mut rest = security;
        while let [authn_svc, authz_svc, tail @ ..] = rest {
            if *authn_svc == 0 {
                break;
            }
            let end = tail
                .iter()
                .position(|&w| w == 0)
                .ok_or_else(|| NdrError::InvalidString("unterminated principal name".into()))?;
            security_bindings.push(SecurityBinding::new(*authn_svc, *authz_svc, utf16(&tail[..end])?));
            rest = &tail[end + 1..];
        }
        Ok(Self {
            string_bindings,
            security_bindings,
        })
    }
}

/// Zero-terminated string bindings, stopping at the empty entry
fn entries(section: &[u16]) -> impl Iterator<Item = &[u16]> {
    section
        .split(|&w| w == 0)
        .take_while(|entry| !entry.is_empty())
}

fn utf16(words: &[u16]) -> Result<String> {
    char::decode_utf16(words.iter().copied())
        .collect::<std::result::Result<String, _>>()
        .map_err(NdrError::from)
}

impl NdrEncode for DualStringArray {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        let (security_offset, words) = self.to_words();
        let count = u16::try_from(words.len())
            .map_err(|_| NdrError::IntegerOverflow("wNumEntries"))?;
        w.write_u16(count);
        w.write_u16(security_offset);
        for word in words {
            w.write_u16(word);
        }
        Ok(())
    }

    fn ndr_align() -> usize {
        2
    }
}

impl NdrDecode for DualStringArray {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        let count = r.read_u16()? as usize;
        let security_offset = r.read_u16()? as usize;
        if security_offset > count {
            return Err(NdrError::InvalidString(format!(
                "security offset {} past {} entries",
                security_offset, count
            )));
        }
        let count = r.check_count(count, 2)?;
        let mut words = Vec::with_capacity(count);
        for _ in 0..count {
            words.push(r.read_u16()?);
        }
        *self = Self::from_words(&words, security_offset)?;
        Ok(())
    }

    fn ndr_align() -> usize {
        2
    }
}
