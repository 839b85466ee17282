//! Zone and RRset types shared by every backend.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// DNS record type as carried in RRsets.
///
/// `Other` absorbs types this library does not model (DNSKEY, NAPTR, ...) when
/// reading a zone; it is never written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Mx,
    Txt,
    Ns,
    Srv,
    Caa,
    Soa,
    Ptr,
    #[serde(other)]
    Other,
}

impl RecordType {
    /// Record types a platform user may manage.
    pub const MANAGED: [Self; 8] = [
        Self::A,
        Self::Aaaa,
        Self::Cname,
        Self::Mx,
        Self::Txt,
        Self::Ns,
        Self::Srv,
        Self::Caa,
    ];

    /// Upper-case wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Cname => "CNAME",
            Self::Mx => "MX",
            Self::Txt => "TXT",
            Self::Ns => "NS",
            Self::Srv => "SRV",
            Self::Caa => "CAA",
            Self::Soa => "SOA",
            Self::Ptr => "PTR",
            Self::Other => "OTHER",
        }
    }

    /// Whether the type is one of [`RecordType::MANAGED`].
    pub fn is_managed(self) -> bool {
        Self::MANAGED.contains(&self)
    }

    /// Whether the record content ends in a host name that must be dot-terminated.
    pub fn has_hostname_target(self) -> bool {
        matches!(self, Self::Cname | Self::Ns | Self::Mx)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "AAAA" => Ok(Self::Aaaa),
            "CNAME" => Ok(Self::Cname),
            "MX" => Ok(Self::Mx),
            "TXT" => Ok(Self::Txt),
            "NS" => Ok(Self::Ns),
            "SRV" => Ok(Self::Srv),
            "CAA" => Ok(Self::Caa),
            "SOA" => Ok(Self::Soa),
            "PTR" => Ok(Self::Ptr),
            other => Err(format!("Unsupported record type: {other}")),
        }
    }
}

/// Zone kind accepted by the zone create endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ZoneKind {
    Native,
    #[default]
    Master,
    Slave,
}

/// A single record inside an RRset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub content: String,
    #[serde(default)]
    pub disabled: bool,
}

impl ResourceRecord {
    /// Enabled record with the given content.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            disabled: false,
        }
    }
}

/// An RRset as returned by a zone read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rrset {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub records: Vec<ResourceRecord>,
}

/// A zone with all of its RRsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    #[serde(default)]
    pub kind: Option<ZoneKind>,
    #[serde(default)]
    pub serial: Option<u64>,
    #[serde(default)]
    pub rrsets: Vec<Rrset>,
}

/// Patch operation for one RRset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Replace,
    Delete,
}

/// One entry of a zone PATCH: full replacement or removal of a `(name, type)` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RrsetChange {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    pub changetype: ChangeType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<ResourceRecord>,
}

impl RrsetChange {
    /// Replace the whole set at `name`/`record_type` with `records`.
    pub fn replace(
        name: impl Into<String>,
        record_type: RecordType,
        ttl: u32,
        records: Vec<ResourceRecord>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type,
            ttl: Some(ttl),
            changetype: ChangeType::Replace,
            records,
        }
    }

    /// Remove the whole set at `name`/`record_type`.
    pub fn delete(name: impl Into<String>, record_type: RecordType) -> Self {
        Self {
            name: name.into(),
            record_type,
            ttl: None,
            changetype: ChangeType::Delete,
            records: Vec::new(),
        }
    }
}
