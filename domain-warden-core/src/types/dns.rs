//! DNS record type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use domain_warden_provider::RecordType;

use super::domain::DomainId;

/// Primary key of a [`DnsRecord`].
pub type RecordId = i64;

/// TTL applied when a record is created without one.
pub const DEFAULT_TTL: u32 = 3600;

/// MX preference applied when a record is created without one.
pub const DEFAULT_MX_PRIORITY: u16 = 10;

/// A record owned by a domain, as stored by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsRecord {
    pub id: RecordId,
    pub domain_id: DomainId,
    /// Relative name; `"@"` is the apex.
    pub name: String,
    pub record_type: RecordType,
    /// Content without type-specific decoration (no MX priority, no trailing dot).
    pub content: String,
    pub ttl: u32,
    /// MX preference or SRV priority.
    pub priority: Option<u16>,
    pub active: bool,
    /// The record's RRset was last pushed successfully.
    pub synced: bool,
    pub last_sync_error: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DnsRecord {
    /// The RRset the record belongs to.
    pub fn group_key(&self) -> RecordGroupKey {
        RecordGroupKey {
            domain_id: self.domain_id,
            name: self.name.clone(),
            record_type: self.record_type,
        }
    }
}

/// Identity of an RRset inside a domain: `(domain_id, name, type)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordGroupKey {
    pub domain_id: DomainId,
    pub name: String,
    pub record_type: RecordType,
}

/// A record write from the CRUD layer, before admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDnsRecord {
    pub domain_id: DomainId,
    pub name: String,
    pub record_type: RecordType,
    pub content: String,
    pub ttl: Option<u32>,
    pub priority: Option<u16>,
}

impl NewDnsRecord {
    /// Apply defaults: empty name becomes `"@"`, names are lower-cased, content is
    /// trimmed, TTL defaults to [`DEFAULT_TTL`] and MX priority to
    /// [`DEFAULT_MX_PRIORITY`].
    #[must_use]
    pub fn normalize(mut self) -> Self {
        let name = self.name.trim().trim_end_matches('.').to_ascii_lowercase();
        self.name = if name.is_empty() { "@".to_string() } else { name };
        self.content = self.content.trim().to_string();
        self.ttl = Some(self.ttl.unwrap_or(DEFAULT_TTL));
        if self.record_type == RecordType::Mx && self.priority.is_none() {
            self.priority = Some(DEFAULT_MX_PRIORITY);
        }
        self
    }
}

/// Counters returned by a zone pull.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullSyncStats {
    pub created: u32,
    pub updated: u32,
    pub skipped: u32,
}
