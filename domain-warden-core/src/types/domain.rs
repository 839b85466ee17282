//! Domain and pending-domain type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use domain_warden_provider::{ensure_trailing_dot, relative_to_full_name};

/// Primary key of a [`Domain`].
pub type DomainId = i64;

/// Primary key of a [`PendingDomain`].
pub type PendingDomainId = i64;

/// Serving status of a registered domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DomainStatus {
    #[default]
    Active,
    Suspended,
}

/// Why a domain was suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspendReason {
    /// A reputation service reported the domain as malicious.
    Threat,
    /// The domain stayed unreachable past the grace period.
    Downtime,
    /// An operator suspended it by hand.
    Manual,
}

impl SuspendReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Threat => "threat",
            Self::Downtime => "downtime",
            Self::Manual => "manual",
        }
    }
}

/// Where a domain's records are served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NameserverMode {
    /// Names inside the platform's parent zone.
    #[default]
    Shared,
    /// An independent zone served by the domain's own nameservers.
    Delegated,
}

/// A registered subdomain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: DomainId,
    /// FQDN without trailing dot, e.g. `shop.example.net`.
    pub full_domain: String,
    /// Platform zone the domain is carved from, e.g. `example.net`.
    pub parent_zone: String,
    pub status: DomainStatus,
    pub suspend_reason: Option<SuspendReason>,
    /// Start of the current continuous outage.
    pub first_failed_at: Option<DateTime<Utc>>,
    pub nameserver_mode: NameserverMode,
    pub nameservers: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// `true` when no active record is waiting for a zone push.
    pub dns_synced: bool,
    /// Outage day of the last deletion warning sent.
    pub last_deletion_warning_day: Option<i64>,
    /// Tombstone.
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Domain {
    /// An active, shared-mode domain with no history.
    pub fn new(
        id: DomainId,
        full_domain: impl Into<String>,
        parent_zone: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            full_domain: full_domain.into(),
            parent_zone: parent_zone.into(),
            status: DomainStatus::Active,
            suspend_reason: None,
            first_failed_at: None,
            nameserver_mode: NameserverMode::Shared,
            nameservers: Vec::new(),
            expires_at: None,
            dns_synced: true,
            last_deletion_warning_day: None,
            deleted_at: None,
            created_at,
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.status == DomainStatus::Suspended
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// FQDN of a record name relative to this domain (`"@"` is the apex), dot-terminated.
    pub fn record_fqdn(&self, name: &str) -> String {
        ensure_trailing_dot(&relative_to_full_name(name, &self.full_domain))
    }

    /// The domain's own FQDN, dot-terminated.
    pub fn fqdn(&self) -> String {
        ensure_trailing_dot(&self.full_domain)
    }

    /// Zone that is authoritative for the domain's records.
    pub fn authoritative_zone(&self) -> String {
        match self.nameserver_mode {
            NameserverMode::Delegated => self.fqdn(),
            NameserverMode::Shared => ensure_trailing_dot(&self.parent_zone),
        }
    }
}

/// Reservation state of a not-yet-activated domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PendingStatus {
    #[default]
    Pending,
    Unhealthy,
}

/// A reserved domain awaiting activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDomain {
    pub id: PendingDomainId,
    pub full_domain: String,
    pub status: PendingStatus,
    pub first_failed_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_deletion_warning_day: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl PendingDomain {
    pub fn new(id: PendingDomainId, full_domain: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            full_domain: full_domain.into(),
            status: PendingStatus::Pending,
            first_failed_at: None,
            expires_at: None,
            last_deletion_warning_day: None,
            created_at,
        }
    }
}

/// Audit entry written whenever the engine suspends a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspensionRecord {
    pub domain_id: DomainId,
    pub reason: SuspendReason,
    pub details: String,
    pub created_at: DateTime<Utc>,
}
