//! Scan result type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::DomainId;

/// Which check produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    Dns,
    Http,
    Ssl,
    SafeBrowsing,
    VirusTotal,
}

impl CheckType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dns => "dns",
            Self::Http => "http",
            Self::Ssl => "ssl",
            Self::SafeBrowsing => "safe_browsing",
            Self::VirusTotal => "virus_total",
        }
    }
}

/// Outcome class of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Success,
    Failed,
    ThreatDetected,
    /// The reputation service has never seen the domain.
    NotFound,
    /// Skipped before any network I/O because the daily quota is spent.
    QuotaExceeded,
}

/// One Safe Browsing match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatMatch {
    pub threat_type: String,
    pub platform_type: String,
    pub url: String,
}

/// VirusTotal `last_analysis_stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    #[serde(default)]
    pub malicious: u32,
    #[serde(default)]
    pub suspicious: u32,
    #[serde(default)]
    pub harmless: u32,
    #[serde(default)]
    pub undetected: u32,
}

/// Check-specific payload stored alongside a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanDetails {
    Dns {
        addresses: Vec<String>,
    },
    Http {
        status_code: u16,
    },
    Tls {
        not_before: DateTime<Utc>,
        not_after: DateTime<Utc>,
        valid: bool,
    },
    SafeBrowsing {
        matches: Vec<ThreatMatch>,
    },
    VirusTotal {
        stats: AnalysisStats,
    },
}

/// What a single check reported, before it is attached to a domain and time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    pub check_type: CheckType,
    pub status: CheckStatus,
    pub latency_ms: Option<u64>,
    pub error_message: Option<String>,
    pub details: Option<ScanDetails>,
}

impl CheckOutcome {
    pub fn new(check_type: CheckType, status: CheckStatus) -> Self {
        Self {
            check_type,
            status,
            latency_ms: None,
            error_message: None,
            details: None,
        }
    }

    pub fn success(check_type: CheckType) -> Self {
        Self::new(check_type, CheckStatus::Success)
    }

    pub fn failed(check_type: CheckType, error: impl Into<String>) -> Self {
        Self::new(check_type, CheckStatus::Failed).with_error(error)
    }

    #[must_use]
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error_message = Some(error.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: ScanDetails) -> Self {
        self.details = Some(details);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == CheckStatus::Success
    }

    pub fn is_threat(&self) -> bool {
        self.status == CheckStatus::ThreatDetected
    }
}

/// A persisted check result: one row per `(domain_id, check_type, scanned_at)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    /// Assigned by the store; `0` before insertion.
    pub id: i64,
    pub domain_id: DomainId,
    pub check_type: CheckType,
    pub status: CheckStatus,
    pub latency_ms: Option<u64>,
    pub error_message: Option<String>,
    pub details: Option<ScanDetails>,
    pub scanned_at: DateTime<Utc>,
}

impl ScanResult {
    pub fn from_outcome(domain_id: DomainId, outcome: &CheckOutcome, scanned_at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            domain_id,
            check_type: outcome.check_type,
            status: outcome.status,
            latency_ms: outcome.latency_ms,
            error_message: outcome.error_message.clone(),
            details: outcome.details.clone(),
            scanned_at,
        }
    }
}
