//! Health summary type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::DomainId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DnsHealth {
    Resolved,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HttpHealth {
    Online,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SslHealth {
    Valid,
    Invalid,
    /// No TLS result this cycle.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafeBrowsingVerdict {
    Safe,
    Unsafe,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VirusTotalVerdict {
    Clean,
    Malicious,
    Suspicious,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallHealth {
    Healthy,
    Degraded,
    Down,
}

/// Latest normalized health of a domain; exactly one per domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
    pub domain_id: DomainId,
    pub dns: DnsHealth,
    pub http: HttpHealth,
    pub ssl: SslHealth,
    pub safe_browsing: SafeBrowsingVerdict,
    pub virus_total: VirusTotalVerdict,
    pub http_status_code: Option<u16>,
    pub response_time_ms: Option<u64>,
    pub ssl_expires_at: Option<DateTime<Utc>>,
    pub overall_health: OverallHealth,
    pub total_scans: u64,
    pub successful_scans: u64,
    pub last_scanned_at: DateTime<Utc>,
}

impl HealthSummary {
    /// DNS failed or HTTP offline.
    pub fn is_down(&self) -> bool {
        self.dns == DnsHealth::Failed || self.http == HttpHealth::Offline
    }

    /// Human-readable list of the failing checks.
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.dns == DnsHealth::Failed {
            issues.push("DNS resolution failed".to_string());
        }
        if self.http == HttpHealth::Offline {
            issues.push("HTTP unreachable".to_string());
        }
        if self.ssl == SslHealth::Invalid {
            issues.push("SSL certificate invalid".to_string());
        }
        if self.safe_browsing == SafeBrowsingVerdict::Unsafe {
            issues.push("Flagged by Google Safe Browsing".to_string());
        }
        match self.virus_total {
            VirusTotalVerdict::Malicious => issues.push("Flagged as malicious by VirusTotal".to_string()),
            VirusTotalVerdict::Suspicious => issues.push("Flagged as suspicious by VirusTotal".to_string()),
            VirusTotalVerdict::Clean | VirusTotalVerdict::Unknown => {}
        }
        issues
    }
}

/// Summary plus uptime derived from the scan counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    #[serde(flatten)]
    pub summary: HealthSummary,
    /// `successful_scans / total_scans * 100`, `0.0` before the first scan.
    pub uptime_percentage: f64,
}

impl HealthReport {
    pub fn from_summary(summary: HealthSummary) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let uptime_percentage = if summary.total_scans == 0 {
            0.0
        } else {
            summary.successful_scans as f64 / summary.total_scans as f64 * 100.0
        };
        Self {
            summary,
            uptime_percentage,
        }
    }
}
