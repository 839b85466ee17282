//! API quota type definitions

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::scan::CheckType;

/// A rate-limited reputation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatService {
    SafeBrowsing,
    VirusTotal,
}

impl ThreatService {
    pub const ALL: [Self; 2] = [Self::SafeBrowsing, Self::VirusTotal];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SafeBrowsing => "safe_browsing",
            Self::VirusTotal => "virus_total",
        }
    }

    /// Check type recorded for results of this service.
    pub fn check_type(self) -> CheckType {
        match self {
            Self::SafeBrowsing => CheckType::SafeBrowsing,
            Self::VirusTotal => CheckType::VirusTotal,
        }
    }
}

/// Persisted daily counter; unique on `(service, date)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiQuota {
    pub service: ThreatService,
    /// UTC day the counter belongs to.
    pub date: NaiveDate,
    pub used_count: u32,
    pub daily_limit: u32,
}

/// Quota snapshot reported to the CRUD layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub service: ThreatService,
    pub used: u32,
    pub limit: u32,
    pub date: NaiveDate,
}

impl QuotaStatus {
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used)
    }
}
