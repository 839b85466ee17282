//! Engine configuration types
//!
//! Every struct deserializes with defaults so a config file only needs the keys it
//! changes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Periodic scan driver settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Seconds between scan cycles.
    pub interval_secs: u64,
    /// Domains per batch.
    pub batch_size: usize,
    /// Pause between batches.
    pub batch_pause_secs: u64,
    /// Deadline for each local probe.
    pub check_timeout_secs: u64,
    /// Upper bound on concurrent detached reconciliations.
    pub max_concurrent_reconciles: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            batch_size: 50,
            batch_pause_secs: 5,
            check_timeout_secs: 10,
            max_concurrent_reconciles: 8,
        }
    }
}

impl ScannerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn batch_pause(&self) -> Duration {
        Duration::from_secs(self.batch_pause_secs)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs.max(1))
    }
}

/// Google Safe Browsing v4 lookup API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeBrowsingConfig {
    pub api_key: String,
    pub endpoint: String,
    pub client_id: String,
    pub client_version: String,
    pub daily_limit: u32,
    /// Minimum gap between two calls.
    pub min_interval_ms: u64,
    pub timeout_secs: u64,
}

impl Default for SafeBrowsingConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://safebrowsing.googleapis.com/v4/threatMatches:find".to_string(),
            client_id: "domain-warden".to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            daily_limit: 10_000,
            min_interval_ms: 1_000,
            timeout_secs: 15,
        }
    }
}

/// VirusTotal v3 domain report API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirusTotalConfig {
    pub api_key: String,
    pub base_url: String,
    pub daily_limit: u32,
    pub min_interval_ms: u64,
    pub timeout_secs: u64,
}

impl Default for VirusTotalConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://www.virustotal.com/api/v3".to_string(),
            daily_limit: 500,
            min_interval_ms: 15_000,
            timeout_secs: 15,
        }
    }
}

/// Reputation services; a missing section or an empty key disables the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreatIntelConfig {
    pub safe_browsing: Option<SafeBrowsingConfig>,
    pub virus_total: Option<VirusTotalConfig>,
}

/// Grace periods of the downtime lifecycle, in whole days since the first failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecyclePolicy {
    pub suspend_after_days: i64,
    pub delete_after_days: i64,
    /// Outage days on which a suspended domain gets a deletion warning.
    pub warning_days: Vec<i64>,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            suspend_after_days: 7,
            delete_after_days: 30,
            warning_days: vec![25, 28],
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let scanner: ScannerConfig = serde_json::from_str(r#"{"batch_size": 10}"#).unwrap();
        assert_eq!(scanner.batch_size, 10);
        assert_eq!(scanner.interval_secs, 3600);

        let vt: VirusTotalConfig = serde_json::from_str(r#"{"api_key": "k"}"#).unwrap();
        assert_eq!(vt.daily_limit, 500);
        assert_eq!(vt.min_interval_ms, 15_000);
    }

    #[test]
    fn lifecycle_defaults() {
        let policy = LifecyclePolicy::default();
        assert_eq!(policy.suspend_after_days, 7);
        assert_eq!(policy.delete_after_days, 30);
        assert_eq!(policy.warning_days, vec![25, 28]);
    }
}
