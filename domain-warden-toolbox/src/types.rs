//! Public types returned by probes.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timeouts applied by [`ProbeService`](crate::ProbeService).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOptions {
    /// DNS lookup deadline.
    pub dns_timeout: Duration,
    /// Whole HTTP request deadline, including connect.
    pub http_timeout: Duration,
    /// TCP connect deadline for the TLS probe.
    pub connect_timeout: Duration,
    /// TLS handshake deadline.
    pub tls_timeout: Duration,
    /// Port used for the TLS probe.
    pub tls_port: u16,
}

impl ProbeOptions {
    /// Every deadline set to `timeout`, port 443.
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            dns_timeout: timeout,
            http_timeout: timeout,
            connect_timeout: timeout,
            tls_timeout: timeout,
            tls_port: 443,
        }
    }
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self::uniform(Duration::from_secs(10))
    }
}

/// Result of resolving a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsProbeResult {
    pub domain: String,
    /// `true` when at least one address came back.
    pub resolved: bool,
    pub addresses: Vec<String>,
    pub latency_ms: u64,
    pub error: Option<String>,
}

/// Result of a plain-HTTP GET.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpProbeResult {
    pub domain: String,
    /// Status of the first response; `None` on transport failure.
    pub status_code: Option<u16>,
    pub latency_ms: u64,
    pub error: Option<String>,
}

impl HttpProbeResult {
    /// Any HTTP response at all, whatever its status, counts as reachable.
    pub fn is_reachable(&self) -> bool {
        self.status_code.is_some()
    }
}

/// Leaf certificate facts extracted after the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafCertificate {
    pub subject: String,
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    /// `now` within `[not_before, not_after]` at probe time.
    pub is_valid: bool,
}

/// Result of a TLS handshake with certificate verification disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsProbeResult {
    pub domain: String,
    pub port: u16,
    pub certificate: Option<LeafCertificate>,
    pub latency_ms: u64,
    pub error: Option<String>,
}
