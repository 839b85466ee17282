//! Threat-intel gateway: quota-guarded reputation lookups.

mod quota;
mod safe_browsing;
mod virus_total;

pub use quota::{QuotaExhausted, QuotaTracker};
pub use safe_browsing::SafeBrowsingClient;
pub use virus_total::VirusTotalClient;

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;

use crate::traits::{Clock, QuotaRepository, ThreatSource};
use crate::types::{CheckOutcome, CheckStatus, QuotaStatus, ThreatIntelConfig, ThreatService};

/// A reputation source together with the quota guarding it.
struct Lane {
    source: Arc<dyn ThreatSource>,
    quota: QuotaTracker,
}

/// Routes reputation checks through each service's [`QuotaTracker`].
#[derive(Default)]
pub struct ThreatIntelGateway {
    lanes: Vec<Lane>,
}

impl ThreatIntelGateway {
    /// Gateway with no services; every check returns `None`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source. A later source for the same service replaces the earlier one.
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn ThreatSource>, quota: QuotaTracker) -> Self {
        let service = source.service();
        self.lanes.retain(|lane| lane.source.service() != service);
        self.lanes.push(Lane { source, quota });
        self
    }

    /// Build the gateway from config; services without an API key are left out.
    pub fn from_config(
        config: &ThreatIntelConfig,
        repository: &Arc<dyn QuotaRepository>,
        clock: &Arc<dyn Clock>,
    ) -> Self {
        let mut gateway = Self::new();

        match &config.safe_browsing {
            Some(sb) if !sb.api_key.trim().is_empty() => {
                let quota = QuotaTracker::new(
                    ThreatService::SafeBrowsing,
                    sb.daily_limit,
                    Duration::from_millis(sb.min_interval_ms),
                    Arc::clone(repository),
                    Arc::clone(clock),
                );
                gateway = gateway.with_source(Arc::new(SafeBrowsingClient::new(sb.clone())), quota);
            }
            _ => log::info!("[threat_intel] Safe Browsing not configured, checks disabled"),
        }

        match &config.virus_total {
            Some(vt) if !vt.api_key.trim().is_empty() => {
                let quota = QuotaTracker::new(
                    ThreatService::VirusTotal,
                    vt.daily_limit,
                    Duration::from_millis(vt.min_interval_ms),
                    Arc::clone(repository),
                    Arc::clone(clock),
                );
                gateway = gateway.with_source(Arc::new(VirusTotalClient::new(vt.clone())), quota);
            }
            _ => log::info!("[threat_intel] VirusTotal not configured, checks disabled"),
        }

        gateway
    }

    pub fn is_configured(&self, service: ThreatService) -> bool {
        self.lane(service).is_some()
    }

    /// Reload today's counters; failures are logged and the counters start at 0.
    pub async fn restore_quotas(&self) {
        for lane in &self.lanes {
            if let Err(e) = lane.quota.restore().await {
                log::warn!(
                    "[quota] Failed to restore {} counter: {e}",
                    lane.quota.service().as_str()
                );
            }
        }
    }

    /// Check `fqdn` against `service`.
    ///
    /// `None` when the service is not configured. An exhausted quota yields a
    /// `QuotaExceeded` outcome without touching the network.
    pub async fn check(&self, service: ThreatService, fqdn: &str) -> Option<CheckOutcome> {
        let lane = self.lane(service)?;
        if let Err(exhausted) = lane.quota.acquire().await {
            return Some(
                CheckOutcome::new(service.check_type(), CheckStatus::QuotaExceeded).with_error(
                    format!(
                        "Daily quota exhausted ({}/{})",
                        exhausted.used, exhausted.limit
                    ),
                ),
            );
        }
        Some(lane.source.lookup(fqdn).await)
    }

    /// Today's usage of every configured service.
    pub async fn quota_status(&self) -> Vec<QuotaStatus> {
        let mut statuses = Vec::with_capacity(self.lanes.len());
        for lane in &self.lanes {
            statuses.push(lane.quota.status().await);
        }
        statuses
    }

    fn lane(&self, service: ThreatService) -> Option<&Lane> {
        self.lanes.iter().find(|lane| lane.source.service() == service)
    }
}

/// HTTP client with a whole-request timeout.
fn build_http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .build()
        .unwrap_or_else(|e| {
            log::warn!("[threat_intel] Failed to build HTTP client ({e}), using defaults");
            Client::new()
        })
}

/// Error text for a failed request, stripped of the URL (it can carry the API key).
fn redacted(e: reqwest::Error) -> String {
    e.without_url().to_string()
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
