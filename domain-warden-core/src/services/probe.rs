//! [`Prober`] backed by the toolbox network probes.

use std::time::Duration;

use async_trait::async_trait;

use domain_warden_toolbox::{ProbeOptions, ProbeService};

use crate::traits::Prober;
use crate::types::{CheckOutcome, CheckStatus, CheckType, ScanDetails};

/// Probes the network for real.
pub struct NetworkProber {
    probes: ProbeService,
}

impl NetworkProber {
    pub fn new(options: ProbeOptions) -> Self {
        Self {
            probes: ProbeService::new(options),
        }
    }

    /// Every probe deadline set to `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(ProbeOptions::uniform(timeout))
    }
}

#[async_trait]
impl Prober for NetworkProber {
    async fn check_dns(&self, fqdn: &str) -> CheckOutcome {
        match self.probes.probe_dns(fqdn).await {
            Ok(result) => {
                let status = if result.resolved {
                    CheckStatus::Success
                } else {
                    CheckStatus::Failed
                };
                let mut outcome = CheckOutcome::new(CheckType::Dns, status)
                    .with_latency(result.latency_ms)
                    .with_details(ScanDetails::Dns {
                        addresses: result.addresses,
                    });
                outcome.error_message = result.error;
                outcome
            }
            Err(e) => CheckOutcome::failed(CheckType::Dns, e.to_string()),
        }
    }

    async fn check_http(&self, fqdn: &str) -> CheckOutcome {
        match self.probes.probe_http(fqdn).await {
            Ok(result) => match result.status_code {
                Some(status_code) => CheckOutcome::success(CheckType::Http)
                    .with_latency(result.latency_ms)
                    .with_details(ScanDetails::Http { status_code }),
                None => CheckOutcome::failed(
                    CheckType::Http,
                    result.error.unwrap_or_else(|| "No response".to_string()),
                )
                .with_latency(result.latency_ms),
            },
            Err(e) => CheckOutcome::failed(CheckType::Http, e.to_string()),
        }
    }

    async fn check_tls(&self, fqdn: &str) -> CheckOutcome {
        match self.probes.probe_tls(fqdn).await {
            Ok(result) => match result.certificate {
                Some(cert) => {
                    let mut outcome = CheckOutcome::success(CheckType::Ssl)
                        .with_latency(result.latency_ms)
                        .with_details(ScanDetails::Tls {
                            not_before: cert.not_before,
                            not_after: cert.not_after,
                            valid: cert.is_valid,
                        });
                    if !cert.is_valid {
                        outcome.error_message = Some(format!(
                            "Certificate outside its validity window (not_after {})",
                            cert.not_after
                        ));
                    }
                    outcome
                }
                None => CheckOutcome::failed(
                    CheckType::Ssl,
                    result.error.unwrap_or_else(|| "No certificate".to_string()),
                )
                .with_latency(result.latency_ms),
            },
            Err(e) => CheckOutcome::failed(CheckType::Ssl, e.to_string()),
        }
    }
}
