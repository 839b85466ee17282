//! Local reachability checks

use async_trait::async_trait;

use crate::types::CheckOutcome;

/// Runs the DNS, HTTP and TLS checks for a FQDN.
///
/// Failures are reported in the returned outcome, never as errors.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn check_dns(&self, fqdn: &str) -> CheckOutcome;

    async fn check_http(&self, fqdn: &str) -> CheckOutcome;

    async fn check_tls(&self, fqdn: &str) -> CheckOutcome;
}
