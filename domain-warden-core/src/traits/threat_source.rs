//! Reputation lookup abstraction

use async_trait::async_trait;

use crate::types::{CheckOutcome, ThreatService};

/// A reputation service client. Quota and pacing are applied by the caller.
#[async_trait]
pub trait ThreatSource: Send + Sync {
    fn service(&self) -> ThreatService;

    /// Look up `fqdn`. Transport and API failures become `Failed` outcomes.
    async fn lookup(&self, fqdn: &str) -> CheckOutcome;
}
