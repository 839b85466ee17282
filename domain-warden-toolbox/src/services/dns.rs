//! DNS resolution probe

use std::time::{Duration, Instant};

use log::debug;
use tokio::time::timeout;

use super::resolver::DEFAULT_RESOLVER;
use crate::types::DnsProbeResult;

/// Resolve `domain` (already validated) to its A/AAAA addresses.
pub(super) async fn probe(domain: &str, deadline: Duration) -> DnsProbeResult {
    let start = Instant::now();
    // Absolute name so resolv.conf search domains are never appended.
    let fqdn = format!("{domain}.");

    let (addresses, error) = match timeout(deadline, DEFAULT_RESOLVER.lookup_ip(fqdn.as_str())).await
    {
        Ok(Ok(lookup)) => {
            let addresses: Vec<String> = lookup.iter().map(|ip| ip.to_string()).collect();
            if addresses.is_empty() {
                (addresses, Some("No addresses returned".to_string()))
            } else {
                (addresses, None)
            }
        }
        Ok(Err(e)) => (Vec::new(), Some(format!("DNS lookup failed: {e}"))),
        Err(_) => (
            Vec::new(),
            Some(format!("DNS lookup timed out ({}s)", deadline.as_secs())),
        ),
    };

    let latency_ms = elapsed_ms(start);
    debug!(
        "[DNS] {domain}: {} address(es) in {latency_ms}ms",
        addresses.len()
    );

    DnsProbeResult {
        domain: domain.to_string(),
        resolved: !addresses.is_empty(),
        addresses,
        latency_ms,
        error,
    }
}

/// Milliseconds since `start`, saturating.
pub(super) fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reserved_tld_does_not_resolve() {
        let result = probe("nonexistent.invalid", Duration::from_secs(5)).await;
        assert!(!result.resolved);
        assert!(result.addresses.is_empty());
        assert!(result.error.is_some());
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn public_domain_resolves() {
        let result = probe("example.com", Duration::from_secs(10)).await;
        assert!(result.resolved, "{result:?}");
    }
}
