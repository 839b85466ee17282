//! Probe façade.

mod dns;
mod http;
mod resolver;
#[cfg(feature = "rustls")]
mod tls;

use reqwest::Client;

use crate::error::{ToolboxError, ToolboxResult};
use crate::types::{DnsProbeResult, HttpProbeResult, ProbeOptions, TlsProbeResult};

/// Validate and normalise a domain name.
///
/// Trims whitespace and a trailing dot, converts internationalised names to ASCII
/// via IDNA 2008, and rejects IP literals, empty, and overlong input.
pub fn validate_domain(domain: &str) -> ToolboxResult<String> {
    let domain = domain.trim().trim_end_matches('.');
    if domain.is_empty() {
        return Err(ToolboxError::ValidationError(
            "Domain name is required".to_string(),
        ));
    }
    if domain.parse::<std::net::IpAddr>().is_ok() {
        return Err(ToolboxError::ValidationError(format!(
            "Expected a domain name, got an IP address: {domain}"
        )));
    }
    let ascii_domain = idna::domain_to_ascii_strict(domain)
        .map_err(|_| ToolboxError::ValidationError(format!("Invalid domain name: {domain}")))?;
    if ascii_domain.len() > 253 {
        return Err(ToolboxError::ValidationError(format!(
            "Domain name exceeds maximum length of 253 characters (got {})",
            ascii_domain.len()
        )));
    }
    Ok(ascii_domain)
}

/// Runs the three reachability probes with a fixed set of timeouts.
///
/// ```rust,no_run
/// use domain_warden_toolbox::{ProbeOptions, ProbeService};
/// # async fn demo() -> domain_warden_toolbox::ToolboxResult<()> {
/// let probes = ProbeService::new(ProbeOptions::default());
/// let dns = probes.probe_dns("example.com").await?;
/// println!("resolved: {}", dns.resolved);
/// # Ok(())
/// # }
/// ```
pub struct ProbeService {
    options: ProbeOptions,
    http_client: Client,
}

impl ProbeService {
    pub fn new(options: ProbeOptions) -> Self {
        Self {
            http_client: http::build_client(options.http_timeout),
            options,
        }
    }

    /// Resolve `domain` to addresses via the system resolver.
    pub async fn probe_dns(&self, domain: &str) -> ToolboxResult<DnsProbeResult> {
        let domain = validate_domain(domain)?;
        Ok(dns::probe(&domain, self.options.dns_timeout).await)
    }

    /// `GET http://{domain}/` without following redirects.
    pub async fn probe_http(&self, domain: &str) -> ToolboxResult<HttpProbeResult> {
        let domain = validate_domain(domain)?;
        let url = format!("http://{domain}/");
        Ok(http::probe(&self.http_client, &domain, &url).await)
    }

    /// TLS handshake on the configured port, reading the leaf certificate.
    pub async fn probe_tls(&self, domain: &str) -> ToolboxResult<TlsProbeResult> {
        let domain = validate_domain(domain)?;
        #[cfg(feature = "rustls")]
        {
            Ok(tls::probe(&domain, &self.options).await)
        }
        #[cfg(not(feature = "rustls"))]
        {
            Ok(TlsProbeResult {
                domain,
                port: self.options.tls_port,
                certificate: None,
                latency_ms: 0,
                error: Some("TLS support is not compiled in".to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_domain_normalises() {
        assert!(matches!(validate_domain(" Example.COM. "), Ok(ref d) if d == "example.com"));
        assert!(matches!(validate_domain("bücher.example"), Ok(ref d) if d == "xn--bcher-kva.example"));
    }

    #[test]
    fn validate_domain_rejects_bad_input() {
        assert!(validate_domain("").is_err());
        assert!(validate_domain("192.0.2.1").is_err());
        assert!(validate_domain("bad..name").is_err());
        assert!(validate_domain(&format!("{}.com", "a".repeat(260))).is_err());
    }
}
