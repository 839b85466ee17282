//! VirusTotal v3 domain report client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use domain_warden_provider::log_sanitizer::truncate_for_log;

use super::{build_http_client, elapsed_ms, redacted};
use crate::traits::ThreatSource;
use crate::types::{
    AnalysisStats, CheckOutcome, CheckStatus, CheckType, ScanDetails, ThreatService,
    VirusTotalConfig,
};

#[derive(Debug, Deserialize)]
struct DomainReport {
    data: ReportData,
}

#[derive(Debug, Deserialize)]
struct ReportData {
    attributes: ReportAttributes,
}

#[derive(Debug, Deserialize)]
struct ReportAttributes {
    #[serde(default)]
    last_analysis_stats: AnalysisStats,
}

/// VirusTotal domain reputation client.
pub struct VirusTotalClient {
    client: Client,
    config: VirusTotalConfig,
}

impl VirusTotalClient {
    pub fn new(config: VirusTotalConfig) -> Self {
        Self {
            client: build_http_client(Duration::from_secs(config.timeout_secs)),
            config,
        }
    }

    fn failed(message: String, start: Instant) -> CheckOutcome {
        log::warn!("[virustotal] {message}");
        CheckOutcome::failed(CheckType::VirusTotal, message).with_latency(elapsed_ms(start))
    }
}

#[async_trait]
impl ThreatSource for VirusTotalClient {
    fn service(&self) -> ThreatService {
        ThreatService::VirusTotal
    }

    async fn lookup(&self, fqdn: &str) -> CheckOutcome {
        let start = Instant::now();
        let url = format!(
            "{}/domains/{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(fqdn)
        );
        log::debug!("[virustotal] GET {url}");

        let response = match self
            .client
            .get(&url)
            .header("x-apikey", &self.config.api_key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Self::failed(format!("Request failed: {}", redacted(e)), start),
        };

        let status = response.status().as_u16();
        match status {
            200 => {}
            404 => {
                log::debug!("[virustotal] {fqdn} not in dataset");
                return CheckOutcome::new(CheckType::VirusTotal, CheckStatus::NotFound)
                    .with_latency(elapsed_ms(start));
            }
            429 => return Self::failed("rate limit exceeded".to_string(), start),
            _ => {
                let text = response.text().await.unwrap_or_default();
                return Self::failed(format!("HTTP {status}: {}", truncate_for_log(&text)), start);
            }
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                let message = format!("Failed to read response body: {}", redacted(e));
                return Self::failed(message, start);
            }
        };
        let report: DomainReport = match serde_json::from_str(&text) {
            Ok(report) => report,
            Err(e) => {
                log::error!("[virustotal] Raw response: {}", truncate_for_log(&text));
                return Self::failed(format!("JSON parse failed: {e}"), start);
            }
        };

        let stats = report.data.attributes.last_analysis_stats;
        let status = if stats.malicious > 0 {
            log::warn!(
                "[virustotal] {fqdn} flagged by {} engines",
                stats.malicious
            );
            CheckStatus::ThreatDetected
        } else {
            CheckStatus::Success
        };
        CheckOutcome::new(CheckType::VirusTotal, status)
            .with_latency(elapsed_ms(start))
            .with_details(ScanDetails::VirusTotal { stats })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> VirusTotalClient {
        VirusTotalClient::new(VirusTotalConfig {
            api_key: "vt-key".to_string(),
            base_url: format!("{}/api/v3", server.uri()),
            ..VirusTotalConfig::default()
        })
    }

    fn report(malicious: u32, suspicious: u32) -> serde_json::Value {
        serde_json::json!({
            "data": {
                "id": "shop.example.net",
                "type": "domain",
                "attributes": {
                    "last_analysis_stats": {
                        "malicious": malicious,
                        "suspicious": suspicious,
                        "harmless": 60,
                        "undetected": 10,
                        "timeout": 0
                    }
                }
            }
        })
    }

    #[tokio::test]
    async fn malicious_engines_are_a_threat() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/domains/shop.example.net"))
            .and(header("x-apikey", "vt-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(report(3, 0)))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client_for(&server).lookup("shop.example.net").await;
        assert_eq!(outcome.status, CheckStatus::ThreatDetected);
        assert!(matches!(
            outcome.details,
            Some(ScanDetails::VirusTotal { stats }) if stats.malicious == 3
        ));
    }

    #[tokio::test]
    async fn suspicious_only_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(report(0, 2)))
            .mount(&server)
            .await;

        let outcome = client_for(&server).lookup("shop.example.net").await;
        assert_eq!(outcome.status, CheckStatus::Success);
        assert!(matches!(
            outcome.details,
            Some(ScanDetails::VirusTotal { stats }) if stats.suspicious == 2
        ));
    }

    #[tokio::test]
    async fn unknown_domain_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let outcome = client_for(&server).lookup("new.example.net").await;
        assert_eq!(outcome.status, CheckStatus::NotFound);
    }

    #[tokio::test]
    async fn rate_limit_is_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let outcome = client_for(&server).lookup("shop.example.net").await;
        assert_eq!(outcome.status, CheckStatus::Failed);
        assert_eq!(outcome.error_message.as_deref(), Some("rate limit exceeded"));
    }

    #[tokio::test]
    async fn transport_error_omits_request_url() {
        let client = VirusTotalClient::new(VirusTotalConfig {
            api_key: "vt-key".to_string(),
            base_url: "http://127.0.0.1:9/api/v3".to_string(),
            timeout_secs: 2,
            ..VirusTotalConfig::default()
        });

        let outcome = client.lookup("shop.example.net").await;
        assert_eq!(outcome.status, CheckStatus::Failed);
        let message = outcome.error_message.unwrap();
        assert!(message.starts_with("Request failed"), "{message}");
        assert!(!message.contains("/api/v3/domains"), "{message}");
    }
}
