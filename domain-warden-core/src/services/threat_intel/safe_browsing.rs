//! Google Safe Browsing v4 `threatMatches:find` client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use domain_warden_provider::log_sanitizer::truncate_for_log;

use super::{build_http_client, elapsed_ms, redacted};
use crate::traits::ThreatSource;
use crate::types::{
    CheckOutcome, CheckStatus, CheckType, SafeBrowsingConfig, ScanDetails, ThreatMatch,
    ThreatService,
};

const THREAT_TYPES: [&str; 4] = [
    "MALWARE",
    "SOCIAL_ENGINEERING",
    "UNWANTED_SOFTWARE",
    "POTENTIALLY_HARMFUL_APPLICATION",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FindRequest<'a> {
    client: ClientInfo<'a>,
    threat_info: ThreatInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientInfo<'a> {
    client_id: &'a str,
    client_version: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThreatInfo {
    threat_types: Vec<&'static str>,
    platform_types: Vec<&'static str>,
    threat_entry_types: Vec<&'static str>,
    threat_entries: Vec<ThreatEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ThreatEntry {
    url: String,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    matches: Vec<RawMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMatch {
    #[serde(default)]
    threat_type: String,
    #[serde(default)]
    platform_type: String,
    threat: ThreatEntry,
}

impl<'a> FindRequest<'a> {
    fn for_domain(config: &'a SafeBrowsingConfig, fqdn: &str) -> Self {
        Self {
            client: ClientInfo {
                client_id: &config.client_id,
                client_version: &config.client_version,
            },
            threat_info: ThreatInfo {
                threat_types: THREAT_TYPES.to_vec(),
                platform_types: vec!["ANY_PLATFORM"],
                threat_entry_types: vec!["URL"],
                threat_entries: vec![
                    ThreatEntry {
                        url: format!("http://{fqdn}/"),
                    },
                    ThreatEntry {
                        url: format!("https://{fqdn}/"),
                    },
                ],
            },
        }
    }
}

/// Safe Browsing lookup client.
pub struct SafeBrowsingClient {
    client: Client,
    config: SafeBrowsingConfig,
}

impl SafeBrowsingClient {
    pub fn new(config: SafeBrowsingConfig) -> Self {
        Self {
            client: build_http_client(Duration::from_secs(config.timeout_secs)),
            config,
        }
    }

    fn failed(message: String, start: Instant) -> CheckOutcome {
        log::warn!("[safe_browsing] {message}");
        CheckOutcome::failed(CheckType::SafeBrowsing, message).with_latency(elapsed_ms(start))
    }
}

#[async_trait]
impl ThreatSource for SafeBrowsingClient {
    fn service(&self) -> ThreatService {
        ThreatService::SafeBrowsing
    }

    async fn lookup(&self, fqdn: &str) -> CheckOutcome {
        let start = Instant::now();
        let body = FindRequest::for_domain(&self.config, fqdn);
        log::debug!("[safe_browsing] POST {} ({fqdn})", self.config.endpoint);

        let response = match self
            .client
            .post(&self.config.endpoint)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Self::failed(format!("Request failed: {}", redacted(e)), start),
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                let message = format!("Failed to read response body: {}", redacted(e));
                return Self::failed(message, start);
            }
        };
        if status != 200 {
            return Self::failed(format!("HTTP {status}: {}", truncate_for_log(&text)), start);
        }

        let parsed: FindResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::error!("[safe_browsing] Raw response: {}", truncate_for_log(&text));
                return Self::failed(format!("JSON parse failed: {e}"), start);
            }
        };

        let latency_ms = elapsed_ms(start);
        if parsed.matches.is_empty() {
            return CheckOutcome::success(CheckType::SafeBrowsing).with_latency(latency_ms);
        }

        let matches: Vec<ThreatMatch> = parsed
            .matches
            .into_iter()
            .map(|m| ThreatMatch {
                threat_type: m.threat_type,
                platform_type: m.platform_type,
                url: m.threat.url,
            })
            .collect();
        log::warn!(
            "[safe_browsing] {fqdn} flagged: {}",
            matches
                .iter()
                .map(|m| m.threat_type.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        CheckOutcome::new(CheckType::SafeBrowsing, CheckStatus::ThreatDetected)
            .with_latency(latency_ms)
            .with_details(ScanDetails::SafeBrowsing { matches })
    }
}
