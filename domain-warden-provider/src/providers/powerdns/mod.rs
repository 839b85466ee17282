//! PowerDNS Authoritative HTTP API backend

mod error;
mod http;
mod provider;
mod types;

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::providers::common::create_http_client;

/// Connection settings for a PowerDNS server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerDnsConfig {
    /// Base URL of the API, e.g. `http://127.0.0.1:8081`.
    pub api_url: String,
    /// Value of the `X-API-Key` header.
    pub api_key: String,
    /// Server id in `/api/v1/servers/{server_id}`.
    pub server_id: String,
    /// Retries for transient failures.
    pub max_retries: u32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for PowerDnsConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8081".to_string(),
            api_key: String::new(),
            server_id: "localhost".to_string(),
            max_retries: 2,
            timeout_secs: 30,
        }
    }
}

/// PowerDNS zone provider
pub struct PowerDnsProvider {
    pub(crate) client: Client,
    pub(crate) config: PowerDnsConfig,
}

impl PowerDnsProvider {
    pub fn new(config: PowerDnsConfig) -> Self {
        let client = create_http_client(Duration::from_secs(config.timeout_secs));
        Self { client, config }
    }

    /// `{api_url}/api/v1/servers/{server_id}/zones`
    pub(crate) fn zones_url(&self) -> String {
        format!(
            "{}/api/v1/servers/{}/zones",
            self.config.api_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.server_id)
        )
    }

    /// `{zones_url}/{zone}`
    pub(crate) fn zone_url(&self, zone: &str) -> String {
        format!("{}/{}", self.zones_url(), urlencoding::encode(zone))
    }
}
