//! Shared helpers for zone API integration tests

#![allow(dead_code)]

use domain_warden_provider::{PowerDnsConfig, PowerDnsProvider};
use wiremock::MockServer;

pub const API_KEY: &str = "test-api-key";

/// Zones collection path for the default server id.
pub const ZONES_PATH: &str = "/api/v1/servers/localhost/zones";

/// Assert `Ok(..)` and unwrap it, failing the test otherwise.
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// Provider pointed at a mock server, with fast retries.
pub fn provider_for(server: &MockServer, max_retries: u32) -> PowerDnsProvider {
    PowerDnsProvider::new(PowerDnsConfig {
        api_url: server.uri(),
        api_key: API_KEY.to_string(),
        max_retries,
        timeout_secs: 5,
        ..PowerDnsConfig::default()
    })
}

/// Path of a single zone.
pub fn zone_path(zone: &str) -> String {
    format!("{ZONES_PATH}/{zone}")
}
