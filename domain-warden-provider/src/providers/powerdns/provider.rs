//! PowerDNS `ZoneProvider` implementation

use async_trait::async_trait;
use reqwest::Method;

use crate::error::Result;
use crate::http_client::HttpUtils;
use crate::providers::common::ensure_trailing_dot;
use crate::traits::{ErrorContext, ProviderErrorMapper, ZoneProvider};
use crate::types::{RrsetChange, Zone, ZoneKind};

use super::PowerDnsProvider;
use super::types::{CreateZoneBody, PatchZoneBody};

#[async_trait]
impl ZoneProvider for PowerDnsProvider {
    fn id(&self) -> &'static str {
        "powerdns"
    }

    async fn create_zone(&self, zone: &str, nameservers: &[String]) -> Result<()> {
        let zone = ensure_trailing_dot(zone);
        let body = CreateZoneBody {
            name: &zone,
            kind: ZoneKind::Master,
            nameservers: nameservers.iter().map(|ns| ensure_trailing_dot(ns)).collect(),
        };

        self.request_with_body(Method::POST, &self.zones_url(), &body, ErrorContext::zone(&zone))
            .await?;
        log::info!("[powerdns] Created zone {zone}");
        Ok(())
    }

    async fn delete_zone(&self, zone: &str) -> Result<()> {
        let zone = ensure_trailing_dot(zone);
        self.request(Method::DELETE, &self.zone_url(&zone), ErrorContext::zone(&zone))
            .await?;
        log::info!("[powerdns] Deleted zone {zone}");
        Ok(())
    }

    async fn get_zone(&self, zone: &str) -> Result<Zone> {
        let zone = ensure_trailing_dot(zone);
        let body = self
            .request(Method::GET, &self.zone_url(&zone), ErrorContext::zone(&zone))
            .await?;

        if body.trim().is_empty() {
            return Err(self.parse_error("empty zone response"));
        }
        HttpUtils::parse_json(&body, self.provider_name())
    }

    async fn patch_rrsets(&self, zone: &str, changes: &[RrsetChange]) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let zone = ensure_trailing_dot(zone);
        let body = PatchZoneBody { rrsets: changes };

        self.request_with_body(
            Method::PATCH,
            &self.zone_url(&zone),
            &body,
            ErrorContext::zone(&zone),
        )
        .await?;
        log::debug!("[powerdns] Patched {} rrset(s) in {zone}", changes.len());
        Ok(())
    }
}
