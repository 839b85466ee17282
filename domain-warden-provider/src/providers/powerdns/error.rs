//! PowerDNS error mapping

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::PowerDnsProvider;

/// PowerDNS reports failures through the HTTP status plus `{"error": "..."}`.
/// Reference: <https://doc.powerdns.com/authoritative/http-api/index.html#errors>
impl ProviderErrorMapper for PowerDnsProvider {
    fn provider_name(&self) -> &'static str {
        "powerdns"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        let provider = self.provider_name().to_string();
        let zone = context.zone.unwrap_or_else(|| "<unknown>".to_string());
        let message = raw.message.to_ascii_lowercase();
        let not_found = message.contains("could not find") || message.contains("not found");
        let exists = message.contains("already exists");

        match raw.status {
            401 => ProviderError::InvalidCredentials {
                provider,
                raw_message: Some(raw.message),
            },
            403 => ProviderError::PermissionDenied {
                provider,
                raw_message: Some(raw.message),
            },
            404 => ProviderError::ZoneNotFound {
                provider,
                zone,
                raw_message: Some(raw.message),
            },
            409 => ProviderError::ZoneExists {
                provider,
                zone,
                raw_message: Some(raw.message),
            },
            // 422 covers both "zone does not exist" and malformed rrsets.
            400 | 422 if not_found => ProviderError::ZoneNotFound {
                provider,
                zone,
                raw_message: Some(raw.message),
            },
            400 | 422 if exists => ProviderError::ZoneExists {
                provider,
                zone,
                raw_message: Some(raw.message),
            },
            400 | 422 => ProviderError::InvalidParameter {
                provider,
                param: "rrsets".to_string(),
                detail: raw.message,
            },
            _ if not_found => ProviderError::ZoneNotFound {
                provider,
                zone,
                raw_message: Some(raw.message),
            },
            _ if exists => ProviderError::ZoneExists {
                provider,
                zone,
                raw_message: Some(raw.message),
            },
            _ => self.unknown_error(raw),
        }
    }
}
