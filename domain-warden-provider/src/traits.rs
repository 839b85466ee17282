use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::types::{RecordType, RrsetChange, Zone};

/// Raw API error (internal).
#[derive(Debug, Clone)]
pub(crate) struct RawApiError {
    /// HTTP status the error arrived with.
    pub status: u16,
    /// Error message extracted from the body (or the body itself).
    pub message: String,
}

impl RawApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Extra context used while mapping an error (internal).
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorContext {
    /// Zone the request targeted.
    pub zone: Option<String>,
}

impl ErrorContext {
    pub fn zone(zone: &str) -> Self {
        Self {
            zone: Some(zone.to_string()),
        }
    }
}

/// Maps raw API errors onto [`ProviderError`] (internal).
pub(crate) trait ProviderErrorMapper {
    /// Backend identifier.
    fn provider_name(&self) -> &'static str;

    /// Map a raw API error onto the unified error type.
    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError;

    /// Shortcut: parse error.
    fn parse_error(&self, detail: impl ToString) -> ProviderError {
        ProviderError::ParseError {
            provider: self.provider_name().to_string(),
            detail: detail.to_string(),
        }
    }

    /// Shortcut: unknown error (fallback).
    fn unknown_error(&self, raw: RawApiError) -> ProviderError {
        ProviderError::Unknown {
            provider: self.provider_name().to_string(),
            raw_code: Some(raw.status.to_string()),
            raw_message: raw.message,
        }
    }
}

/// Management API of an authoritative DNS server.
///
/// Zone names are fully qualified with a trailing dot.
#[async_trait]
pub trait ZoneProvider: Send + Sync {
    /// Backend identifier.
    fn id(&self) -> &'static str;

    /// Create a master zone served by `nameservers`.
    async fn create_zone(&self, zone: &str, nameservers: &[String]) -> Result<()>;

    /// Delete a zone with every RRset it holds.
    async fn delete_zone(&self, zone: &str) -> Result<()>;

    /// Read a zone including all RRsets.
    async fn get_zone(&self, zone: &str) -> Result<Zone>;

    /// Apply RRset changes to a zone in a single request.
    async fn patch_rrsets(&self, zone: &str, changes: &[RrsetChange]) -> Result<()>;

    /// Remove one RRset.
    async fn delete_rrset(&self, zone: &str, name: &str, record_type: RecordType) -> Result<()> {
        self.patch_rrsets(zone, &[RrsetChange::delete(name, record_type)])
            .await
    }
}
