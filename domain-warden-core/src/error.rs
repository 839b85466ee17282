//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

// Re-export library error type
pub use domain_warden_provider::ProviderError;

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Domain not found (or tombstoned)
    #[error("Domain not found: {0}")]
    DomainNotFound(String),

    /// Pending domain reservation not found
    #[error("Pending domain not found: {0}")]
    PendingDomainNotFound(String),

    /// Record not found
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// Record would violate a per-name invariant (CNAME exclusivity)
    #[error("Record conflict: {0}")]
    RecordConflict(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Zone API error (converted from the provider library)
    #[error("{0}")]
    Provider(#[from] ProviderError),
}

impl CoreError {
    /// Whether it is expected behaviour (bad input, missing resource, ...); used for log levels.
    ///
    /// `warn` when this returns `true`, `error` otherwise.
    /// **Update this method when new variants are added.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::DomainNotFound(_)
            | Self::PendingDomainNotFound(_)
            | Self::RecordNotFound(_)
            | Self::RecordConflict(_)
            | Self::ValidationError(_) => true,
            Self::Provider(e) => e.is_expected(),
            Self::StorageError(_) | Self::SerializationError(_) | Self::NetworkError(_) => false,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
