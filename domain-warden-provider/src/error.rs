use serde::{Deserialize, Serialize};

/// Unified error type for all zone API operations.
///
/// Each variant carries a `provider` field identifying the backend that produced
/// it. All variants are serializable for structured error reporting.
///
/// # Retryable Errors
///
/// - [`NetworkError`](Self::NetworkError): connection refused, reset, 502-504
/// - [`Timeout`](Self::Timeout): request timed out
/// - [`RateLimited`](Self::RateLimited): HTTP 429
///
/// The built-in HTTP helper retries these with exponential backoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ProviderError {
    /// A network-level error occurred.
    NetworkError {
        /// Provider that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// The API key was rejected.
    InvalidCredentials {
        /// Provider that produced the error.
        provider: String,
        /// Original error message from the API, if available.
        raw_message: Option<String>,
    },

    /// The API key is valid but not allowed to perform the operation.
    PermissionDenied {
        /// Provider that produced the error.
        provider: String,
        /// Original error message from the API, if available.
        raw_message: Option<String>,
    },

    /// A zone with the same name already exists.
    ZoneExists {
        /// Provider that produced the error.
        provider: String,
        /// Zone that already exists.
        zone: String,
        /// Original error message from the API, if available.
        raw_message: Option<String>,
    },

    /// The requested zone does not exist.
    ZoneNotFound {
        /// Provider that produced the error.
        provider: String,
        /// Zone that was not found.
        zone: String,
        /// Original error message from the API, if available.
        raw_message: Option<String>,
    },

    /// The server rejected a request parameter (malformed RRset, bad content, ...).
    InvalidParameter {
        /// Provider that produced the error.
        provider: String,
        /// Name of the invalid parameter.
        param: String,
        /// Description of what's wrong.
        detail: String,
    },

    /// HTTP 429 from the API.
    RateLimited {
        /// Provider that produced the error.
        provider: String,
        /// Suggested wait time in seconds, if the API sent `Retry-After`.
        retry_after: Option<u64>,
        /// Original error message from the API, if available.
        raw_message: Option<String>,
    },

    /// The HTTP request timed out.
    Timeout {
        /// Provider that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// Failed to parse the API response.
    ParseError {
        /// Provider that produced the error.
        provider: String,
        /// Details about the parse failure.
        detail: String,
    },

    /// Failed to serialize a request body.
    SerializationError {
        /// Provider that produced the error.
        provider: String,
        /// Details about the serialization failure.
        detail: String,
    },

    /// Catch-all for responses not mapped to a specific variant.
    Unknown {
        /// Provider that produced the error.
        provider: String,
        /// Raw error code (HTTP status) if available.
        raw_code: Option<String>,
        /// Raw error message from the API.
        raw_message: String,
    },
}

impl ProviderError {
    /// Whether the error is an expected outcome (bad input, missing resource), used
    /// to pick the log level: `warn` when `true`, `error` otherwise.
    ///
    /// Keep in sync when adding variants.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials { .. }
                | Self::PermissionDenied { .. }
                | Self::ZoneExists { .. }
                | Self::ZoneNotFound { .. }
                | Self::InvalidParameter { .. }
        )
    }

    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError { .. } | Self::Timeout { .. } | Self::RateLimited { .. }
        )
    }

    /// `true` for [`ZoneExists`](Self::ZoneExists).
    #[must_use]
    pub fn is_zone_exists(&self) -> bool {
        matches!(self, Self::ZoneExists { .. })
    }

    /// `true` for [`ZoneNotFound`](Self::ZoneNotFound).
    #[must_use]
    pub fn is_zone_not_found(&self) -> bool {
        matches!(self, Self::ZoneNotFound { .. })
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkError { provider, detail } => {
                write!(f, "[{provider}] Network error: {detail}")
            }
            Self::InvalidCredentials {
                provider,
                raw_message,
            } => match raw_message {
                Some(msg) => write!(f, "[{provider}] Invalid credentials: {msg}"),
                None => write!(f, "[{provider}] Invalid credentials"),
            },
            Self::PermissionDenied {
                provider,
                raw_message,
            } => match raw_message {
                Some(msg) => write!(f, "[{provider}] Permission denied: {msg}"),
                None => write!(f, "[{provider}] Permission denied"),
            },
            Self::ZoneExists {
                provider,
                zone,
                raw_message,
            } => match raw_message {
                Some(msg) => write!(f, "[{provider}] Zone '{zone}' already exists: {msg}"),
                None => write!(f, "[{provider}] Zone '{zone}' already exists"),
            },
            Self::ZoneNotFound {
                provider,
                zone,
                raw_message,
            } => match raw_message {
                Some(msg) => write!(f, "[{provider}] Zone '{zone}' not found: {msg}"),
                None => write!(f, "[{provider}] Zone '{zone}' not found"),
            },
            Self::InvalidParameter {
                provider,
                param,
                detail,
            } => write!(f, "[{provider}] Invalid parameter '{param}': {detail}"),
            Self::RateLimited {
                provider,
                retry_after,
                ..
            } => match retry_after {
                Some(secs) => write!(f, "[{provider}] Rate limited, retry after {secs}s"),
                None => write!(f, "[{provider}] Rate limited"),
            },
            Self::Timeout { provider, detail } => {
                write!(f, "[{provider}] Request timed out: {detail}")
            }
            Self::ParseError { provider, detail } => {
                write!(f, "[{provider}] Failed to parse response: {detail}")
            }
            Self::SerializationError { provider, detail } => {
                write!(f, "[{provider}] Failed to serialize request: {detail}")
            }
            Self::Unknown {
                provider,
                raw_code,
                raw_message,
            } => match raw_code {
                Some(code) => write!(f, "[{provider}] Unknown error ({code}): {raw_message}"),
                None => write!(f, "[{provider}] Unknown error: {raw_message}"),
            },
        }
    }
}

impl std::error::Error for ProviderError {}

/// Library Result alias.
pub type Result<T> = std::result::Result<T, ProviderError>;
