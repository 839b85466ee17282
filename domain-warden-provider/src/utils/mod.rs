//! Utility modules.

/// Log sanitization helpers to keep large or sensitive payloads out of logs.
pub mod log_sanitizer;
