//! Unified error type

use serde::Serialize;
use thiserror::Error;

/// Toolbox error
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum ToolboxError {
    /// Input rejected before any I/O
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Network failure
    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Toolbox Result alias
pub type ToolboxResult<T> = std::result::Result<T, ToolboxError>;
