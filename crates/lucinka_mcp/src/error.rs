//! Custom error types for the MCP server.

use lucinka_client::{LucinkaError, ValidationError};
use thiserror::Error;

use crate::domains::activity_types::RegistryError;
use crate::store::StoreError;

/// MCP server errors.
#[derive(Debug, Error)]
pub enum McpError {
    #[error("API error: {0}")]
    Api(#[from] LucinkaError),

    /// A snapshot fetch failed; the caller has to log in again.
    #[error("session invalid, please log in again: {0}")]
    SessionInvalid(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Activity type error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Preference store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<McpError> for String {
    fn from(err: McpError) -> Self {
        err.to_string()
    }
}

/// Result type alias for MCP operations.
pub type McpResult<T> = Result<T, McpError>;
