//! MCP-specific error types and mapping to JSON-RPC error codes.

use crate::document::DocumentKind;
use crate::error::VellumError;
use rmcp::model::ErrorCode;
use rmcp::ErrorData as RmcpError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Custom MCP error codes (in the -32000 to -32099 range for server errors)
pub mod error_codes {
    pub const DOCUMENT_NOT_FOUND: i32 = -32001;
    pub const DOCUMENT_KIND_INVALID: i32 = -32002;
    pub const VALIDATION_FAILED: i32 = -32003;
    pub const UNSUPPORTED_OPERATION: i32 = -32004;
    pub const GENERATION_FAILED: i32 = -32005;
    pub const STORAGE_ERROR: i32 = -32010;
    pub const INTERNAL_ERROR: i32 = -32011;
}

/// MCP-specific error types with detailed context.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum McpError {
    #[error("{kind} document not found: {id}")]
    DocumentNotFound { kind: String, id: String },

    #[error("Invalid document kind '{provided}'. Valid kinds: {}", valid.join(", "))]
    DocumentKindInvalid { provided: String, valid: Vec<String> },

    #[error("Validation failed for field '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Invalid value '{value}' for field '{field}'")]
    InvalidValue { field: String, value: String },

    #[error("Unsupported operation: {message}")]
    UnsupportedOperation { message: String },

    #[error("Generation failed: {message}")]
    GenerationFailed { message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl McpError {
    /// Get the JSON-RPC error code for this error type.
    pub fn error_code(&self) -> i32 {
        match self {
            McpError::DocumentNotFound { .. } => error_codes::DOCUMENT_NOT_FOUND,
            McpError::DocumentKindInvalid { .. } => error_codes::DOCUMENT_KIND_INVALID,
            McpError::ValidationFailed { .. } | McpError::InvalidValue { .. } => {
                error_codes::VALIDATION_FAILED
            }
            McpError::UnsupportedOperation { .. } => error_codes::UNSUPPORTED_OPERATION,
            McpError::GenerationFailed { .. } => error_codes::GENERATION_FAILED,
            McpError::StorageError { .. } => error_codes::STORAGE_ERROR,
            McpError::InternalError { .. } => error_codes::INTERNAL_ERROR,
        }
    }

    /// Get the error type name for the data payload.
    pub fn error_type(&self) -> &'static str {
        match self {
            McpError::DocumentNotFound { .. } => "DocumentNotFound",
            McpError::DocumentKindInvalid { .. } => "DocumentKindInvalid",
            McpError::ValidationFailed { .. } => "ValidationFailed",
            McpError::InvalidValue { .. } => "InvalidValue",
            McpError::UnsupportedOperation { .. } => "UnsupportedOperation",
            McpError::GenerationFailed { .. } => "GenerationFailed",
            McpError::StorageError { .. } => "StorageError",
            McpError::InternalError { .. } => "InternalError",
        }
    }

    /// Convert to rmcp ErrorData for JSON-RPC response.
    pub fn to_rmcp_error(&self) -> RmcpError {
        RmcpError {
            code: ErrorCode(self.error_code()),
            message: self.to_string().into(),
            data: Some(json!({
                "error_type": self.error_type(),
                "details": self.clone()
            })),
        }
    }
}

impl From<McpError> for RmcpError {
    fn from(err: McpError) -> Self {
        err.to_rmcp_error()
    }
}

impl From<VellumError> for McpError {
    fn from(err: VellumError) -> Self {
        match err {
            VellumError::NotFound { kind, id } => McpError::DocumentNotFound { kind, id },
            VellumError::InvalidKind(provided) => McpError::DocumentKindInvalid {
                provided,
                valid: DocumentKind::ALL.iter().map(|k| k.to_string()).collect(),
            },
            VellumError::Validation { field, message } => {
                McpError::ValidationFailed { field, message }
            }
            VellumError::InvalidValue { field, value } => McpError::InvalidValue { field, value },
            VellumError::UnsupportedOperation(message) => {
                McpError::UnsupportedOperation { message }
            }
            VellumError::Generation(message) => McpError::GenerationFailed { message },
            VellumError::Json(e) => McpError::InternalError {
                message: format!("JSON error: {}", e),
            },
            VellumError::Yaml(e) => McpError::InternalError {
                message: format!("YAML error: {}", e),
            },
            other => McpError::StorageError {
                message: other.to_string(),
            },
        }
    }
}

/// Validation constants.
pub mod validation {
    pub const DEFAULT_LIMIT: usize = 50;
    pub const MAX_LIMIT: usize = 100;
}
