//! Error types and handling for the JIRA Query MCP Server
//!
//! Provides structured error types that map to MCP JSON-RPC error codes
//! and classifies gouqi client failures into them.

use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Custom error types for the JIRA Query MCP Server
#[derive(Debug, Error)]
pub enum JiraMcpError {
    /// Configuration errors (-32001)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Authentication failures (-32002)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Network errors (-32003)
    #[error("Network error: {message}")]
    Network { message: String },

    /// Permission denied errors (-32004)
    #[error("Permission denied: {message}")]
    Permission { message: String },

    /// Resource not found errors (-32005)
    #[error("Not found: {resource} '{key}' not found")]
    NotFound { resource: String, key: String },

    /// Invalid parameter errors (-32006)
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// Rate limit exceeded errors (-32007)
    #[error("Rate limit exceeded, retry after {retry_after} seconds")]
    RateLimit { retry_after: u64 },

    /// JIRA rejected the JQL query
    #[error("JQL error: {message}")]
    JqlError { message: String },

    /// The knowledge store document exists but could not be loaded (-32008)
    #[error("Failed to load knowledge store from {path}: {message}")]
    KnowledgeStoreLoad { path: String, message: String },

    /// Tool name not recognised by the dispatcher
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    /// Internal server errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl JiraMcpError {
    /// Get the MCP JSON-RPC error code for this error
    pub fn error_code(&self) -> i32 {
        match self {
            JiraMcpError::Configuration { .. } => -32001,
            JiraMcpError::Authentication { .. } => -32002,
            JiraMcpError::Network { .. } => -32003,
            JiraMcpError::Permission { .. } => -32004,
            JiraMcpError::NotFound { .. } => -32005,
            JiraMcpError::InvalidParameter { .. } => -32006,
            JiraMcpError::RateLimit { .. } => -32007,
            JiraMcpError::JqlError { .. } => -32006, // Invalid parameter category
            JiraMcpError::KnowledgeStoreLoad { .. } => -32008,
            JiraMcpError::UnknownTool { .. } => -32601, // Method not found
            JiraMcpError::Internal { .. } => -32603,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            JiraMcpError::Configuration { .. } => "configuration",
            JiraMcpError::Authentication { .. } => "authentication",
            JiraMcpError::Network { .. } => "network",
            JiraMcpError::Permission { .. } => "permission",
            JiraMcpError::NotFound { .. } => "not_found",
            JiraMcpError::InvalidParameter { .. } => "invalid_parameter",
            JiraMcpError::RateLimit { .. } => "rate_limit",
            JiraMcpError::JqlError { .. } => "jql",
            JiraMcpError::KnowledgeStoreLoad { .. } => "knowledge_store",
            JiraMcpError::UnknownTool { .. } => "unknown_tool",
            JiraMcpError::Internal { .. } => "internal",
        }
    }

    /// Whether an upstream call failing with this error is worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            JiraMcpError::Network { .. } | JiraMcpError::RateLimit { .. } => true,
            JiraMcpError::Internal { message } => {
                let lower = message.to_lowercase();
                lower.contains("500")
                    || lower.contains("502")
                    || lower.contains("503")
                    || lower.contains("504")
                    || lower.contains("timed out")
            }
            _ => false,
        }
    }

    /// Structured details for logs and MCP error responses
    pub fn error_data(&self) -> Value {
        let mut data = serde_json::Map::new();
        data.insert(
            "category".to_string(),
            Value::String(self.category().to_string()),
        );

        match self {
            JiraMcpError::RateLimit { retry_after } => {
                data.insert(
                    "retry_after".to_string(),
                    Value::Number((*retry_after).into()),
                );
            }
            JiraMcpError::NotFound { resource, key } => {
                data.insert("resource".to_string(), Value::String(resource.clone()));
                data.insert("key".to_string(), Value::String(key.clone()));
            }
            JiraMcpError::InvalidParameter { parameter, .. } => {
                data.insert("parameter".to_string(), Value::String(parameter.clone()));
            }
            JiraMcpError::KnowledgeStoreLoad { path, .. } => {
                data.insert("path".to_string(), Value::String(path.clone()));
            }
            JiraMcpError::UnknownTool { name } => {
                data.insert("tool".to_string(), Value::String(name.clone()));
            }
            _ => {}
        }

        Value::Object(data)
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        JiraMcpError::Configuration {
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        JiraMcpError::Authentication {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        JiraMcpError::Network {
            message: message.into(),
        }
    }

    /// Create a permission error
    pub fn permission(message: impl Into<String>) -> Self {
        JiraMcpError::Permission {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>, key: impl Into<String>) -> Self {
        JiraMcpError::NotFound {
            resource: resource.into(),
            key: key.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_param(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        JiraMcpError::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a rate limit error
    pub fn rate_limit(retry_after: u64) -> Self {
        JiraMcpError::RateLimit { retry_after }
    }

    /// Create a JQL error
    pub fn jql(message: impl Into<String>) -> Self {
        JiraMcpError::JqlError {
            message: message.into(),
        }
    }

    /// Create a knowledge store load error for the given source file
    pub fn store_load(path: &Path, message: impl Into<String>) -> Self {
        JiraMcpError::KnowledgeStoreLoad {
            path: path.display().to_string(),
            message: message.into(),
        }
    }

    /// Create an unknown tool error
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        JiraMcpError::UnknownTool { name: name.into() }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        JiraMcpError::Internal {
            message: message.into(),
        }
    }
}

/// Convert from gouqi errors to JiraMcpError
impl From<gouqi::Error> for JiraMcpError {
    fn from(err: gouqi::Error) -> Self {
        match err {
            gouqi::Error::Http(_) => JiraMcpError::network(format!("HTTP error: {}", err)),
            gouqi::Error::IO(_) => JiraMcpError::network(format!("IO error: {}", err)),
            gouqi::Error::Serde(_) => {
                JiraMcpError::internal(format!("Serialization error: {}", err))
            }
            gouqi::Error::Unauthorized => JiraMcpError::auth("JIRA authentication failed"),
            gouqi::Error::NotFound => JiraMcpError::not_found("JIRA resource", "requested"),
            gouqi::Error::Fault { .. } => classify_fault(err.to_string()),
            _ => JiraMcpError::internal(format!("JIRA client error: {}", err)),
        }
    }
}

/// JIRA reports most request-level failures as a fault with a status code
/// and an error body, so the status is recovered from the rendered message.
fn classify_fault(message: String) -> JiraMcpError {
    let lower = message.to_lowercase();

    if lower.contains("429") || lower.contains("rate limit") {
        JiraMcpError::rate_limit(60)
    } else if lower.contains("401") {
        JiraMcpError::auth(message)
    } else if lower.contains("403") || lower.contains("forbidden") {
        JiraMcpError::permission(message)
    } else if lower.contains("400") || lower.contains("jql") {
        JiraMcpError::jql(message)
    } else {
        JiraMcpError::internal(format!("JIRA API error: {}", message))
    }
}

/// Result type alias for JIRA MCP operations
pub type JiraMcpResult<T> = Result<T, JiraMcpError>;
