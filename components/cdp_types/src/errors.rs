// Protocol error payloads
//
// Errors are reported on the wire as JSON-RPC 2.0 error objects.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error object carried by a failed protocol call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CdpError {
    /// JSON-RPC error code
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Additional error data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl fmt::Display for CdpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CDP Error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for CdpError {}

impl CdpError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(code: i32, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Unknown method or event name (-32601)
    pub fn method_not_found(method: impl Into<String>) -> Self {
        let method = method.into();
        Self::with_data(
            -32601,
            "Method not found",
            serde_json::json!({ "method": method }),
        )
    }

    /// Parameters that failed to decode (-32602)
    pub fn invalid_params(details: impl Into<String>) -> Self {
        let details = details.into();
        Self::with_data(
            -32602,
            "Invalid params",
            serde_json::json!({ "details": details }),
        )
    }

    /// Internal error (-32603)
    pub fn internal_error(details: impl Into<String>) -> Self {
        let details = details.into();
        Self::with_data(
            -32603,
            "Internal error",
            serde_json::json!({ "details": details }),
        )
    }

    /// Implementation-defined error. Codes outside -32099..=-32000 are
    /// clamped to -32000.
    pub fn server_error(code: i32, message: impl Into<String>) -> Self {
        let code = if (-32099..=-32000).contains(&code) {
            code
        } else {
            -32000
        };
        Self::new(code, message)
    }
}
