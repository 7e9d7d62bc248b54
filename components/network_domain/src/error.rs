//! Error types for the network tracker

use cdp_types::CdpError;
use thiserror::Error;

/// Errors that can occur while decoding or servicing network notifications
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Event name outside the Network domain or not handled by the tracker
    #[error("Unknown network event: {0}")]
    UnknownEvent(String),

    /// Event parameters failed to decode
    #[error("Invalid event params: {0}")]
    InvalidParams(#[from] serde_json::Error),

    /// Response body could not be obtained
    #[error("Content unavailable for request {0}")]
    ContentUnavailable(String),

    /// Content fetch requested outside of a tokio runtime
    #[error("No async runtime available to fetch content for request {0}")]
    NoRuntime(String),
}

/// Result type for network tracker operations
pub type Result<T> = std::result::Result<T, NetworkError>;

impl From<NetworkError> for CdpError {
    fn from(error: NetworkError) -> Self {
        match error {
            NetworkError::UnknownEvent(method) => CdpError::method_not_found(method),
            NetworkError::InvalidParams(e) => CdpError::invalid_params(e.to_string()),
            NetworkError::ContentUnavailable(id) => CdpError::server_error(
                -32000,
                format!("No resource with given identifier found: {}", id),
            ),
            NetworkError::NoRuntime(id) => {
                CdpError::internal_error(format!("No runtime to fetch content for {}", id))
            }
        }
    }
}
