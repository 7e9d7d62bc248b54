// Protocol wire types shared by the network tracker
//
// Event envelopes, error payloads and the Network/Console domain payloads.

pub mod domains;
pub mod errors;

// Re-export commonly used types
pub use errors::CdpError;

use serde::{Deserialize, Serialize};

/// Unsolicited notification pushed by the inspected target
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CdpEvent {
    /// Event name in format "Domain.event"
    pub method: String,
    /// Event parameters
    #[serde(default)]
    pub params: serde_json::Value,
}

impl CdpEvent {
    pub fn new(method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Domain part of the method name, e.g. `"Network"`
    pub fn domain(&self) -> &str {
        self.method
            .split_once('.')
            .map(|(domain, _)| domain)
            .unwrap_or("")
    }

    /// Event part of the method name, e.g. `"dataReceived"`
    pub fn event_name(&self) -> &str {
        self.method
            .split_once('.')
            .map(|(_, name)| name)
            .unwrap_or(&self.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_basic() {
        let event = CdpEvent::new("Network.requestWillBeSent", json!({"requestId": "123"}));

        assert_eq!(event.domain(), "Network");
        assert_eq!(event.event_name(), "requestWillBeSent");
    }

    #[test]
    fn test_event_without_domain() {
        let event = CdpEvent::new("ping", json!({}));

        assert_eq!(event.domain(), "");
        assert_eq!(event.event_name(), "ping");
    }

    #[test]
    fn test_event_params_default_to_null() {
        let event: CdpEvent = serde_json::from_str(r#"{"method":"Network.webSocketClosed"}"#).unwrap();
        assert!(event.params.is_null());
    }
}
