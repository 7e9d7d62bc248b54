// Network domain types
//
// Payloads of the Network.* notifications consumed by the network tracker.
// Field names follow the protocol's camelCase JSON; optional or frequently
// omitted fields default so that partial payloads still decode.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Unique request identifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        RequestId(value.to_string())
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        RequestId(value)
    }
}

/// Monotonically increasing time in seconds since an arbitrary point in the past
pub type MonotonicTime = f64;

/// UTC time in seconds since the epoch
pub type TimeSinceEpoch = f64;

/// Header map as sent on the wire. Repeated headers arrive folded into one
/// value separated by `\n`.
pub type Headers = Map<String, Value>;

/// Decodes a header map, treating `null` and non-object values as empty
fn lenient_headers<'de, D>(deserializer: D) -> Result<Headers, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => Ok(map),
        _ => Ok(Headers::new()),
    }
}

/// Resource type as reported by the inspected target
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ResourceType {
    Document,
    Stylesheet,
    Image,
    Media,
    Font,
    Script,
    TextTrack,
    XHR,
    Fetch,
    EventSource,
    WebSocket,
    Manifest,
    #[default]
    #[serde(other)]
    Other,
}

/// Coarse grouping of resource types used for filtering and display
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ResourceCategory {
    Document,
    Stylesheet,
    Script,
    Image,
    Font,
    Media,
    XHR,
    WebSocket,
    Other,
}

impl ResourceCategory {
    pub fn title(&self) -> &'static str {
        match self {
            ResourceCategory::XHR => "XHR and Fetch",
            ResourceCategory::Script => "Scripts",
            ResourceCategory::Stylesheet => "Stylesheets",
            ResourceCategory::Image => "Images",
            ResourceCategory::Media => "Media",
            ResourceCategory::Font => "Fonts",
            ResourceCategory::Document => "Documents",
            ResourceCategory::WebSocket => "WebSockets",
            ResourceCategory::Other => "Other",
        }
    }

    pub fn short_title(&self) -> &'static str {
        match self {
            ResourceCategory::XHR => "XHR",
            ResourceCategory::Script => "JS",
            ResourceCategory::Stylesheet => "CSS",
            ResourceCategory::Image => "Img",
            ResourceCategory::Media => "Media",
            ResourceCategory::Font => "Font",
            ResourceCategory::Document => "Doc",
            ResourceCategory::WebSocket => "WS",
            ResourceCategory::Other => "Other",
        }
    }
}

impl ResourceType {
    /// Lowercase identifier, e.g. `"stylesheet"`
    pub fn name(&self) -> &'static str {
        match self {
            ResourceType::Document => "document",
            ResourceType::Stylesheet => "stylesheet",
            ResourceType::Image => "image",
            ResourceType::Media => "media",
            ResourceType::Font => "font",
            ResourceType::Script => "script",
            ResourceType::TextTrack => "texttrack",
            ResourceType::XHR => "xhr",
            ResourceType::Fetch => "fetch",
            ResourceType::EventSource => "eventsource",
            ResourceType::WebSocket => "websocket",
            ResourceType::Manifest => "manifest",
            ResourceType::Other => "other",
        }
    }

    /// Human readable title, e.g. `"Stylesheet"`
    pub fn title(&self) -> &'static str {
        match self {
            ResourceType::Document => "Document",
            ResourceType::Stylesheet => "Stylesheet",
            ResourceType::Image => "Image",
            ResourceType::Media => "Media",
            ResourceType::Font => "Font",
            ResourceType::Script => "Script",
            ResourceType::TextTrack => "TextTrack",
            ResourceType::XHR => "XHR",
            ResourceType::Fetch => "Fetch",
            ResourceType::EventSource => "EventSource",
            ResourceType::WebSocket => "WebSocket",
            ResourceType::Manifest => "Manifest",
            ResourceType::Other => "Other",
        }
    }

    pub fn category(&self) -> ResourceCategory {
        match self {
            ResourceType::Document => ResourceCategory::Document,
            ResourceType::Stylesheet => ResourceCategory::Stylesheet,
            ResourceType::Image => ResourceCategory::Image,
            ResourceType::Media => ResourceCategory::Media,
            ResourceType::Font => ResourceCategory::Font,
            ResourceType::Script => ResourceCategory::Script,
            ResourceType::XHR | ResourceType::Fetch | ResourceType::EventSource => {
                ResourceCategory::XHR
            }
            ResourceType::WebSocket => ResourceCategory::WebSocket,
            ResourceType::TextTrack | ResourceType::Manifest | ResourceType::Other => {
                ResourceCategory::Other
            }
        }
    }

    pub fn is_text_type(&self) -> bool {
        matches!(
            self,
            ResourceType::Document
                | ResourceType::Stylesheet
                | ResourceType::Script
                | ResourceType::TextTrack
                | ResourceType::XHR
                | ResourceType::Fetch
                | ResourceType::EventSource
                | ResourceType::Manifest
        )
    }
}

/// Resource priority
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResourcePriority {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

/// Security state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SecurityState {
    Unknown,
    Neutral,
    Insecure,
    Secure,
    Info,
    InsecureBroken,
}

/// HTTP request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Request URL
    pub url: String,
    /// HTTP method
    #[serde(default)]
    pub method: String,
    /// HTTP request headers
    #[serde(default, deserialize_with = "lenient_headers")]
    pub headers: Headers,
    /// POST data (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_data: Option<String>,
    /// Mixed content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mixed_content_type: Option<String>,
    /// Request priority
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_priority: Option<ResourcePriority>,
}

/// HTTP response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Response URL
    #[serde(default)]
    pub url: String,
    /// HTTP status code
    #[serde(default)]
    pub status: u16,
    /// HTTP status text
    #[serde(default)]
    pub status_text: String,
    /// HTTP response headers
    #[serde(default, deserialize_with = "lenient_headers")]
    pub headers: Headers,
    /// Raw response header text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers_text: Option<String>,
    /// MIME type
    #[serde(default)]
    pub mime_type: String,
    /// Request headers as actually sent (if captured)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_headers: Option<Headers>,
    /// Raw request header text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_headers_text: Option<String>,
    /// Whether connection was reused
    #[serde(default)]
    pub connection_reused: bool,
    /// Connection ID
    #[serde(default)]
    pub connection_id: f64,
    /// Remote IP address
    #[serde(rename = "remoteIPAddress", skip_serializing_if = "Option::is_none")]
    pub remote_ip_address: Option<String>,
    /// Remote port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_port: Option<i64>,
    /// Whether response came from disk cache
    #[serde(default)]
    pub from_disk_cache: bool,
    /// Whether response came from service worker
    #[serde(default)]
    pub from_service_worker: bool,
    /// Bytes received over the wire so far, or -1 when unknown
    #[serde(default)]
    pub encoded_data_length: f64,
    /// Timing information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<ResourceTiming>,
    /// Protocol used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Security state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_state: Option<SecurityState>,
}

/// Resource timing information.
///
/// `request_time` is a baseline in seconds; every other field is an offset
/// from it in milliseconds, with -1 meaning "not available".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceTiming {
    pub request_time: f64,
    pub proxy_start: f64,
    pub proxy_end: f64,
    pub dns_start: f64,
    pub dns_end: f64,
    pub connect_start: f64,
    pub connect_end: f64,
    pub ssl_start: f64,
    pub ssl_end: f64,
    pub send_start: f64,
    pub send_end: f64,
    pub push_start: f64,
    pub push_end: f64,
    /// Response headers received
    pub receive_headers_end: f64,
}

/// What kind of agent triggered a request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InitiatorType {
    Parser,
    Script,
    Preload,
    #[default]
    #[serde(other)]
    Other,
}

/// A single JavaScript stack frame
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CallFrame {
    pub function_name: String,
    pub script_id: String,
    pub url: String,
    pub line_number: u32,
    pub column_number: u32,
}

/// JavaScript call stack captured at request time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct StackTrace {
    pub call_frames: Vec<CallFrame>,
}

/// Information about the request initiator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Initiator {
    #[serde(rename = "type", default)]
    pub initiator_type: InitiatorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<StackTrace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
}

/// WebSocket handshake request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketRequest {
    #[serde(default, deserialize_with = "lenient_headers")]
    pub headers: Headers,
}

/// WebSocket handshake response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketResponse {
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub status_text: String,
    #[serde(default, deserialize_with = "lenient_headers")]
    pub headers: Headers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_headers: Option<Headers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_headers_text: Option<String>,
}

/// WebSocket message data as reported by the target
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketFrame {
    #[serde(default)]
    pub opcode: u8,
    #[serde(default)]
    pub mask: bool,
    #[serde(default)]
    pub payload_data: String,
}

// =============================================================================
// Notification parameters
// =============================================================================

/// `Network.requestWillBeSent`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestWillBeSentParams {
    pub request_id: RequestId,
    #[serde(default)]
    pub frame_id: String,
    #[serde(default)]
    pub loader_id: String,
    #[serde(rename = "documentURL", default)]
    pub document_url: String,
    pub request: Request,
    pub timestamp: MonotonicTime,
    #[serde(default)]
    pub wall_time: TimeSinceEpoch,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiator: Option<Initiator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_response: Option<Response>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<ResourceType>,
}

/// `Network.requestServedFromCache`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestServedFromCacheParams {
    pub request_id: RequestId,
}

/// `Network.responseReceived`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseReceivedParams {
    pub request_id: RequestId,
    #[serde(default)]
    pub frame_id: String,
    #[serde(default)]
    pub loader_id: String,
    pub timestamp: MonotonicTime,
    #[serde(rename = "type", default)]
    pub resource_type: ResourceType,
    pub response: Response,
}

/// `Network.dataReceived`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataReceivedParams {
    pub request_id: RequestId,
    pub timestamp: MonotonicTime,
    #[serde(default)]
    pub data_length: i64,
    #[serde(default = "unknown_length")]
    pub encoded_data_length: i64,
}

/// `Network.loadingFinished`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoadingFinishedParams {
    pub request_id: RequestId,
    pub timestamp: MonotonicTime,
    #[serde(default = "unknown_length_f64")]
    pub encoded_data_length: f64,
}

/// `Network.loadingFailed`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoadingFailedParams {
    pub request_id: RequestId,
    pub timestamp: MonotonicTime,
    #[serde(rename = "type", default)]
    pub resource_type: ResourceType,
    #[serde(alias = "localizedDescription", default)]
    pub error_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canceled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
}

/// `Network.webSocketCreated`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketCreatedParams {
    pub request_id: RequestId,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiator: Option<Initiator>,
}

/// `Network.webSocketWillSendHandshakeRequest`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketWillSendHandshakeRequestParams {
    pub request_id: RequestId,
    pub timestamp: MonotonicTime,
    #[serde(default)]
    pub wall_time: TimeSinceEpoch,
    #[serde(default)]
    pub request: WebSocketRequest,
}

/// `Network.webSocketHandshakeResponseReceived`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketHandshakeResponseReceivedParams {
    pub request_id: RequestId,
    pub timestamp: MonotonicTime,
    #[serde(default)]
    pub response: WebSocketResponse,
}

/// `Network.webSocketFrameReceived` and `Network.webSocketFrameSent`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketFrameParams {
    pub request_id: RequestId,
    pub timestamp: MonotonicTime,
    #[serde(default)]
    pub response: WebSocketFrame,
}

/// `Network.webSocketFrameError`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketFrameErrorParams {
    pub request_id: RequestId,
    pub timestamp: MonotonicTime,
    #[serde(default)]
    pub error_message: String,
}

/// `Network.webSocketClosed`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketClosedParams {
    pub request_id: RequestId,
    pub timestamp: MonotonicTime,
}

/// `Network.eventSourceMessageReceived`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventSourceMessageReceivedParams {
    pub request_id: RequestId,
    pub timestamp: MonotonicTime,
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub data: String,
}

fn unknown_length() -> i64 {
    -1
}

fn unknown_length_f64() -> f64 {
    -1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_id() {
        let id = RequestId("req-123".to_string());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"req-123\"");
    }

    #[test]
    fn test_resource_type() {
        let rt = ResourceType::Document;
        let json = serde_json::to_string(&rt).unwrap();
        assert_eq!(json, "\"Document\"");
    }

    #[test]
    fn test_unknown_resource_type_is_other() {
        let rt: ResourceType = serde_json::from_value(json!("Prefetch")).unwrap();
        assert_eq!(rt, ResourceType::Other);
    }

    #[test]
    fn test_resource_type_categories() {
        assert_eq!(ResourceType::Fetch.category(), ResourceCategory::XHR);
        assert_eq!(ResourceType::TextTrack.category(), ResourceCategory::Other);
        assert_eq!(ResourceType::WebSocket.category().short_title(), "WS");
        assert!(ResourceType::Script.is_text_type());
        assert!(!ResourceType::Image.is_text_type());
    }

    #[test]
    fn test_response_decodes_with_missing_fields() {
        let response: Response = serde_json::from_value(json!({
            "url": "https://example.com/",
            "status": 200,
            "remoteIPAddress": "10.0.0.1",
            "remotePort": 443
        }))
        .unwrap();

        assert_eq!(response.status, 200);
        assert!(response.headers.is_empty());
        assert_eq!(response.remote_ip_address.as_deref(), Some("10.0.0.1"));
        assert!(response.timing.is_none());
    }

    #[test]
    fn test_null_or_malformed_headers_decode_as_empty() {
        let request: Request =
            serde_json::from_value(json!({"url": "https://example.com/", "headers": null})).unwrap();
        assert!(request.headers.is_empty());

        let response: WebSocketResponse =
            serde_json::from_value(json!({"status": 101, "headers": "garbage"})).unwrap();
        assert_eq!(response.status, 101);
        assert!(response.headers.is_empty());

        let handshake: WebSocketRequest = serde_json::from_value(json!({"headers": null})).unwrap();
        assert!(handshake.headers.is_empty());
    }

    #[test]
    fn test_loading_failed_accepts_localized_description() {
        let params: LoadingFailedParams = serde_json::from_value(json!({
            "requestId": "1",
            "timestamp": 2.0,
            "type": "Script",
            "localizedDescription": "net::ERR_FAILED"
        }))
        .unwrap();

        assert_eq!(params.error_text, "net::ERR_FAILED");
        assert_eq!(params.resource_type, ResourceType::Script);
    }

    #[test]
    fn test_data_received_defaults_unknown_encoded_length() {
        let params: DataReceivedParams = serde_json::from_value(json!({
            "requestId": "1",
            "timestamp": 1.0,
            "dataLength": 10
        }))
        .unwrap();

        assert_eq!(params.encoded_data_length, -1);
    }

    #[test]
    fn test_initiator_stack() {
        let initiator: Initiator = serde_json::from_value(json!({
            "type": "script",
            "stack": {"callFrames": [{"url": "https://a.com/app.js", "lineNumber": 3, "columnNumber": 7}]}
        }))
        .unwrap();

        assert_eq!(initiator.initiator_type, InitiatorType::Script);
        assert_eq!(initiator.stack.unwrap().call_frames[0].column_number, 7);
    }
}
