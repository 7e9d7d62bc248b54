//! WebSocket frame and EventSource message records

use serde::{Deserialize, Serialize};

/// WebSocket frame opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebSocketOpcode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
}

impl WebSocketOpcode {
    /// Convert from the raw opcode value. Reserved values yield `None`.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(WebSocketOpcode::Continuation),
            1 => Some(WebSocketOpcode::Text),
            2 => Some(WebSocketOpcode::Binary),
            8 => Some(WebSocketOpcode::Close),
            9 => Some(WebSocketOpcode::Ping),
            10 => Some(WebSocketOpcode::Pong),
            _ => None,
        }
    }
}

/// Direction of a recorded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameDirection {
    Send,
    Receive,
    Error,
}

/// One WebSocket frame (or frame error) observed on a connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketFrameRecord {
    pub direction: FrameDirection,
    /// Frame payload, or the error message for error frames
    pub payload: String,
    /// Raw opcode; absent on error frames
    pub opcode: Option<u8>,
    pub mask: bool,
    pub time: f64,
}

impl WebSocketFrameRecord {
    pub fn data(direction: FrameDirection, payload: String, opcode: u8, mask: bool, time: f64) -> Self {
        Self {
            direction,
            payload,
            opcode: Some(opcode),
            mask,
            time,
        }
    }

    pub fn error(message: String, time: f64) -> Self {
        Self {
            direction: FrameDirection::Error,
            payload: message,
            opcode: None,
            mask: false,
            time,
        }
    }

    /// Decoded opcode, if it is a known value
    pub fn opcode_kind(&self) -> Option<WebSocketOpcode> {
        self.opcode.and_then(WebSocketOpcode::from_u8)
    }
}

/// One message delivered over an EventSource stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSourceMessage {
    pub time: f64,
    pub event_name: String,
    pub event_id: String,
    pub data: String,
}
