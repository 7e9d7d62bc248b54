// Console domain types

use serde::{Deserialize, Serialize};

/// Console message source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleMessageSource {
    Xml,
    Javascript,
    Network,
    #[serde(rename = "console-api")]
    ConsoleApi,
    Security,
    Other,
}

/// Console message level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleMessageLevel {
    Log,
    Warning,
    Error,
    Debug,
    Info,
}

/// Console message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleMessage {
    /// Message source
    pub source: ConsoleMessageSource,
    /// Message severity level
    pub level: ConsoleMessageLevel,
    /// Message text
    pub text: String,
    /// URL of the message origin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Line number in the resource (0-based)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Column number in the resource (0-based)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    /// Network request the message refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ConsoleMessage {
    /// Message attributed to a network request
    pub fn network(
        level: ConsoleMessageLevel,
        text: impl Into<String>,
        url: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            source: ConsoleMessageSource::Network,
            level,
            text: text.into(),
            url: Some(url.into()),
            line: None,
            column: None,
            request_id: Some(request_id.into()),
        }
    }
}
