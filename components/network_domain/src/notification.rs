//! Typed Network domain notifications

use crate::error::{NetworkError, Result};
use cdp_types::domains::network::*;
use cdp_types::CdpEvent;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// One decoded `Network.*` notification
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkNotification {
    RequestWillBeSent(RequestWillBeSentParams),
    RequestServedFromCache(RequestServedFromCacheParams),
    ResponseReceived(ResponseReceivedParams),
    DataReceived(DataReceivedParams),
    LoadingFinished(LoadingFinishedParams),
    LoadingFailed(LoadingFailedParams),
    WebSocketCreated(WebSocketCreatedParams),
    WebSocketWillSendHandshakeRequest(WebSocketWillSendHandshakeRequestParams),
    WebSocketHandshakeResponseReceived(WebSocketHandshakeResponseReceivedParams),
    WebSocketFrameReceived(WebSocketFrameParams),
    WebSocketFrameSent(WebSocketFrameParams),
    WebSocketFrameError(WebSocketFrameErrorParams),
    WebSocketClosed(WebSocketClosedParams),
    EventSourceMessageReceived(EventSourceMessageReceivedParams),
}

impl NetworkNotification {
    /// Decode a protocol event
    ///
    /// # Errors
    /// `UnknownEvent` for events outside the Network domain or not tracked,
    /// `InvalidParams` when the parameters do not match the event.
    pub fn from_event(event: &CdpEvent) -> Result<Self> {
        if event.domain() != "Network" {
            return Err(NetworkError::UnknownEvent(event.method.clone()));
        }

        let params = &event.params;
        let notification = match event.event_name() {
            "requestWillBeSent" => Self::RequestWillBeSent(decode(params)?),
            "requestServedFromCache" => Self::RequestServedFromCache(decode(params)?),
            "responseReceived" => Self::ResponseReceived(decode(params)?),
            "dataReceived" => Self::DataReceived(decode(params)?),
            "loadingFinished" => Self::LoadingFinished(decode(params)?),
            "loadingFailed" => Self::LoadingFailed(decode(params)?),
            "webSocketCreated" => Self::WebSocketCreated(decode(params)?),
            "webSocketWillSendHandshakeRequest" => {
                Self::WebSocketWillSendHandshakeRequest(decode(params)?)
            }
            "webSocketHandshakeResponseReceived" => {
                Self::WebSocketHandshakeResponseReceived(decode(params)?)
            }
            "webSocketFrameReceived" => Self::WebSocketFrameReceived(decode(params)?),
            "webSocketFrameSent" => Self::WebSocketFrameSent(decode(params)?),
            "webSocketFrameError" => Self::WebSocketFrameError(decode(params)?),
            "webSocketClosed" => Self::WebSocketClosed(decode(params)?),
            "eventSourceMessageReceived" => Self::EventSourceMessageReceived(decode(params)?),
            _ => return Err(NetworkError::UnknownEvent(event.method.clone())),
        };
        Ok(notification)
    }

    /// Protocol method name of this notification
    pub fn method(&self) -> &'static str {
        match self {
            Self::RequestWillBeSent(_) => "Network.requestWillBeSent",
            Self::RequestServedFromCache(_) => "Network.requestServedFromCache",
            Self::ResponseReceived(_) => "Network.responseReceived",
            Self::DataReceived(_) => "Network.dataReceived",
            Self::LoadingFinished(_) => "Network.loadingFinished",
            Self::LoadingFailed(_) => "Network.loadingFailed",
            Self::WebSocketCreated(_) => "Network.webSocketCreated",
            Self::WebSocketWillSendHandshakeRequest(_) => {
                "Network.webSocketWillSendHandshakeRequest"
            }
            Self::WebSocketHandshakeResponseReceived(_) => {
                "Network.webSocketHandshakeResponseReceived"
            }
            Self::WebSocketFrameReceived(_) => "Network.webSocketFrameReceived",
            Self::WebSocketFrameSent(_) => "Network.webSocketFrameSent",
            Self::WebSocketFrameError(_) => "Network.webSocketFrameError",
            Self::WebSocketClosed(_) => "Network.webSocketClosed",
            Self::EventSourceMessageReceived(_) => "Network.eventSourceMessageReceived",
        }
    }

    pub fn request_id(&self) -> &RequestId {
        match self {
            Self::RequestWillBeSent(p) => &p.request_id,
            Self::RequestServedFromCache(p) => &p.request_id,
            Self::ResponseReceived(p) => &p.request_id,
            Self::DataReceived(p) => &p.request_id,
            Self::LoadingFinished(p) => &p.request_id,
            Self::LoadingFailed(p) => &p.request_id,
            Self::WebSocketCreated(p) => &p.request_id,
            Self::WebSocketWillSendHandshakeRequest(p) => &p.request_id,
            Self::WebSocketHandshakeResponseReceived(p) => &p.request_id,
            Self::WebSocketFrameReceived(p) | Self::WebSocketFrameSent(p) => &p.request_id,
            Self::WebSocketFrameError(p) => &p.request_id,
            Self::WebSocketClosed(p) => &p.request_id,
            Self::EventSourceMessageReceived(p) => &p.request_id,
        }
    }
}

fn decode<T: DeserializeOwned>(params: &Value) -> Result<T> {
    Ok(T::deserialize(params)?)
}
