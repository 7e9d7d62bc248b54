//! Event types and the broadcast emitter shared by the tracker and records

use crate::frames::WebSocketFrameRecord;
use crate::request::RequestRef;
use cdp_types::domains::console::ConsoleMessage;
use cdp_types::domains::network::ResourceType;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Lazily created broadcast channel.
///
/// The channel is only allocated on first subscription, so emitting on a
/// record nobody observes costs nothing.
#[derive(Debug)]
pub struct EventEmitter<T: Clone> {
    sender: Option<broadcast::Sender<T>>,
    capacity: usize,
}

impl<T: Clone> EventEmitter<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            sender: None,
            capacity: capacity.max(1),
        }
    }

    pub fn subscribe(&mut self) -> broadcast::Receiver<T> {
        let capacity = self.capacity;
        self.sender
            .get_or_insert_with(|| broadcast::channel(capacity).0)
            .subscribe()
    }

    /// Deliver `event` to current subscribers. Without subscribers the
    /// event is dropped.
    pub fn emit(&self, event: T) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }

    pub fn receiver_count(&self) -> usize {
        self.sender
            .as_ref()
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

/// Summary of a notification that named an unknown request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedUpdate {
    pub url: String,
    pub frame_id: String,
    pub loader_id: String,
    pub resource_type: ResourceType,
    pub mime_type: String,
}

/// Events published by the tracker
#[derive(Debug, Clone)]
pub enum NetworkEvent {
    /// A record entered the in-flight set
    RequestStarted(RequestRef),
    /// An in-flight record changed
    RequestUpdated(RequestRef),
    /// A record received its response metadata
    ResponseReceived(RequestRef),
    /// A record finished loading, failed or was closed
    RequestFinished(RequestRef),
    /// A response arrived for a request id that is not in flight
    RequestUpdateDropped(DroppedUpdate),
    /// An advisory message about a request
    ConsoleMessage(ConsoleMessage),
}

/// Events published by an individual record
#[derive(Debug, Clone, PartialEq)]
pub enum RequestEvent {
    FinishedLoading,
    TimingChanged,
    RemoteAddressChanged,
    RequestHeadersChanged,
    ResponseHeadersChanged,
    WebSocketFrameAdded(WebSocketFrameRecord),
}
