//! Network activity log for CortenBrowser DevTools
//!
//! A shareable front for the network tracker: feed it the raw protocol
//! messages arriving from an inspected target and query the resulting
//! request records from any task.
//!
//! # Example
//!
//! ```
//! use corten_netlog::{NetworkLog, TrackerConfig};
//!
//! # tokio_test::block_on(async {
//! let log = NetworkLog::new(TrackerConfig::default(), None);
//! let applied = log
//!     .handle_message(r#"{"method":"Network.requestWillBeSent","params":{"requestId":"1","request":{"url":"https://example.com/"},"timestamp":1.0}}"#)
//!     .await
//!     .unwrap();
//! assert!(applied);
//! assert_eq!(log.requests().await.len(), 1);
//! # });
//! ```

#![warn(missing_docs)]

use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

pub use cdp_types;
pub use network_domain::{
    ContentLoader, NetworkDispatcher, NetworkError, NetworkEvent, NetworkNotification,
    NetworkRequest, RequestEvent, RequestRef, ResponseBody, ResponseBodyProvider, Result,
    TrackerConfig,
};

use cdp_types::CdpEvent;
use serde_json::Value;

/// Network log of one inspected target
#[derive(Clone)]
pub struct NetworkLog {
    dispatcher: Arc<RwLock<NetworkDispatcher>>,
}

impl NetworkLog {
    /// Create a log
    ///
    /// # Arguments
    ///
    /// * `config` - Tracker configuration
    /// * `provider` - Source of response bodies; without one, content
    ///   requests resolve to `None`
    pub fn new(config: TrackerConfig, provider: Option<Arc<dyn ResponseBodyProvider>>) -> Self {
        let content = match provider {
            Some(provider) => ContentLoader::new(provider),
            None => ContentLoader::detached(),
        };
        Self {
            dispatcher: Arc::new(RwLock::new(NetworkDispatcher::with_config(config, content))),
        }
    }

    /// Apply one raw protocol message.
    ///
    /// Returns `Ok(true)` when the message was a Network notification and
    /// was applied, `Ok(false)` for command responses and events of other
    /// domains.
    ///
    /// # Errors
    ///
    /// Malformed JSON, unknown Network events and undecodable params.
    pub async fn handle_message(&self, raw: &str) -> Result<bool> {
        let message: Value = serde_json::from_str(raw)?;
        if message.get("id").is_some() || message.get("method").is_none() {
            return Ok(false);
        }

        let event: CdpEvent = serde_json::from_value(message)?;
        if event.domain() != "Network" {
            debug!("Skipping {} event", event.method);
            return Ok(false);
        }

        self.dispatcher.write().await.dispatch_event(&event)?;
        Ok(true)
    }

    /// Apply a decoded notification
    pub async fn dispatch(&self, notification: NetworkNotification) {
        self.dispatcher.write().await.dispatch(notification);
    }

    /// Subscribe to tracker events
    pub async fn subscribe(&self) -> broadcast::Receiver<NetworkEvent> {
        self.dispatcher.write().await.subscribe()
    }

    /// Every request started since the last clear
    pub async fn requests(&self) -> Vec<RequestRef> {
        self.dispatcher.read().await.requests().to_vec()
    }

    /// In-flight request with the given id
    pub async fn request_for_id(&self, request_id: &str) -> Option<RequestRef> {
        self.dispatcher.read().await.inflight_request_for_id(request_id)
    }

    /// In-flight request for the given URL
    pub async fn request_for_url(&self, url: &str) -> Option<RequestRef> {
        self.dispatcher.read().await.inflight_request_for_url(url)
    }

    /// Response body of `request`, waiting for the request to finish if
    /// needed
    pub async fn request_content(&self, request: &RequestRef) -> Option<String> {
        let receiver = self.dispatcher.read().await.request_content(request);
        receiver.await.ok().flatten()
    }

    /// Forget all requests
    pub async fn clear(&self) {
        self.dispatcher.write().await.clear();
    }
}
