//! Lazy, coalesced response body retrieval
//!
//! Bodies are fetched at most once per record through a
//! [`ResponseBodyProvider`]. Callers asking before the record finishes are
//! queued and served together once the fetch completes.

use crate::error::NetworkError;
use crate::request::RequestRef;
use async_trait::async_trait;
use cdp_types::domains::network::ResourceCategory;
use cdp_types::CdpError;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Response body as returned by the target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseBody {
    pub body: String,
    pub base64_encoded: bool,
}

impl ResponseBody {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            base64_encoded: false,
        }
    }
}

/// Source of response bodies, typically a `Network.getResponseBody` call
/// on the target connection
#[async_trait]
pub trait ResponseBodyProvider: Send + Sync {
    async fn get_response_body(&self, request_id: &str) -> Result<ResponseBody, CdpError>;
}

/// Schedules body fetches for records
#[derive(Clone, Default)]
pub struct ContentLoader {
    provider: Option<Arc<dyn ResponseBodyProvider>>,
}

impl fmt::Debug for ContentLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentLoader")
            .field("has_provider", &self.provider.is_some())
            .finish()
    }
}

impl ContentLoader {
    pub fn new(provider: Arc<dyn ResponseBodyProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Loader without a provider; every fetch resolves to no content
    pub fn detached() -> Self {
        Self { provider: None }
    }

    /// Ask for the body of `request`.
    ///
    /// WebSocket records never have content. Already resolved content is
    /// returned immediately. Otherwise the caller is queued, and the fetch
    /// starts right away if the record has finished loading.
    pub fn request_content(&self, request: &RequestRef) -> oneshot::Receiver<Option<String>> {
        let (tx, rx) = oneshot::channel();

        let start_fetch = {
            let mut record = request.write();
            if record.resource_category() == ResourceCategory::WebSocket {
                let _ = tx.send(None);
                return rx;
            }
            if let Some(resolved) = record.resolved_content() {
                let _ = tx.send(resolved);
                return rx;
            }
            record.push_content_waiter(tx);
            record.finished() && record.begin_content_fetch()
        };

        if start_fetch {
            self.fetch(request.clone());
        }
        rx
    }

    /// Start the pending fetch of a record that has just finished
    pub fn on_finished(&self, request: &RequestRef) {
        let start_fetch = {
            let mut record = request.write();
            record.has_content_waiters() && record.begin_content_fetch()
        };

        if start_fetch {
            self.fetch(request.clone());
        }
    }

    fn fetch(&self, request: RequestRef) {
        let request_id = request.read().request_id().to_string();

        let Some(provider) = self.provider.clone() else {
            debug!("No body provider for request {}", request_id);
            resolve(&request, Err(NetworkError::ContentUnavailable(request_id).into()));
            return;
        };

        match Handle::try_current() {
            Ok(handle) => {
                debug!("Fetching content for request {}", request_id);
                handle.spawn(async move {
                    let result = provider.get_response_body(&request_id).await;
                    if let Err(e) = &result {
                        warn!("Content fetch failed for request {}: {}", request_id, e);
                    }
                    resolve(&request, result);
                });
            }
            Err(_) => {
                warn!("No tokio runtime to fetch content for request {}", request_id);
                resolve(&request, Err(NetworkError::NoRuntime(request_id).into()));
            }
        }
    }
}

fn resolve(request: &RequestRef, result: Result<ResponseBody, CdpError>) {
    let (value, waiters) = request.write().resolve_content(result);
    for waiter in waiters {
        let _ = waiter.send(value.clone());
    }
}
