//! In-flight request registry
//!
//! Indexes unfinished records by request id and by URL, and publishes the
//! lifecycle events of every record it starts, updates and finishes.

use crate::events::{EventEmitter, NetworkEvent};
use crate::request::RequestRef;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Unfinished records, reachable by id and by URL
#[derive(Debug)]
pub struct InflightRegistry {
    by_id: HashMap<String, RequestRef>,
    by_url: HashMap<String, RequestRef>,
    events: EventEmitter<NetworkEvent>,
}

impl Default for InflightRegistry {
    fn default() -> Self {
        Self::new(256)
    }
}

impl InflightRegistry {
    /// Create a registry whose event channel buffers `event_capacity` events
    pub fn new(event_capacity: usize) -> Self {
        Self {
            by_id: HashMap::new(),
            by_url: HashMap::new(),
            events: EventEmitter::new(event_capacity),
        }
    }

    pub fn subscribe(&mut self) -> broadcast::Receiver<NetworkEvent> {
        self.events.subscribe()
    }

    pub fn emit(&self, event: NetworkEvent) {
        self.events.emit(event);
    }

    pub fn by_id(&self, request_id: &str) -> Option<RequestRef> {
        self.by_id.get(request_id).cloned()
    }

    pub fn by_url(&self, url: &str) -> Option<RequestRef> {
        self.by_url.get(url).cloned()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Index `request` under its current id and URL and announce it
    pub fn start(&mut self, request: &RequestRef) {
        let (id, url) = {
            let record = request.read();
            (record.request_id().to_string(), record.url().to_string())
        };
        debug!("Request {} started: {}", id, url);
        self.by_id.insert(id, request.clone());
        self.by_url.insert(url, request.clone());
        self.events.emit(NetworkEvent::RequestStarted(request.clone()));
    }

    pub fn update(&self, request: &RequestRef) {
        self.events.emit(NetworkEvent::RequestUpdated(request.clone()));
    }

    /// Finish `request` at `time` and drop it from both indexes.
    ///
    /// `encoded_data_length`, when known, replaces the accumulated transfer
    /// size.
    pub fn finish(&mut self, request: &RequestRef, time: f64, encoded_data_length: Option<u64>) {
        let (id, url) = {
            let mut record = request.write();
            record.set_end_time(time);
            record.set_finished(true);
            if let Some(length) = encoded_data_length {
                record.set_transfer_size(length);
            }
            (record.request_id().to_string(), record.url().to_string())
        };
        debug!("Request {} finished", id);
        self.events.emit(NetworkEvent::RequestFinished(request.clone()));
        self.remove_if_same(&id, &url, request);
    }

    /// Re-index `request` under a new URL after its URL changed
    pub fn reindex_url(&mut self, old_url: &str, request: &RequestRef) {
        let new_url = request.read().url().to_string();
        if old_url == new_url {
            return;
        }
        if self
            .by_url
            .get(old_url)
            .is_some_and(|entry| Arc::ptr_eq(entry, request))
        {
            self.by_url.remove(old_url);
        }
        self.by_url.insert(new_url, request.clone());
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
        self.by_url.clear();
    }

    fn remove_if_same(&mut self, id: &str, url: &str, request: &RequestRef) {
        if self
            .by_id
            .get(id)
            .is_some_and(|entry| Arc::ptr_eq(entry, request))
        {
            self.by_id.remove(id);
        }
        if self
            .by_url
            .get(url)
            .is_some_and(|entry| Arc::ptr_eq(entry, request))
        {
            self.by_url.remove(url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::NetworkRequest;

    fn record(id: &str, url: &str) -> RequestRef {
        NetworkRequest::new(id, url, "", "F", "L", None).into_ref()
    }

    #[test]
    fn test_start_indexes_both_ways() {
        let mut registry = InflightRegistry::default();
        let request = record("1", "https://a.com/");
        registry.start(&request);

        assert!(Arc::ptr_eq(&registry.by_id("1").unwrap(), &request));
        assert!(Arc::ptr_eq(&registry.by_url("https://a.com/").unwrap(), &request));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_finish_removes_both_entries() {
        let mut registry = InflightRegistry::default();
        let request = record("1", "https://a.com/");
        registry.start(&request);
        registry.finish(&request, 2.0, Some(10));

        assert!(registry.by_id("1").is_none());
        assert!(registry.by_url("https://a.com/").is_none());
        assert!(registry.is_empty());

        let r = request.read();
        assert!(r.finished());
        assert_eq!(r.end_time(), Some(2.0));
        assert_eq!(r.transfer_size(), 10);
    }

    #[test]
    fn test_finish_keeps_newer_record_with_same_url() {
        let mut registry = InflightRegistry::default();
        let first = record("1", "https://a.com/same");
        let second = record("2", "https://a.com/same");
        registry.start(&first);
        registry.start(&second);

        registry.finish(&first, 1.0, None);

        assert!(Arc::ptr_eq(&registry.by_url("https://a.com/same").unwrap(), &second));
        assert!(registry.by_id("2").is_some());
    }

    #[tokio::test]
    async fn test_lifecycle_events() {
        let mut registry = InflightRegistry::new(8);
        let mut rx = registry.subscribe();
        let request = record("1", "https://a.com/");

        registry.start(&request);
        registry.update(&request);
        registry.finish(&request, 1.0, None);

        assert!(matches!(rx.recv().await.unwrap(), NetworkEvent::RequestStarted(_)));
        assert!(matches!(rx.recv().await.unwrap(), NetworkEvent::RequestUpdated(_)));
        assert!(matches!(rx.recv().await.unwrap(), NetworkEvent::RequestFinished(_)));
    }
}
