//! Network notification dispatcher
//!
//! Applies `Network.*` notifications to request records, maintains the
//! in-flight registry and the request log, and publishes tracker events.

use crate::config::TrackerConfig;
use crate::content::ContentLoader;
use crate::error::Result;
use crate::events::{DroppedUpdate, NetworkEvent};
use crate::frames::EventSourceMessage;
use crate::headers::headers_map_to_list;
use crate::mime;
use crate::notification::NetworkNotification;
use crate::redirect;
use crate::registry::InflightRegistry;
use crate::request::{NetworkRequest, RequestRef};
use cdp_types::domains::console::{ConsoleMessage, ConsoleMessageLevel};
use cdp_types::domains::network::*;
use cdp_types::CdpEvent;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, warn};

/// Tracks network activity of one inspected target
#[derive(Debug)]
pub struct NetworkDispatcher {
    config: TrackerConfig,
    registry: InflightRegistry,
    content: ContentLoader,
    /// Every record started since the last clear, in start order
    requests: Vec<RequestRef>,
}

impl NetworkDispatcher {
    /// Create a dispatcher
    ///
    /// # Arguments
    /// * `config` - Tracker configuration
    /// * `registry` - In-flight registry the dispatcher owns from now on
    /// * `content` - Loader used for response bodies
    pub fn new(config: TrackerConfig, registry: InflightRegistry, content: ContentLoader) -> Self {
        Self {
            config,
            registry,
            content,
            requests: Vec::new(),
        }
    }

    /// Dispatcher with a fresh registry sized from `config`
    pub fn with_config(config: TrackerConfig, content: ContentLoader) -> Self {
        let registry = InflightRegistry::new(config.event_capacity());
        Self::new(config, registry, content)
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn subscribe(&mut self) -> broadcast::Receiver<NetworkEvent> {
        self.registry.subscribe()
    }

    pub fn registry(&self) -> &InflightRegistry {
        &self.registry
    }

    pub fn inflight_request_for_id(&self, request_id: &str) -> Option<RequestRef> {
        self.registry.by_id(request_id)
    }

    pub fn inflight_request_for_url(&self, url: &str) -> Option<RequestRef> {
        self.registry.by_url(url)
    }

    /// All records started since the last [`clear`](Self::clear)
    pub fn requests(&self) -> &[RequestRef] {
        &self.requests
    }

    /// Forget every record, in flight or not
    pub fn clear(&mut self) {
        debug!("Clearing {} network requests", self.requests.len());
        self.registry.clear();
        self.requests.clear();
    }

    /// Ask for the response body of `request`
    pub fn request_content(&self, request: &RequestRef) -> oneshot::Receiver<Option<String>> {
        self.content.request_content(request)
    }

    /// Decode and apply a raw protocol event
    ///
    /// # Errors
    /// Returns an error only when the event is not a tracked `Network.*`
    /// notification or its params fail to decode.
    pub fn dispatch_event(&mut self, event: &CdpEvent) -> Result<()> {
        let notification = NetworkNotification::from_event(event)?;
        self.dispatch(notification);
        Ok(())
    }

    /// Apply one notification
    pub fn dispatch(&mut self, notification: NetworkNotification) {
        debug!(
            "Dispatching {} for request {}",
            notification.method(),
            notification.request_id()
        );

        match notification {
            NetworkNotification::RequestWillBeSent(params) => self.request_will_be_sent(params),
            NetworkNotification::RequestServedFromCache(params) => {
                self.request_served_from_cache(params)
            }
            NetworkNotification::ResponseReceived(params) => self.response_received(params),
            NetworkNotification::DataReceived(params) => self.data_received(params),
            NetworkNotification::LoadingFinished(params) => self.loading_finished(params),
            NetworkNotification::LoadingFailed(params) => self.loading_failed(params),
            NetworkNotification::WebSocketCreated(params) => self.web_socket_created(params),
            NetworkNotification::WebSocketWillSendHandshakeRequest(params) => {
                self.web_socket_will_send_handshake_request(params)
            }
            NetworkNotification::WebSocketHandshakeResponseReceived(params) => {
                self.web_socket_handshake_response_received(params)
            }
            NetworkNotification::WebSocketFrameReceived(params) => {
                self.web_socket_frame(params, false)
            }
            NetworkNotification::WebSocketFrameSent(params) => self.web_socket_frame(params, true),
            NetworkNotification::WebSocketFrameError(params) => {
                self.web_socket_frame_error(params)
            }
            NetworkNotification::WebSocketClosed(params) => self.web_socket_closed(params),
            NetworkNotification::EventSourceMessageReceived(params) => {
                self.event_source_message_received(params)
            }
        }
    }

    // =========================================================================
    // HTTP lifecycle
    // =========================================================================

    fn request_will_be_sent(&mut self, params: RequestWillBeSentParams) {
        let request_id = params.request_id.as_str();

        let request = match self.registry.by_id(request_id) {
            Some(existing) => {
                let Some(redirect_response) = params.redirect_response.clone() else {
                    debug!("Ignoring duplicate requestWillBeSent for {}", request_id);
                    return;
                };
                self.response_received(ResponseReceivedParams {
                    request_id: params.request_id.clone(),
                    frame_id: params.frame_id.clone(),
                    loader_id: params.loader_id.clone(),
                    timestamp: params.timestamp,
                    resource_type: ResourceType::Other,
                    response: redirect_response,
                });
                let page_domain = self.page_domain();
                let hop = redirect::splice(
                    &mut self.registry,
                    existing,
                    params.timestamp,
                    &params.request.url,
                    self.config.request_event_capacity(),
                    page_domain,
                );
                self.content.on_finished(&hop.previous);
                hop.request
            }
            None => self.create_request(
                request_id,
                &params.request.url,
                &params.document_url,
                &params.frame_id,
                &params.loader_id,
                params.initiator.clone(),
            ),
        };

        {
            let mut record = request.write();
            record.has_network_data = true;
            update_request_with_request(&mut record, &params.request);
            record.set_issue_time(params.timestamp, params.wall_time);
            record.set_resource_type(params.resource_type.unwrap_or_default());
        }

        self.start_request(request);
    }

    fn request_served_from_cache(&mut self, params: RequestServedFromCacheParams) {
        let Some(request) = self.inflight(&params.request_id) else {
            return;
        };
        request.write().set_from_memory_cache();
        self.registry.update(&request);
    }

    fn response_received(&mut self, params: ResponseReceivedParams) {
        let Some(request) = self.registry.by_id(params.request_id.as_str()) else {
            warn!(
                "Response for unknown request {}: {}",
                params.request_id, params.response.url
            );
            self.registry
                .emit(NetworkEvent::RequestUpdateDropped(DroppedUpdate {
                    url: params.response.url.clone(),
                    frame_id: params.frame_id.clone(),
                    loader_id: params.loader_id.clone(),
                    resource_type: params.resource_type,
                    mime_type: params.response.mime_type.clone(),
                }));
            return;
        };

        let old_url = request.read().url().to_string();
        let mismatch = {
            let mut record = request.write();
            record.set_response_received_time(params.timestamp);
            record.set_resource_type(params.resource_type);
            update_request_with_response(&mut record, &params.response);

            let consistent = mime::is_consistent(
                record.resource_type(),
                &record.mime_type,
                record.status_code,
            );
            (self.config.check_mime_types() && !consistent).then(|| {
                mime::mismatch_message(
                    record.resource_type(),
                    &record.mime_type,
                    record.url(),
                    record.request_id(),
                )
            })
        };
        self.registry.reindex_url(&old_url, &request);

        self.registry.update(&request);
        self.registry
            .emit(NetworkEvent::ResponseReceived(request.clone()));

        if let Some(message) = mismatch {
            info!("{}", message.text);
            self.registry.emit(NetworkEvent::ConsoleMessage(message));
        }
    }

    fn data_received(&mut self, params: DataReceivedParams) {
        let Some(request) = self.inflight(&params.request_id) else {
            return;
        };
        {
            let mut record = request.write();
            record.add_resource_size(params.data_length.max(0) as u64);
            if params.encoded_data_length >= 0 {
                record.increase_transfer_size(params.encoded_data_length as u64);
            }
            record.set_end_time(params.timestamp);
        }
        self.registry.update(&request);
    }

    fn loading_finished(&mut self, params: LoadingFinishedParams) {
        let Some(request) = self.inflight(&params.request_id) else {
            return;
        };
        let encoded_data_length =
            (params.encoded_data_length >= 0.0).then_some(params.encoded_data_length as u64);
        self.finish_request(&request, params.timestamp, encoded_data_length);
    }

    fn loading_failed(&mut self, params: LoadingFailedParams) {
        let Some(request) = self.inflight(&params.request_id) else {
            return;
        };
        let blocked_by_inspector = {
            let mut record = request.write();
            record.failed = true;
            record.set_resource_type(params.resource_type);
            record.canceled = params.canceled.unwrap_or(false);
            record.localized_fail_description = Some(params.error_text.clone());
            record.blocked_reason = params.blocked_reason.clone();
            (params.blocked_reason.as_deref() == Some("inspector")).then(|| {
                ConsoleMessage::network(
                    ConsoleMessageLevel::Warning,
                    format!("Request was blocked by DevTools: \"{}\".", record.url()),
                    record.url(),
                    record.request_id(),
                )
            })
        };
        debug!(
            "Request {} failed: {}",
            params.request_id, params.error_text
        );
        if let Some(message) = blocked_by_inspector {
            self.registry.emit(NetworkEvent::ConsoleMessage(message));
        }
        self.finish_request(&request, params.timestamp, None);
    }

    // =========================================================================
    // WebSocket and EventSource
    // =========================================================================

    fn web_socket_created(&mut self, params: WebSocketCreatedParams) {
        let request = self.create_request(
            params.request_id.as_str(),
            &params.url,
            "",
            "",
            "",
            params.initiator,
        );
        request.write().set_resource_type(ResourceType::WebSocket);
        self.start_request(request);
    }

    fn web_socket_will_send_handshake_request(
        &mut self,
        params: WebSocketWillSendHandshakeRequestParams,
    ) {
        let Some(request) = self.inflight(&params.request_id) else {
            return;
        };
        {
            let mut record = request.write();
            record.request_method = "GET".to_string();
            record.set_request_headers(headers_map_to_list(&params.request.headers));
            record.set_issue_time(params.timestamp, params.wall_time);
        }
        self.registry.update(&request);
    }

    fn web_socket_handshake_response_received(
        &mut self,
        params: WebSocketHandshakeResponseReceivedParams,
    ) {
        let Some(request) = self.inflight(&params.request_id) else {
            return;
        };
        {
            let mut record = request.write();
            let response = params.response;
            record.status_code = response.status;
            record.status_text = response.status_text;
            record.set_response_headers(headers_map_to_list(&response.headers));
            if let Some(text) = response.headers_text {
                record.set_response_headers_text(text);
            }
            if let Some(headers) = &response.request_headers {
                record.set_request_headers(headers_map_to_list(headers));
            }
            if let Some(text) = response.request_headers_text {
                record.set_request_headers_text(text);
            }
            record.set_response_received_time(params.timestamp);
            record.protocol = Some("websocket".to_string());
        }
        self.registry.update(&request);
    }

    fn web_socket_frame(&mut self, params: WebSocketFrameParams, sent: bool) {
        let Some(request) = self.inflight(&params.request_id) else {
            return;
        };
        {
            let mut record = request.write();
            record.add_frame(&params.response, params.timestamp, sent);
            record.set_response_received_time(params.timestamp);
        }
        self.registry.update(&request);
    }

    fn web_socket_frame_error(&mut self, params: WebSocketFrameErrorParams) {
        let Some(request) = self.inflight(&params.request_id) else {
            return;
        };
        {
            let mut record = request.write();
            record.add_frame_error(&params.error_message, params.timestamp);
            record.set_response_received_time(params.timestamp);
        }
        self.registry.update(&request);
    }

    fn web_socket_closed(&mut self, params: WebSocketClosedParams) {
        let Some(request) = self.inflight(&params.request_id) else {
            return;
        };
        self.finish_request(&request, params.timestamp, None);
    }

    fn event_source_message_received(&mut self, params: EventSourceMessageReceivedParams) {
        let Some(request) = self.inflight(&params.request_id) else {
            return;
        };
        request.write().add_event_source_message(EventSourceMessage {
            time: params.timestamp,
            event_name: params.event_name,
            event_id: params.event_id,
            data: params.data,
        });
        self.registry.update(&request);
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn inflight(&self, request_id: &RequestId) -> Option<RequestRef> {
        let request = self.registry.by_id(request_id.as_str());
        if request.is_none() {
            debug!("No request in flight for {}", request_id);
        }
        request
    }

    fn page_domain(&self) -> Option<String> {
        self.config.inspected_page_domain().map(str::to_string)
    }

    fn create_request(
        &self,
        request_id: &str,
        url: &str,
        document_url: &str,
        frame_id: &str,
        loader_id: &str,
        initiator: Option<Initiator>,
    ) -> RequestRef {
        NetworkRequest::new(request_id, url, document_url, frame_id, loader_id, initiator)
            .with_event_capacity(self.config.request_event_capacity())
            .with_inspected_page_domain(self.page_domain())
            .into_ref()
    }

    fn start_request(&mut self, request: RequestRef) {
        self.registry.start(&request);
        self.requests.push(request);
    }

    fn finish_request(&mut self, request: &RequestRef, time: f64, encoded_data_length: Option<u64>) {
        self.registry.finish(request, time, encoded_data_length);
        self.content.on_finished(request);
    }
}

fn update_request_with_request(record: &mut NetworkRequest, request: &Request) {
    record.request_method = request.method.clone();
    record.set_request_headers(headers_map_to_list(&request.headers));
    record.set_request_form_data(request.post_data.clone());
    record.initial_priority = request.initial_priority.clone();
    record.mixed_content_type = request.mixed_content_type.clone();
}

fn update_request_with_response(record: &mut NetworkRequest, response: &Response) {
    if !response.url.is_empty() {
        record.set_url(&response.url);
    }
    record.mime_type = response.mime_type.clone();
    record.status_code = response.status;
    record.status_text = response.status_text.clone();
    record.set_response_headers(headers_map_to_list(&response.headers));
    if response.encoded_data_length >= 0.0 {
        record.set_transfer_size(response.encoded_data_length as u64);
    }
    if let Some(text) = &response.headers_text {
        record.set_response_headers_text(text.clone());
    }
    if let Some(headers) = &response.request_headers {
        record.set_request_headers(headers_map_to_list(headers));
    }
    if let Some(text) = &response.request_headers_text {
        record.set_request_headers_text(text.clone());
    }

    record.connection_reused = response.connection_reused;
    record.connection_id = response.connection_id.to_string();
    if let Some(ip) = &response.remote_ip_address {
        record.set_remote_address(ip, response.remote_port.unwrap_or(0));
    }
    if response.from_service_worker {
        record.fetched_via_service_worker = true;
    }
    if response.from_disk_cache {
        record.set_from_disk_cache();
    }
    record.set_timing(response.timing.clone());
    record.protocol = response.protocol.clone();
    record.security_state = response.security_state.clone();
}
