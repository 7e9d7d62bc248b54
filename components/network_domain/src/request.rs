//! The network request record
//!
//! A `NetworkRequest` accumulates everything known about one network
//! resource load: identity, timing, sizes, headers, redirect chain,
//! WebSocket frames and the lazily fetched response body. Records are
//! shared as [`RequestRef`] so that redirect chains, the in-flight
//! registry and event subscribers all observe the same record.

use crate::content::ResponseBody;
use crate::events::{EventEmitter, RequestEvent};
use crate::frames::{EventSourceMessage, FrameDirection, WebSocketFrameRecord};
use crate::headers::{self, Cookie, NameValue};
use crate::url_parts::{self, NameAndPath, UrlParts};
use cdp_types::domains::network::{
    Initiator, InitiatorType, ResourceCategory, ResourcePriority, ResourceTiming, ResourceType,
    SecurityState, WebSocketFrame,
};
use cdp_types::CdpError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tokio::sync::{broadcast, oneshot};

/// Shared handle to a record
pub type RequestRef = Arc<RwLock<NetworkRequest>>;

const DEFAULT_EVENT_CAPACITY: usize = 64;

/// How a request came to be issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitiatorKind {
    Other,
    Parser,
    Redirect,
    Script,
}

/// Resolved initiator of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatorInfo {
    pub kind: InitiatorKind,
    pub url: Option<String>,
    pub line_number: Option<u32>,
    pub column_number: Option<u32>,
}

#[derive(Debug, Clone)]
struct DerivedUrl {
    parts: UrlParts,
    named: NameAndPath,
    query_string: Option<String>,
    query_parameters: Option<Vec<NameValue>>,
}

#[derive(Debug, Default)]
struct ContentState {
    /// `Some(None)` once a fetch failed or returned nothing
    resolved: Option<Option<String>>,
    error: Option<CdpError>,
    encoded: bool,
    requested: bool,
    waiters: Vec<oneshot::Sender<Option<String>>>,
}

/// One tracked network resource load
#[derive(Debug)]
pub struct NetworkRequest {
    request_id: String,
    url: String,
    document_url: String,
    frame_id: String,
    loader_id: String,
    initiator: Option<Initiator>,
    inspected_page_domain: Option<String>,

    start_time: Option<f64>,
    response_received_time: Option<f64>,
    end_time: Option<f64>,
    issue_time: Option<f64>,
    wall_issue_time: Option<f64>,

    /// HTTP status code, 0 until a response arrives
    pub status_code: u16,
    pub status_text: String,
    pub request_method: String,
    pub mime_type: String,
    pub failed: bool,
    pub canceled: bool,
    pub localized_fail_description: Option<String>,
    pub blocked_reason: Option<String>,
    pub has_network_data: bool,
    pub fetched_via_service_worker: bool,
    pub connection_reused: bool,
    pub connection_id: String,
    pub protocol: Option<String>,
    pub mixed_content_type: Option<String>,
    pub initial_priority: Option<ResourcePriority>,
    pub security_state: Option<SecurityState>,

    resource_type: ResourceType,
    resource_size: u64,
    transfer_size: u64,
    finished: bool,
    from_memory_cache: bool,
    from_disk_cache: bool,
    remote_address: String,
    timing: Option<ResourceTiming>,
    request_form_data: Option<String>,

    request_headers: Vec<NameValue>,
    request_headers_text: Option<String>,
    response_headers: Vec<NameValue>,
    response_headers_text: Option<String>,

    derived_url: OnceLock<DerivedUrl>,
    form_parameters: OnceLock<Option<Vec<NameValue>>>,
    request_cookies: OnceLock<Vec<Cookie>>,
    response_cookies: OnceLock<Vec<Cookie>>,
    initiator_info: OnceLock<InitiatorInfo>,

    redirect_source: Option<RequestRef>,
    redirects: Vec<RequestRef>,

    frames: Vec<WebSocketFrameRecord>,
    event_source_messages: Vec<EventSourceMessage>,
    content: ContentState,
    events: EventEmitter<RequestEvent>,
}

impl NetworkRequest {
    /// Create a record for a request that has just been observed
    ///
    /// # Arguments
    /// * `request_id` - Protocol request identifier
    /// * `url` - Request URL
    /// * `document_url` - URL of the document that issued the request
    /// * `frame_id` - Frame the request belongs to
    /// * `loader_id` - Loader the request belongs to
    /// * `initiator` - What triggered the request, if known
    pub fn new(
        request_id: impl Into<String>,
        url: impl Into<String>,
        document_url: impl Into<String>,
        frame_id: impl Into<String>,
        loader_id: impl Into<String>,
        initiator: Option<Initiator>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            url: url.into(),
            document_url: document_url.into(),
            frame_id: frame_id.into(),
            loader_id: loader_id.into(),
            initiator,
            inspected_page_domain: None,
            start_time: None,
            response_received_time: None,
            end_time: None,
            issue_time: None,
            wall_issue_time: None,
            status_code: 0,
            status_text: String::new(),
            request_method: String::new(),
            mime_type: String::new(),
            failed: false,
            canceled: false,
            localized_fail_description: None,
            blocked_reason: None,
            has_network_data: false,
            fetched_via_service_worker: false,
            connection_reused: false,
            connection_id: "0".to_string(),
            protocol: None,
            mixed_content_type: None,
            initial_priority: None,
            security_state: None,
            resource_type: ResourceType::Other,
            resource_size: 0,
            transfer_size: 0,
            finished: false,
            from_memory_cache: false,
            from_disk_cache: false,
            remote_address: String::new(),
            timing: None,
            request_form_data: None,
            request_headers: Vec::new(),
            request_headers_text: None,
            response_headers: Vec::new(),
            response_headers_text: None,
            derived_url: OnceLock::new(),
            form_parameters: OnceLock::new(),
            request_cookies: OnceLock::new(),
            response_cookies: OnceLock::new(),
            initiator_info: OnceLock::new(),
            redirect_source: None,
            redirects: Vec::new(),
            frames: Vec::new(),
            event_source_messages: Vec::new(),
            content: ContentState::default(),
            events: EventEmitter::new(DEFAULT_EVENT_CAPACITY),
        }
    }

    /// Set the capacity of this record's event channel
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.events = EventEmitter::new(capacity);
        self
    }

    /// Set the page domain trimmed from [`path`](Self::path)
    pub fn with_inspected_page_domain(mut self, domain: Option<String>) -> Self {
        self.inspected_page_domain = domain;
        self.derived_url = OnceLock::new();
        self
    }

    /// Wrap the record into a shared handle
    pub fn into_ref(self) -> RequestRef {
        Arc::new(RwLock::new(self))
    }

    /// Subscribe to changes of this record
    pub fn subscribe(&mut self) -> broadcast::Receiver<RequestEvent> {
        self.events.subscribe()
    }

    // =========================================================================
    // Identity
    // =========================================================================

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub(crate) fn set_request_id(&mut self, request_id: String) {
        self.request_id = request_id;
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Change the URL, discarding everything derived from the old one.
    /// Setting the current URL again is a no-op.
    pub fn set_url(&mut self, url: &str) {
        if self.url == url {
            return;
        }
        self.url = url.to_string();
        self.derived_url = OnceLock::new();
    }

    pub fn document_url(&self) -> &str {
        &self.document_url
    }

    pub fn frame_id(&self) -> &str {
        &self.frame_id
    }

    pub fn loader_id(&self) -> &str {
        &self.loader_id
    }

    pub fn initiator(&self) -> Option<&Initiator> {
        self.initiator.as_ref()
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Display grouping of the resource type
    pub fn resource_category(&self) -> ResourceCategory {
        self.resource_type.category()
    }

    pub fn set_resource_type(&mut self, resource_type: ResourceType) {
        self.resource_type = resource_type;
    }

    // =========================================================================
    // Timing
    // =========================================================================

    pub fn start_time(&self) -> Option<f64> {
        self.start_time
    }

    pub fn response_received_time(&self) -> Option<f64> {
        self.response_received_time
    }

    pub fn set_response_received_time(&mut self, time: f64) {
        self.response_received_time = Some(time);
    }

    pub fn end_time(&self) -> Option<f64> {
        self.end_time
    }

    /// Set the end time.
    ///
    /// With authoritative timing the end time never precedes the response
    /// time. Without it, the response time is pulled back to the end time
    /// when it would otherwise exceed it.
    pub fn set_end_time(&mut self, time: f64) {
        let authoritative = !self.from_memory_cache
            && self
                .timing
                .as_ref()
                .is_some_and(|timing| timing.request_time != 0.0);

        if authoritative {
            let received = self.response_received_time.unwrap_or(time);
            self.end_time = Some(time.max(received));
        } else {
            self.end_time = Some(time);
            if self.response_received_time.is_some_and(|received| received > time) {
                self.response_received_time = Some(time);
            }
        }
        self.events.emit(RequestEvent::TimingChanged);
    }

    /// Time the request was issued; also becomes the start time
    pub fn set_issue_time(&mut self, time: f64, wall_time: f64) {
        self.issue_time = Some(time);
        self.wall_issue_time = Some(wall_time);
        self.start_time = Some(time);
    }

    pub fn issue_time(&self) -> Option<f64> {
        self.issue_time
    }

    pub fn wall_issue_time(&self) -> Option<f64> {
        self.wall_issue_time
    }

    /// Seconds between start and end
    pub fn duration(&self) -> Option<f64> {
        Some(self.end_time? - self.start_time?)
    }

    /// Seconds between start and the arrival of response headers
    pub fn latency(&self) -> Option<f64> {
        Some(self.response_received_time? - self.start_time?)
    }

    pub fn timing(&self) -> Option<&ResourceTiming> {
        self.timing.as_ref()
    }

    /// Apply authoritative timing. Ignored for memory-cache hits.
    pub fn set_timing(&mut self, timing: Option<ResourceTiming>) {
        let Some(timing) = timing else {
            return;
        };
        if self.from_memory_cache {
            return;
        }

        let start = timing.request_time;
        let received = start + timing.receive_headers_end.max(0.0) / 1000.0;
        self.start_time = Some(start);
        self.response_received_time = Some(received);
        if self.end_time.is_some_and(|end| end < received) {
            self.end_time = Some(received);
        }
        self.timing = Some(timing);
        self.events.emit(RequestEvent::TimingChanged);
    }

    // =========================================================================
    // Sizes and cache state
    // =========================================================================

    pub fn resource_size(&self) -> u64 {
        self.resource_size
    }

    pub fn add_resource_size(&mut self, bytes: u64) {
        self.resource_size += bytes;
    }

    pub fn transfer_size(&self) -> u64 {
        self.transfer_size
    }

    pub fn increase_transfer_size(&mut self, bytes: u64) {
        self.transfer_size += bytes;
    }

    pub fn set_transfer_size(&mut self, bytes: u64) {
        self.transfer_size = bytes;
    }

    pub fn from_memory_cache(&self) -> bool {
        self.from_memory_cache
    }

    /// Mark as served from the memory cache and drop any timing data
    pub fn set_from_memory_cache(&mut self) {
        self.from_memory_cache = true;
        self.timing = None;
    }

    pub fn from_disk_cache(&self) -> bool {
        self.from_disk_cache
    }

    pub fn set_from_disk_cache(&mut self) {
        self.from_disk_cache = true;
    }

    /// Served from a cache without any bytes on the wire
    pub fn cached(&self) -> bool {
        (self.from_memory_cache || self.from_disk_cache) && self.transfer_size == 0
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    pub fn set_finished(&mut self, finished: bool) {
        if self.finished == finished {
            return;
        }
        self.finished = finished;
        if finished {
            self.events.emit(RequestEvent::FinishedLoading);
        }
    }

    pub fn has_error_status_code(&self) -> bool {
        self.status_code >= 400
    }

    pub fn remote_address(&self) -> &str {
        &self.remote_address
    }

    /// Record the peer address; IPv6 hosts are bracketed
    pub fn set_remote_address(&mut self, ip: &str, port: i64) {
        self.remote_address = if ip.contains(':') {
            format!("[{}]:{}", ip, port)
        } else {
            format!("{}:{}", ip, port)
        };
        self.events.emit(RequestEvent::RemoteAddressChanged);
    }

    // =========================================================================
    // Headers
    // =========================================================================

    pub fn request_headers(&self) -> &[NameValue] {
        &self.request_headers
    }

    pub fn set_request_headers(&mut self, headers: Vec<NameValue>) {
        self.request_headers = headers;
        self.request_cookies = OnceLock::new();
        self.form_parameters = OnceLock::new();
        self.events.emit(RequestEvent::RequestHeadersChanged);
    }

    pub fn request_headers_text(&self) -> Option<&str> {
        self.request_headers_text.as_deref()
    }

    pub fn set_request_headers_text(&mut self, text: String) {
        self.request_headers_text = Some(text);
        self.events.emit(RequestEvent::RequestHeadersChanged);
    }

    pub fn request_header_value(&self, name: &str) -> Option<String> {
        headers::header_value(&self.request_headers, name)
    }

    pub fn request_cookies(&self) -> &[Cookie] {
        self.request_cookies.get_or_init(|| {
            self.request_header_value("Cookie")
                .map(|value| headers::parse_cookie(&value))
                .unwrap_or_default()
        })
    }

    pub fn request_content_type(&self) -> Option<String> {
        self.request_header_value("Content-Type")
    }

    pub fn request_http_version(&self) -> String {
        headers::http_version(
            self.request_headers_text.as_deref(),
            &self.request_headers,
            true,
        )
    }

    pub fn response_headers(&self) -> &[NameValue] {
        &self.response_headers
    }

    pub fn set_response_headers(&mut self, headers: Vec<NameValue>) {
        self.response_headers = headers;
        self.response_cookies = OnceLock::new();
        self.events.emit(RequestEvent::ResponseHeadersChanged);
    }

    pub fn response_headers_text(&self) -> Option<&str> {
        self.response_headers_text.as_deref()
    }

    pub fn set_response_headers_text(&mut self, text: String) {
        self.response_headers_text = Some(text);
        self.events.emit(RequestEvent::ResponseHeadersChanged);
    }

    pub fn response_header_value(&self, name: &str) -> Option<String> {
        headers::header_value(&self.response_headers, name)
    }

    /// Response headers ordered by lowercase name, stable for duplicates
    pub fn sorted_response_headers(&self) -> Vec<NameValue> {
        let mut sorted = self.response_headers.clone();
        sorted.sort_by_key(|header| header.name.to_ascii_lowercase());
        sorted
    }

    pub fn response_cookies(&self) -> &[Cookie] {
        self.response_cookies.get_or_init(|| {
            self.response_header_value("Set-Cookie")
                .map(|value| headers::parse_set_cookie(&value))
                .unwrap_or_default()
        })
    }

    pub fn response_http_version(&self) -> String {
        headers::http_version(
            self.response_headers_text.as_deref(),
            &self.response_headers,
            false,
        )
    }

    // =========================================================================
    // Request body
    // =========================================================================

    pub fn request_form_data(&self) -> Option<&str> {
        self.request_form_data.as_deref()
    }

    pub fn set_request_form_data(&mut self, data: Option<String>) {
        self.request_form_data = data;
        self.form_parameters = OnceLock::new();
    }

    /// Parsed body of `application/x-www-form-urlencoded` requests
    pub fn form_parameters(&self) -> Option<&[NameValue]> {
        self.form_parameters
            .get_or_init(|| {
                let data = self.request_form_data.as_deref()?;
                let content_type = self.request_content_type()?;
                let essence = content_type.split(';').next().unwrap_or("").trim();
                if !essence.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
                    return None;
                }
                Some(headers::parse_parameters(data))
            })
            .as_deref()
    }

    // =========================================================================
    // URL-derived fields
    // =========================================================================

    fn derived(&self) -> &DerivedUrl {
        self.derived_url.get_or_init(|| {
            let parts = UrlParts::parse(&self.url);
            let named = url_parts::name_and_path(
                &self.url,
                &parts,
                self.inspected_page_domain.as_deref(),
            );
            let query_string = url_parts::query_string(&self.url);
            let query_parameters = query_string
                .as_deref()
                .filter(|query| !query.is_empty())
                .map(headers::parse_parameters);
            DerivedUrl {
                parts,
                named,
                query_string,
                query_parameters,
            }
        })
    }

    pub fn scheme(&self) -> &str {
        &self.derived().parts.scheme
    }

    pub fn domain(&self) -> &str {
        &self.derived().parts.host
    }

    pub fn display_name(&self) -> &str {
        &self.derived().parts.display_name
    }

    pub fn name(&self) -> &str {
        &self.derived().named.name
    }

    pub fn path(&self) -> &str {
        &self.derived().named.path
    }

    /// Innermost folder of the URL path, e.g. `/b` for `/a/b/c.js`
    pub fn folder(&self) -> &str {
        let path = &self.derived().parts.folder_path_components;
        match path.rfind('/') {
            Some(index) => &path[index..],
            None => "",
        }
    }

    pub fn query_string(&self) -> Option<&str> {
        self.derived().query_string.as_deref()
    }

    pub fn query_parameters(&self) -> Option<&[NameValue]> {
        self.derived().query_parameters.as_deref()
    }

    pub fn is_http_family(&self) -> bool {
        matches!(self.scheme(), "http" | "https")
    }

    // =========================================================================
    // Redirects and initiator
    // =========================================================================

    /// Previous hop of a redirect chain
    pub fn redirect_source(&self) -> Option<RequestRef> {
        self.redirects
            .last()
            .cloned()
            .or_else(|| self.redirect_source.clone())
    }

    pub fn set_redirect_source(&mut self, source: Option<RequestRef>) {
        self.redirect_source = source;
        self.initiator_info = OnceLock::new();
    }

    /// Earlier hops of the redirect chain, oldest first
    pub fn redirects(&self) -> &[RequestRef] {
        &self.redirects
    }

    pub(crate) fn set_redirects(&mut self, redirects: Vec<RequestRef>) {
        self.redirects = redirects;
        self.initiator_info = OnceLock::new();
    }

    pub(crate) fn take_redirects(&mut self) -> Vec<RequestRef> {
        self.initiator_info = OnceLock::new();
        std::mem::take(&mut self.redirects)
    }

    pub fn initiator_info(&self) -> InitiatorInfo {
        self.initiator_info
            .get_or_init(|| self.compute_initiator_info())
            .clone()
    }

    fn compute_initiator_info(&self) -> InitiatorInfo {
        let mut info = InitiatorInfo {
            kind: InitiatorKind::Other,
            url: None,
            line_number: None,
            column_number: None,
        };

        if let Some(source) = self.redirect_source() {
            info.kind = InitiatorKind::Redirect;
            info.url = Some(source.read().url().to_string());
            return info;
        }

        let Some(initiator) = &self.initiator else {
            return info;
        };

        match initiator.initiator_type {
            InitiatorType::Parser => {
                info.kind = InitiatorKind::Parser;
                info.url = Some(
                    initiator
                        .url
                        .clone()
                        .unwrap_or_else(|| self.document_url.clone()),
                );
                info.line_number = initiator.line_number;
            }
            InitiatorType::Script => {
                let top = initiator
                    .stack
                    .as_ref()
                    .and_then(|stack| stack.call_frames.first())
                    .filter(|frame| !frame.url.is_empty());
                if let Some(frame) = top {
                    info.kind = InitiatorKind::Script;
                    info.url = Some(frame.url.clone());
                    info.line_number = Some(frame.line_number);
                    info.column_number = Some(frame.column_number);
                }
            }
            InitiatorType::Preload | InitiatorType::Other => {}
        }
        info
    }

    // =========================================================================
    // WebSocket frames and EventSource messages
    // =========================================================================

    pub fn frames(&self) -> &[WebSocketFrameRecord] {
        &self.frames
    }

    pub fn add_frame(&mut self, frame: &WebSocketFrame, time: f64, sent: bool) {
        let direction = if sent {
            FrameDirection::Send
        } else {
            FrameDirection::Receive
        };
        let record = WebSocketFrameRecord::data(
            direction,
            frame.payload_data.clone(),
            frame.opcode,
            frame.mask,
            time,
        );
        self.push_frame(record);
    }

    pub fn add_frame_error(&mut self, message: &str, time: f64) {
        self.push_frame(WebSocketFrameRecord::error(message.to_string(), time));
    }

    fn push_frame(&mut self, record: WebSocketFrameRecord) {
        self.frames.push(record.clone());
        self.events.emit(RequestEvent::WebSocketFrameAdded(record));
    }

    pub fn event_source_messages(&self) -> &[EventSourceMessage] {
        &self.event_source_messages
    }

    pub fn add_event_source_message(&mut self, message: EventSourceMessage) {
        self.event_source_messages.push(message);
    }

    // =========================================================================
    // Content
    // =========================================================================

    /// Fetched response body, once resolved successfully
    pub fn content(&self) -> Option<&str> {
        self.content.resolved.as_ref().and_then(|c| c.as_deref())
    }

    pub fn is_content_resolved(&self) -> bool {
        self.content.resolved.is_some()
    }

    pub fn content_error(&self) -> Option<&CdpError> {
        self.content.error.as_ref()
    }

    pub fn content_encoded(&self) -> bool {
        self.content.encoded
    }

    pub(crate) fn resolved_content(&self) -> Option<Option<String>> {
        self.content.resolved.clone()
    }

    pub(crate) fn push_content_waiter(&mut self, waiter: oneshot::Sender<Option<String>>) {
        self.content.waiters.push(waiter);
    }

    pub(crate) fn has_content_waiters(&self) -> bool {
        !self.content.waiters.is_empty()
    }

    /// Claim the single content fetch for this record
    pub(crate) fn begin_content_fetch(&mut self) -> bool {
        if self.content.requested {
            return false;
        }
        self.content.requested = true;
        true
    }

    /// Store the fetch outcome and hand back the waiters to notify
    pub(crate) fn resolve_content(
        &mut self,
        result: std::result::Result<ResponseBody, CdpError>,
    ) -> (Option<String>, Vec<oneshot::Sender<Option<String>>>) {
        let value = match result {
            Ok(body) => {
                self.content.encoded = body.base64_encoded;
                Some(body.body)
            }
            Err(error) => {
                self.content.error = Some(error);
                None
            }
        };
        self.content.resolved = Some(value.clone());
        (value, std::mem::take(&mut self.content.waiters))
    }
}
