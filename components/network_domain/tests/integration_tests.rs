//! End-to-end notification sequences through NetworkDispatcher
//!
//! Drives the dispatcher with protocol events in the order a browser emits
//! them and checks the resulting records and tracker events.

use async_trait::async_trait;
use cdp_types::domains::console::ConsoleMessageLevel;
use cdp_types::{CdpError, CdpEvent};
use network_domain::*;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

fn dispatcher() -> NetworkDispatcher {
    NetworkDispatcher::with_config(TrackerConfig::default(), ContentLoader::detached())
}

fn send(d: &mut NetworkDispatcher, method: &str, params: Value) {
    d.dispatch_event(&CdpEvent::new(method, params)).unwrap();
}

fn drain(rx: &mut broadcast::Receiver<NetworkEvent>) -> Vec<NetworkEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn kinds(events: &[NetworkEvent]) -> Vec<&'static str> {
    events
        .iter()
        .map(|event| match event {
            NetworkEvent::RequestStarted(_) => "started",
            NetworkEvent::RequestUpdated(_) => "updated",
            NetworkEvent::ResponseReceived(_) => "response",
            NetworkEvent::RequestFinished(_) => "finished",
            NetworkEvent::RequestUpdateDropped(_) => "dropped",
            NetworkEvent::ConsoleMessage(_) => "console",
        })
        .collect()
}

fn will_be_sent(id: &str, url: &str, time: f64) -> Value {
    json!({
        "requestId": id,
        "frameId": "F1",
        "loaderId": "L1",
        "documentURL": "https://example.com/",
        "request": {"url": url, "method": "GET", "headers": {}},
        "timestamp": time,
        "wallTime": 1700000000.0 + time,
        "type": "Document"
    })
}

#[tokio::test]
async fn test_redirect_chain() {
    let mut d = dispatcher();
    let mut rx = d.subscribe();

    send(&mut d, "Network.requestWillBeSent", will_be_sent("r1", "https://example.com/a", 1.0));

    let mut redirect = will_be_sent("r1", "https://example.com/b", 2.0);
    redirect["redirectResponse"] = json!({
        "url": "https://example.com/a",
        "status": 302,
        "statusText": "Found",
        "headers": {"Location": "/b"},
        "mimeType": "",
        "encodedDataLength": 150
    });
    send(&mut d, "Network.requestWillBeSent", redirect);

    send(
        &mut d,
        "Network.responseReceived",
        json!({
            "requestId": "r1",
            "timestamp": 3.0,
            "type": "Document",
            "response": {"url": "https://example.com/b", "status": 200, "mimeType": "text/html"}
        }),
    );
    send(
        &mut d,
        "Network.loadingFinished",
        json!({"requestId": "r1", "timestamp": 4.0, "encodedDataLength": 900}),
    );

    assert_eq!(
        kinds(&drain(&mut rx)),
        vec![
            "started", "updated", "response", "finished", "started", "updated", "response",
            "finished"
        ]
    );

    let requests = d.requests();
    assert_eq!(requests.len(), 2);

    let hop = requests[0].read();
    assert_eq!(hop.request_id(), "r1:redirected.0");
    assert_eq!(hop.status_code, 302);
    assert!(hop.finished());
    assert_eq!(hop.end_time(), Some(2.0));
    assert_eq!(hop.transfer_size(), 150);

    let target = requests[1].read();
    assert_eq!(target.request_id(), "r1");
    assert_eq!(target.url(), "https://example.com/b");
    assert_eq!(target.status_code, 200);
    assert_eq!(target.redirects().len(), 1);
    assert!(Arc::ptr_eq(&target.redirects()[0], &requests[0]));
    assert_eq!(target.initiator_info().kind, InitiatorKind::Redirect);
    assert_eq!(target.frame_id(), "F1");

    assert!(d.registry().is_empty());
}

#[tokio::test]
async fn test_data_received_then_finished() {
    let mut d = dispatcher();
    send(&mut d, "Network.requestWillBeSent", will_be_sent("7", "https://example.com/big", 1.0));

    for time in [2.0, 3.0] {
        send(
            &mut d,
            "Network.dataReceived",
            json!({"requestId": "7", "timestamp": time, "dataLength": 100, "encodedDataLength": 80}),
        );
    }

    {
        let request = d.inflight_request_for_id("7").unwrap();
        let r = request.read();
        assert_eq!(r.resource_size(), 200);
        assert_eq!(r.transfer_size(), 160);
        assert_eq!(r.end_time(), Some(3.0));
    }

    send(
        &mut d,
        "Network.loadingFinished",
        json!({"requestId": "7", "timestamp": 5.0, "encodedDataLength": 200}),
    );

    let r = d.requests()[0].read();
    assert_eq!(r.resource_size(), 200);
    assert_eq!(r.transfer_size(), 200);
    assert!(r.finished());
    assert_eq!(r.duration(), Some(4.0));
    assert!(d.inflight_request_for_id("7").is_none());
    assert!(d.inflight_request_for_url("https://example.com/big").is_none());
}

#[tokio::test]
async fn test_response_for_unknown_request_is_dropped() {
    let mut d = dispatcher();
    let mut rx = d.subscribe();

    send(
        &mut d,
        "Network.responseReceived",
        json!({
            "requestId": "ghost",
            "frameId": "F9",
            "loaderId": "L9",
            "timestamp": 1.0,
            "type": "Image",
            "response": {"url": "https://example.com/x.png", "status": 200, "mimeType": "image/png"}
        }),
    );

    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    match &events[0] {
        NetworkEvent::RequestUpdateDropped(dropped) => {
            assert_eq!(
                dropped,
                &DroppedUpdate {
                    url: "https://example.com/x.png".to_string(),
                    frame_id: "F9".to_string(),
                    loader_id: "L9".to_string(),
                    resource_type: cdp_types::domains::network::ResourceType::Image,
                    mime_type: "image/png".to_string(),
                }
            );
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert!(d.inflight_request_for_id("ghost").is_none());
    assert!(d.requests().is_empty());
}

#[tokio::test]
async fn test_notifications_for_unknown_ids_are_ignored() {
    let mut d = dispatcher();
    let mut rx = d.subscribe();

    send(
        &mut d,
        "Network.dataReceived",
        json!({"requestId": "nope", "timestamp": 1.0, "dataLength": 1, "encodedDataLength": 1}),
    );
    send(&mut d, "Network.loadingFinished", json!({"requestId": "nope", "timestamp": 1.0}));
    send(&mut d, "Network.webSocketClosed", json!({"requestId": "nope", "timestamp": 1.0}));

    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_null_header_maps_are_empty() {
    let mut d = dispatcher();
    send(
        &mut d,
        "Network.requestWillBeSent",
        json!({
            "requestId": "1",
            "request": {"url": "https://example.com/", "method": "GET", "headers": null},
            "timestamp": 1.0
        }),
    );
    send(
        &mut d,
        "Network.responseReceived",
        json!({
            "requestId": "1",
            "timestamp": 2.0,
            "type": "Document",
            "response": {"url": "https://example.com/", "status": 200, "mimeType": "text/html", "headers": null}
        }),
    );

    let request = d.inflight_request_for_id("1").unwrap();
    let r = request.read();
    assert_eq!(r.status_code, 200);
    assert!(r.request_headers().is_empty());
    assert!(r.response_headers().is_empty());
}

#[tokio::test]
async fn test_memory_cache_hit() {
    let mut d = dispatcher();
    send(&mut d, "Network.requestWillBeSent", will_be_sent("c1", "https://example.com/logo.png", 1.0));
    send(&mut d, "Network.requestServedFromCache", json!({"requestId": "c1"}));
    send(
        &mut d,
        "Network.responseReceived",
        json!({
            "requestId": "c1",
            "timestamp": 1.5,
            "type": "Image",
            "response": {
                "url": "https://example.com/logo.png",
                "status": 200,
                "mimeType": "image/png",
                "encodedDataLength": 0,
                "timing": {"requestTime": 9.0, "receiveHeadersEnd": 10.0}
            }
        }),
    );
    send(
        &mut d,
        "Network.loadingFinished",
        json!({"requestId": "c1", "timestamp": 1.6, "encodedDataLength": 0}),
    );

    let r = d.requests()[0].read();
    assert!(r.from_memory_cache());
    assert!(r.timing().is_none());
    assert_eq!(r.start_time(), Some(1.0));
    assert!(r.cached());
}

#[tokio::test]
async fn test_mime_mismatch_emits_console_message() {
    let mut d = dispatcher();
    let mut rx = d.subscribe();
    send(&mut d, "Network.requestWillBeSent", will_be_sent("s1", "https://example.com/site.css", 1.0));
    send(
        &mut d,
        "Network.responseReceived",
        json!({
            "requestId": "s1",
            "timestamp": 2.0,
            "type": "Stylesheet",
            "response": {"url": "https://example.com/site.css", "status": 200, "mimeType": "text/plain"}
        }),
    );

    let messages: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter_map(|event| match event {
            NetworkEvent::ConsoleMessage(message) => Some(message),
            _ => None,
        })
        .collect();

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].level, ConsoleMessageLevel::Log);
    assert_eq!(
        messages[0].text,
        "Resource interpreted as Stylesheet but transferred with MIME type text/plain: \"https://example.com/site.css\"."
    );
}

#[tokio::test]
async fn test_mime_check_can_be_disabled() {
    let config = TrackerConfig::builder().check_mime_types(false).build();
    let mut d = NetworkDispatcher::with_config(config, ContentLoader::detached());
    let mut rx = d.subscribe();
    send(&mut d, "Network.requestWillBeSent", will_be_sent("s1", "https://example.com/site.css", 1.0));
    send(
        &mut d,
        "Network.responseReceived",
        json!({
            "requestId": "s1",
            "timestamp": 2.0,
            "type": "Stylesheet",
            "response": {"url": "https://example.com/site.css", "status": 200, "mimeType": "text/plain"}
        }),
    );

    assert!(!drain(&mut rx)
        .iter()
        .any(|event| matches!(event, NetworkEvent::ConsoleMessage(_))));
}

#[tokio::test]
async fn test_legacy_script_mime_type_is_consistent() {
    let mut d = dispatcher();
    let mut rx = d.subscribe();
    send(&mut d, "Network.requestWillBeSent", will_be_sent("j1", "https://example.com/app.js", 1.0));
    send(
        &mut d,
        "Network.responseReceived",
        json!({
            "requestId": "j1",
            "timestamp": 2.0,
            "type": "Script",
            "response": {"url": "https://example.com/app.js", "status": 200, "mimeType": "text/x-javascript"}
        }),
    );

    assert!(!drain(&mut rx)
        .iter()
        .any(|event| matches!(event, NetworkEvent::ConsoleMessage(_))));
}

#[tokio::test]
async fn test_loading_failed() {
    let mut d = dispatcher();
    send(&mut d, "Network.requestWillBeSent", will_be_sent("f1", "https://example.com/api", 1.0));
    send(
        &mut d,
        "Network.loadingFailed",
        json!({
            "requestId": "f1",
            "timestamp": 1.2,
            "type": "XHR",
            "errorText": "net::ERR_ABORTED",
            "canceled": true
        }),
    );

    let r = d.requests()[0].read();
    assert!(r.failed);
    assert!(r.canceled);
    assert!(r.finished());
    assert_eq!(r.localized_fail_description.as_deref(), Some("net::ERR_ABORTED"));
    assert_eq!(r.resource_type(), cdp_types::domains::network::ResourceType::XHR);
    assert!(d.registry().is_empty());
}

#[tokio::test]
async fn test_web_socket_lifecycle() {
    let mut d = dispatcher();
    send(
        &mut d,
        "Network.webSocketCreated",
        json!({"requestId": "ws", "url": "wss://example.com/socket"}),
    );
    send(
        &mut d,
        "Network.webSocketWillSendHandshakeRequest",
        json!({"requestId": "ws", "timestamp": 1.0, "wallTime": 100.0, "request": {"headers": {"Upgrade": "websocket"}}}),
    );
    send(
        &mut d,
        "Network.webSocketHandshakeResponseReceived",
        json!({"requestId": "ws", "timestamp": 1.1, "response": {"status": 101, "statusText": "Switching Protocols", "headers": {"Upgrade": "websocket"}}}),
    );
    send(
        &mut d,
        "Network.webSocketFrameSent",
        json!({"requestId": "ws", "timestamp": 1.2, "response": {"opcode": 1, "mask": true, "payloadData": "ping"}}),
    );
    send(
        &mut d,
        "Network.webSocketFrameReceived",
        json!({"requestId": "ws", "timestamp": 1.3, "response": {"opcode": 1, "mask": false, "payloadData": "pong"}}),
    );
    send(
        &mut d,
        "Network.webSocketFrameError",
        json!({"requestId": "ws", "timestamp": 1.4, "errorMessage": "bad frame"}),
    );
    send(&mut d, "Network.webSocketClosed", json!({"requestId": "ws", "timestamp": 2.0}));

    let request = d.requests()[0].clone();
    let r = request.read();
    assert_eq!(r.resource_type(), cdp_types::domains::network::ResourceType::WebSocket);
    assert_eq!(r.request_method, "GET");
    assert_eq!(r.status_code, 101);
    assert_eq!(r.start_time(), Some(1.0));
    assert!(r.finished());

    let directions: Vec<FrameDirection> = r.frames().iter().map(|f| f.direction).collect();
    assert_eq!(
        directions,
        vec![FrameDirection::Send, FrameDirection::Receive, FrameDirection::Error]
    );
    assert_eq!(r.frames()[0].opcode_kind(), Some(WebSocketOpcode::Text));
    assert_eq!(r.frames()[2].payload, "bad frame");
    drop(r);

    assert_eq!(d.request_content(&request).await.unwrap(), None);
}

#[tokio::test]
async fn test_event_source_messages() {
    let mut d = dispatcher();
    send(&mut d, "Network.requestWillBeSent", will_be_sent("es", "https://example.com/stream", 1.0));
    send(
        &mut d,
        "Network.eventSourceMessageReceived",
        json!({"requestId": "es", "timestamp": 2.0, "eventName": "tick", "eventId": "1", "data": "42"}),
    );

    let request = d.inflight_request_for_id("es").unwrap();
    let r = request.read();
    assert_eq!(r.event_source_messages().len(), 1);
    assert_eq!(r.event_source_messages()[0].data, "42");
}

struct CountingProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl ResponseBodyProvider for CountingProvider {
    async fn get_response_body(
        &self,
        request_id: &str,
    ) -> std::result::Result<ResponseBody, CdpError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ResponseBody::text(format!("body of {}", request_id)))
    }
}

#[tokio::test]
async fn test_content_requests_coalesce() {
    let provider = Arc::new(CountingProvider {
        calls: AtomicUsize::new(0),
    });
    let mut d = NetworkDispatcher::with_config(
        TrackerConfig::default(),
        ContentLoader::new(provider.clone()),
    );
    send(&mut d, "Network.requestWillBeSent", will_be_sent("b1", "https://example.com/app.js", 1.0));

    let request = d.inflight_request_for_id("b1").unwrap();
    let waiters: Vec<_> = (0..3).map(|_| d.request_content(&request)).collect();

    send(
        &mut d,
        "Network.loadingFinished",
        json!({"requestId": "b1", "timestamp": 2.0, "encodedDataLength": 10}),
    );

    for waiter in waiters {
        assert_eq!(waiter.await.unwrap().as_deref(), Some("body of b1"));
    }
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(request.read().content(), Some("body of b1"));
}

#[tokio::test]
async fn test_record_events_follow_dispatch() {
    let mut d = dispatcher();
    send(&mut d, "Network.requestWillBeSent", will_be_sent("t1", "https://example.com/", 1.0));

    let request = d.inflight_request_for_id("t1").unwrap();
    let mut rx = request.write().subscribe();

    send(
        &mut d,
        "Network.loadingFinished",
        json!({"requestId": "t1", "timestamp": 2.0}),
    );

    assert_eq!(rx.recv().await.unwrap(), RequestEvent::TimingChanged);
    assert_eq!(rx.recv().await.unwrap(), RequestEvent::FinishedLoading);
}
