//! Network activity tracking
//!
//! Consumes `Network.*` notifications from an inspected target and turns
//! them into [`NetworkRequest`] records: one per resource load, linked into
//! redirect chains, indexed while in flight, and observable through
//! broadcast events.
//!
//! # Features
//! - **Dispatcher**: applies every tracked notification to its record
//! - **In-flight registry**: lookup of unfinished requests by id and URL
//! - **Redirect chains**: hop records renamed `<id>:redirected.<n>`
//! - **Lazy content**: one coalesced body fetch per record
//! - **MIME check**: advisory console messages for mistyped responses
//!
//! # Example
//! ```
//! use cdp_types::CdpEvent;
//! use network_domain::{ContentLoader, NetworkDispatcher, TrackerConfig};
//! use serde_json::json;
//!
//! let mut dispatcher =
//!     NetworkDispatcher::with_config(TrackerConfig::default(), ContentLoader::detached());
//! dispatcher
//!     .dispatch_event(&CdpEvent::new(
//!         "Network.requestWillBeSent",
//!         json!({"requestId": "1", "request": {"url": "https://example.com/"}, "timestamp": 1.0}),
//!     ))
//!     .unwrap();
//! let request = dispatcher.inflight_request_for_id("1").unwrap();
//!
//! dispatcher
//!     .dispatch_event(&CdpEvent::new(
//!         "Network.loadingFinished",
//!         json!({"requestId": "1", "timestamp": 2.0, "encodedDataLength": 512}),
//!     ))
//!     .unwrap();
//! assert!(request.read().finished());
//!
//! // Without a body provider the content resolves to nothing
//! let content = tokio_test::block_on(dispatcher.request_content(&request)).unwrap();
//! assert_eq!(content, None);
//! ```

pub mod config;
pub mod content;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod frames;
pub mod headers;
pub mod mime;
pub mod notification;
pub mod redirect;
pub mod registry;
pub mod request;
pub mod url_parts;

pub use config::{TrackerConfig, TrackerConfigBuilder};
pub use content::{ContentLoader, ResponseBody, ResponseBodyProvider};
pub use dispatcher::NetworkDispatcher;
pub use error::{NetworkError, Result};
pub use events::{DroppedUpdate, EventEmitter, NetworkEvent, RequestEvent};
pub use frames::{EventSourceMessage, FrameDirection, WebSocketFrameRecord, WebSocketOpcode};
pub use headers::{Cookie, CookieKind, CookieSameSite, NameValue};
pub use notification::NetworkNotification;
pub use registry::InflightRegistry;
pub use request::{InitiatorInfo, InitiatorKind, NetworkRequest, RequestRef};
