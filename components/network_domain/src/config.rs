//! Configuration for the network tracker

use serde::{Deserialize, Serialize};

/// Tracker configuration
///
/// Controls channel capacities for tracker and per-request events, the
/// advisory MIME consistency check, and the page domain used to shorten
/// display paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Capacity of the tracker-level event channel
    event_capacity: usize,

    /// Capacity of each request's event channel
    request_event_capacity: usize,

    /// Whether to emit console messages for MIME/type mismatches
    check_mime_types: bool,

    /// Domain of the inspected page, trimmed from request display paths
    inspected_page_domain: Option<String>,
}

impl TrackerConfig {
    /// Create a new builder for TrackerConfig
    ///
    /// # Example
    ///
    /// ```
    /// use network_domain::TrackerConfig;
    ///
    /// let config = TrackerConfig::builder()
    ///     .check_mime_types(false)
    ///     .inspected_page_domain("example.com")
    ///     .build();
    /// assert!(!config.check_mime_types());
    /// ```
    pub fn builder() -> TrackerConfigBuilder {
        TrackerConfigBuilder::default()
    }

    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }

    pub fn request_event_capacity(&self) -> usize {
        self.request_event_capacity
    }

    pub fn check_mime_types(&self) -> bool {
        self.check_mime_types
    }

    pub fn inspected_page_domain(&self) -> Option<&str> {
        self.inspected_page_domain.as_deref()
    }
}

impl Default for TrackerConfig {
    /// Default values:
    /// - event_capacity: 256
    /// - request_event_capacity: 64
    /// - check_mime_types: true
    /// - inspected_page_domain: none
    fn default() -> Self {
        Self {
            event_capacity: 256,
            request_event_capacity: 64,
            check_mime_types: true,
            inspected_page_domain: None,
        }
    }
}

/// Builder for TrackerConfig
#[derive(Debug, Clone, Default)]
pub struct TrackerConfigBuilder {
    event_capacity: Option<usize>,
    request_event_capacity: Option<usize>,
    check_mime_types: Option<bool>,
    inspected_page_domain: Option<String>,
}

impl TrackerConfigBuilder {
    /// Set the tracker event channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events buffered per subscriber before lagging
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    /// Set the per-request event channel capacity
    pub fn request_event_capacity(mut self, capacity: usize) -> Self {
        self.request_event_capacity = Some(capacity);
        self
    }

    /// Enable or disable the MIME consistency check
    pub fn check_mime_types(mut self, enabled: bool) -> Self {
        self.check_mime_types = Some(enabled);
        self
    }

    /// Set the inspected page domain
    ///
    /// # Arguments
    ///
    /// * `domain` - Host of the inspected page, e.g. "example.com"
    pub fn inspected_page_domain(mut self, domain: impl Into<String>) -> Self {
        self.inspected_page_domain = Some(domain.into());
        self
    }

    /// Build the TrackerConfig
    ///
    /// Uses default values for any options not explicitly set. Capacities
    /// of zero are raised to one since broadcast channels require it.
    pub fn build(self) -> TrackerConfig {
        let default = TrackerConfig::default();

        TrackerConfig {
            event_capacity: self.event_capacity.unwrap_or(default.event_capacity).max(1),
            request_event_capacity: self
                .request_event_capacity
                .unwrap_or(default.request_event_capacity)
                .max(1),
            check_mime_types: self.check_mime_types.unwrap_or(default.check_mime_types),
            inspected_page_domain: self.inspected_page_domain.or(default.inspected_page_domain),
        }
    }
}
