//! Advisory MIME type consistency check
//!
//! Flags responses whose declared MIME type does not match the resource
//! type the target loaded them as, e.g. a stylesheet served as `text/plain`.

use cdp_types::domains::console::{ConsoleMessage, ConsoleMessageLevel};
use cdp_types::domains::network::ResourceType;

/// MIME types accepted for each checked resource type
static MIME_TYPES: &[(&str, &[ResourceType])] = &[
    ("text/html", &[ResourceType::Document]),
    ("text/xml", &[ResourceType::Document]),
    ("text/plain", &[ResourceType::Document]),
    ("application/xhtml+xml", &[ResourceType::Document]),
    (
        "image/svg+xml",
        &[ResourceType::Document, ResourceType::Image, ResourceType::Font],
    ),
    ("text/css", &[ResourceType::Stylesheet]),
    ("text/xsl", &[ResourceType::Stylesheet]),
    ("text/vtt", &[ResourceType::TextTrack]),
    ("image/jpeg", &[ResourceType::Image]),
    ("image/jpg", &[ResourceType::Image]),
    ("image/pjpeg", &[ResourceType::Image]),
    ("image/png", &[ResourceType::Image]),
    ("image/gif", &[ResourceType::Image]),
    ("image/bmp", &[ResourceType::Image]),
    ("image/webp", &[ResourceType::Image]),
    ("image/avif", &[ResourceType::Image]),
    ("image/vnd.microsoft.icon", &[ResourceType::Image]),
    ("image/x-icon", &[ResourceType::Image]),
    ("image/x-xbitmap", &[ResourceType::Image]),
    ("image/apng", &[ResourceType::Image]),
    ("image/tiff", &[ResourceType::Image]),
    ("image/x-png", &[ResourceType::Image]),
    ("font/ttf", &[ResourceType::Font]),
    ("font/otf", &[ResourceType::Font]),
    ("font/woff", &[ResourceType::Font]),
    ("font/woff2", &[ResourceType::Font]),
    ("font/collection", &[ResourceType::Font]),
    ("font/sfnt", &[ResourceType::Font]),
    ("font/opentype", &[ResourceType::Font]),
    ("application/font-woff", &[ResourceType::Font]),
    ("application/x-font-type1", &[ResourceType::Font]),
    ("application/x-font-ttf", &[ResourceType::Font]),
    ("application/x-font-woff", &[ResourceType::Font]),
    ("application/x-truetype-font", &[ResourceType::Font]),
    ("application/x-font-otf", &[ResourceType::Font]),
    ("application/font-sfnt", &[ResourceType::Font]),
    ("application/vnd.ms-fontobject", &[ResourceType::Font]),
    // servers commonly send fonts untyped
    ("application/octet-stream", &[ResourceType::Font]),
    ("text/javascript", &[ResourceType::Script]),
    ("text/ecmascript", &[ResourceType::Script]),
    ("application/javascript", &[ResourceType::Script]),
    ("application/ecmascript", &[ResourceType::Script]),
    ("application/x-javascript", &[ResourceType::Script]),
    ("text/x-javascript", &[ResourceType::Script]),
    ("text/x-js", &[ResourceType::Script]),
    ("application/json", &[ResourceType::Script]),
    ("text/javascript1.1", &[ResourceType::Script]),
    ("text/javascript1.2", &[ResourceType::Script]),
    ("text/javascript1.3", &[ResourceType::Script]),
    ("text/jscript", &[ResourceType::Script]),
    ("text/livescript", &[ResourceType::Script]),
];

/// Whether `mime_type` is an acceptable MIME type for `resource_type`.
///
/// Error statuses, 204 and 304 responses, empty MIME types and resource
/// types where mismatches are expected are always consistent.
pub fn is_consistent(resource_type: ResourceType, mime_type: &str, status_code: u16) -> bool {
    if status_code >= 400 || status_code == 304 || status_code == 204 {
        return true;
    }

    if !matches!(
        resource_type,
        ResourceType::Document
            | ResourceType::Stylesheet
            | ResourceType::Script
            | ResourceType::Image
            | ResourceType::Font
            | ResourceType::TextTrack
    ) {
        return true;
    }

    if mime_type.is_empty() {
        return true;
    }

    let mime_type = mime_type.to_ascii_lowercase();
    MIME_TYPES
        .iter()
        .find(|(known, _)| *known == mime_type)
        .map(|(_, types)| types.contains(&resource_type))
        .unwrap_or(false)
}

/// Console message reporting a MIME/type mismatch
pub fn mismatch_message(
    resource_type: ResourceType,
    mime_type: &str,
    url: &str,
    request_id: &str,
) -> ConsoleMessage {
    ConsoleMessage::network(
        ConsoleMessageLevel::Log,
        format!(
            "Resource interpreted as {} but transferred with MIME type {}: \"{}\".",
            resource_type.title(),
            mime_type,
            url
        ),
        url,
        request_id,
    )
}
