//! Header list conversion, header lookup and cookie parsing

use cdp_types::domains::network::Headers;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Single header or parameter entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameValue {
    pub name: String,
    pub value: String,
}

impl NameValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Expand a wire header map into an ordered list.
///
/// Values folded with `\n` become one entry each, in encounter order.
/// Null values are skipped and non-string scalars are stringified.
pub fn headers_map_to_list(headers: &Headers) -> Vec<NameValue> {
    let mut result = Vec::new();
    for (name, value) in headers {
        let folded = match value {
            Value::String(s) => s.clone(),
            Value::Null => continue,
            other => other.to_string(),
        };
        for line in folded.split('\n') {
            result.push(NameValue::new(name.clone(), line));
        }
    }
    result
}

/// Case-insensitive header lookup.
///
/// Multiple matches are joined with `", "`, except `Set-Cookie` which is
/// joined with `"\n"` since cookie values may legally contain commas.
pub fn header_value(headers: &[NameValue], name: &str) -> Option<String> {
    let values: Vec<&str> = headers
        .iter()
        .filter(|header| header.name.eq_ignore_ascii_case(name))
        .map(|header| header.value.as_str())
        .collect();

    if values.is_empty() {
        return None;
    }

    let separator = if name.eq_ignore_ascii_case("set-cookie") {
        "\n"
    } else {
        ", "
    };
    Some(values.join(separator))
}

/// Split `a=1&b=2` style parameter strings. Entries without `=` get an
/// empty value.
pub fn parse_parameters(query: &str) -> Vec<NameValue> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => NameValue::new(name, value),
            None => NameValue::new(pair, ""),
        })
        .collect()
}

/// Extract the HTTP version of a request or response.
///
/// The first line of request header text ends with the version
/// (`GET / HTTP/1.1`) while response header text starts with it
/// (`HTTP/1.1 200 OK`); header text without a version means `HTTP/0.9`.
/// Without header text the `version` or `:version` pseudo header is used,
/// and `"unknown"` when neither is present.
pub fn http_version(headers_text: Option<&str>, headers: &[NameValue], is_request: bool) -> String {
    let Some(text) = headers_text else {
        return header_value(headers, "version")
            .or_else(|| header_value(headers, ":version"))
            .unwrap_or_else(|| "unknown".to_string());
    };

    let first_line = text.lines().next().map(str::trim).unwrap_or("");
    let candidate = if is_request {
        first_line.rsplit(' ').next()
    } else {
        first_line.split(' ').next()
    };

    match candidate {
        Some(version) if version.starts_with("HTTP/") => version.to_string(),
        _ => "HTTP/0.9".to_string(),
    }
}

// =============================================================================
// Cookies
// =============================================================================

/// SameSite attribute of a response cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CookieSameSite {
    Strict,
    Lax,
    None,
}

impl CookieSameSite {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(CookieSameSite::Strict),
            "lax" => Some(CookieSameSite::Lax),
            "none" => Some(CookieSameSite::None),
            _ => None,
        }
    }
}

/// Whether a cookie came from a `Cookie` request header or a `Set-Cookie`
/// response header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CookieKind {
    Request,
    Response,
}

/// Parsed cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub kind: CookieKind,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub expires: Option<String>,
    pub max_age: Option<i64>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: Option<CookieSameSite>,
    /// Length of the raw cookie text
    pub size: usize,
}

impl Cookie {
    fn new(name: &str, value: &str, kind: CookieKind, size: usize) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            kind,
            domain: None,
            path: None,
            expires: None,
            max_age: None,
            http_only: false,
            secure: false,
            same_site: None,
            size,
        }
    }
}

/// Parse a `Cookie` request header (`a=1; b=2`)
pub fn parse_cookie(header: &str) -> Vec<Cookie> {
    header
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(Cookie::new(name, value.trim(), CookieKind::Request, pair.len()))
        })
        .collect()
}

/// Parse `Set-Cookie` header values, one cookie per line
pub fn parse_set_cookie(header: &str) -> Vec<Cookie> {
    header
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(parse_set_cookie_line)
        .collect()
}

fn parse_set_cookie_line(line: &str) -> Option<Cookie> {
    let mut parts = line.split(';');
    let first = parts.next()?.trim();
    let (name, value) = first.split_once('=').unwrap_or((first, ""));
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut cookie = Cookie::new(name, value.trim(), CookieKind::Response, line.len());
    for attribute in parts {
        let attribute = attribute.trim();
        let (key, value) = attribute.split_once('=').unwrap_or((attribute, ""));
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "domain" => cookie.domain = Some(value.to_string()),
            "path" => cookie.path = Some(value.to_string()),
            "expires" => cookie.expires = Some(value.to_string()),
            "max-age" => cookie.max_age = value.parse().ok(),
            "httponly" => cookie.http_only = true,
            "secure" => cookie.secure = true,
            "samesite" => cookie.same_site = CookieSameSite::parse(value),
            _ => {}
        }
    }
    Some(cookie)
}
