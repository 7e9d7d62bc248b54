//! URL decomposition for display names and paths

use url::Url;

const DATA_URL_DISPLAY_LENGTH: usize = 20;

/// Components of a request URL used for display
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParts {
    pub scheme: String,
    pub host: String,
    /// Path up to, not including, the last `/`
    pub folder_path_components: String,
    /// Path segment after the last `/`
    pub last_path_component: String,
    /// Query without the leading `?`
    pub query_params: String,
    pub is_data_url: bool,
    pub is_about_blank: bool,
    pub display_name: String,
}

impl UrlParts {
    /// Decompose `raw`. Unparseable URLs keep only their display name.
    pub fn parse(raw: &str) -> Self {
        let Ok(url) = Url::parse(raw) else {
            return Self {
                display_name: raw.to_string(),
                ..Self::default()
            };
        };

        let scheme = url.scheme().to_string();
        let is_data_url = scheme == "data";
        let is_about_blank = scheme == "about" && url.path() == "blank";

        let path = url.path();
        let (folder, last) = if is_data_url || is_about_blank {
            ("", "")
        } else {
            match path.rfind('/') {
                Some(index) => (&path[..index], &path[index + 1..]),
                None => ("", path),
            }
        };

        let mut parts = Self {
            scheme,
            host: url.host_str().unwrap_or("").to_string(),
            folder_path_components: folder.to_string(),
            last_path_component: last.to_string(),
            query_params: url.query().unwrap_or("").to_string(),
            is_data_url,
            is_about_blank,
            display_name: String::new(),
        };
        parts.display_name = parts.compute_display_name(raw);
        parts
    }

    fn compute_display_name(&self, raw: &str) -> String {
        if self.is_data_url {
            return data_url_display_name(raw);
        }
        if self.is_about_blank {
            return raw.to_string();
        }
        if !self.last_path_component.is_empty() {
            return self.last_path_component.clone();
        }
        let name = format!("{}/", self.host);
        if name == "/" {
            raw.to_string()
        } else {
            name
        }
    }
}

/// Shortened form of a data URL, truncated with an ellipsis
pub fn data_url_display_name(raw: &str) -> String {
    if raw.chars().count() <= DATA_URL_DISPLAY_LENGTH {
        return raw.to_string();
    }
    let mut shortened: String = raw.chars().take(DATA_URL_DISPLAY_LENGTH - 1).collect();
    shortened.push('\u{2026}');
    shortened
}

/// Raw query string of `raw`: the text after the first `?`, up to any `#`
pub fn query_string(raw: &str) -> Option<String> {
    let (_, rest) = raw.split_once('?')?;
    let query = rest.split('#').next().unwrap_or("");
    Some(query.to_string())
}

/// Name and path pair shown for a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameAndPath {
    pub name: String,
    pub path: String,
}

/// Derive the display name and path of `raw`, trimming `page_domain` from
/// the front of the path when it matches.
pub fn name_and_path(raw: &str, parts: &UrlParts, page_domain: Option<&str>) -> NameAndPath {
    if parts.is_data_url {
        return NameAndPath {
            name: data_url_display_name(raw),
            path: String::new(),
        };
    }
    if parts.is_about_blank {
        return NameAndPath {
            name: raw.to_string(),
            path: String::new(),
        };
    }

    let mut path = trim_domain(
        &format!("{}{}", parts.host, parts.folder_path_components),
        page_domain,
    );

    let name = if !parts.last_path_component.is_empty() || !parts.query_params.is_empty() {
        if parts.query_params.is_empty() {
            parts.last_path_component.clone()
        } else {
            format!("{}?{}", parts.last_path_component, parts.query_params)
        }
    } else if !parts.folder_path_components.is_empty() {
        let folder = &parts.folder_path_components;
        let start = folder.rfind('/').map(|index| index + 1).unwrap_or(0);
        if let Some(index) = path.rfind('/') {
            path.truncate(index);
        }
        format!("{}/", &folder[start..])
    } else {
        path.clear();
        parts.host.clone()
    };

    NameAndPath { name, path }
}

fn trim_domain(path: &str, page_domain: Option<&str>) -> String {
    match page_domain {
        Some(domain)
            if !domain.is_empty()
                && path.len() >= domain.len()
                && path.is_char_boundary(domain.len())
                && path[..domain.len()].eq_ignore_ascii_case(domain) =>
        {
            path[domain.len()..].to_string()
        }
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_http_url() {
        let parts = UrlParts::parse("https://example.com/static/js/app.js?v=2#top");

        assert_eq!(parts.scheme, "https");
        assert_eq!(parts.host, "example.com");
        assert_eq!(parts.folder_path_components, "/static/js");
        assert_eq!(parts.last_path_component, "app.js");
        assert_eq!(parts.query_params, "v=2");
        assert_eq!(parts.display_name, "app.js");
    }

    #[test]
    fn test_display_name_of_root() {
        let parts = UrlParts::parse("https://example.com/");
        assert_eq!(parts.display_name, "example.com/");
    }

    #[test]
    fn test_data_url() {
        let raw = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUg";
        let parts = UrlParts::parse(raw);

        assert!(parts.is_data_url);
        assert_eq!(parts.display_name.chars().count(), DATA_URL_DISPLAY_LENGTH);
        assert!(parts.display_name.ends_with('\u{2026}'));

        let named = name_and_path(raw, &parts, None);
        assert_eq!(named.path, "");
    }

    #[test]
    fn test_about_blank() {
        let parts = UrlParts::parse("about:blank");
        assert!(parts.is_about_blank);
        assert_eq!(name_and_path("about:blank", &parts, None).name, "about:blank");
    }

    #[test]
    fn test_unparseable_url() {
        let parts = UrlParts::parse("not a url");
        assert_eq!(parts.display_name, "not a url");
        assert_eq!(parts.host, "");
    }

    #[test]
    fn test_query_string() {
        assert_eq!(query_string("https://a.com/x?q=1&r=2#frag").as_deref(), Some("q=1&r=2"));
        assert_eq!(query_string("https://a.com/x?").as_deref(), Some(""));
        assert_eq!(query_string("https://a.com/x"), None);
    }

    #[test]
    fn test_name_and_path_for_file() {
        let raw = "https://example.com/static/app.js?v=2";
        let named = name_and_path(raw, &UrlParts::parse(raw), None);
        assert_eq!(named.name, "app.js?v=2");
        assert_eq!(named.path, "example.com/static");
    }

    #[test]
    fn test_name_and_path_for_folder() {
        let raw = "https://example.com/docs/guide/";
        let named = name_and_path(raw, &UrlParts::parse(raw), None);
        assert_eq!(named.name, "guide/");
        assert_eq!(named.path, "example.com/docs");
    }

    #[test]
    fn test_name_and_path_for_host_only() {
        let raw = "https://example.com";
        let named = name_and_path(raw, &UrlParts::parse(raw), None);
        assert_eq!(named.name, "example.com");
        assert_eq!(named.path, "");
    }

    #[test]
    fn test_page_domain_is_trimmed() {
        let raw = "https://example.com/static/app.js";
        let named = name_and_path(raw, &UrlParts::parse(raw), Some("example.com"));
        assert_eq!(named.path, "/static");
    }
}
