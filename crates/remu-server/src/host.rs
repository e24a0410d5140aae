//! Host and path helpers.

use std::path::Path;
use std::sync::OnceLock;

use axum::extract::Request;
use axum::http::header;
use regex::Regex;

use crate::config::ServerConfig;

/// Strip a `:port` suffix from a host.
pub fn clean_host(host: &str) -> &str {
    match host.split_once(':') {
        Some((name, _)) => name,
        None => host,
    }
}

/// Map a cleaned host to the domain it is served as.
///
/// Local aliases such as `localhost` stand in for the configured test domain.
pub fn site_host<'a>(host: &'a str, config: &'a ServerConfig) -> &'a str {
    if config.local_aliases.iter().any(|alias| alias == host) {
        &config.localhost_test_domain
    } else {
        host
    }
}

/// Raw host of a request, from the `Host` header or the URI authority.
pub fn request_host(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()))
}

/// Collapse repeated slashes.
pub fn collapse_slashes(path: &str) -> String {
    static SLASHES: OnceLock<Regex> = OnceLock::new();
    let re = SLASHES.get_or_init(|| Regex::new("/{2,}").expect("valid regex"));
    re.replace_all(path, "/").into_owned()
}

/// Collapse repeated slashes and make sure the path is rooted.
pub fn normalize_path(path: &str) -> String {
    let collapsed = collapse_slashes(path);
    if collapsed.starts_with('/') {
        collapsed
    } else {
        format!("/{}", collapsed)
    }
}

/// Whether the last segment of `path` has an extension.
///
/// A leading dot (`/.well-known`) does not count.
pub fn has_ext(path: &str) -> bool {
    let segment = path.rsplit('/').next().unwrap_or(path);
    matches!(segment.rfind('.'), Some(i) if i > 0)
}

/// Whether `path` ends in one of `exts` (given with a leading dot).
pub fn has_extension(path: &str, exts: &[String]) -> bool {
    let ext = match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!(".{}", ext.to_lowercase()),
        None => return false,
    };
    exts.iter().any(|e| e.to_lowercase() == ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn strips_port() {
        assert_eq!(clean_host("tmdev.pl:3000"), "tmdev.pl");
        assert_eq!(clean_host("tmdev.pl"), "tmdev.pl");
    }

    #[test]
    fn local_aliases_map_to_test_domain() {
        let config = ServerConfig::default();

        assert_eq!(site_host("localhost", &config), "novi-tech.net");
        assert_eq!(site_host("remu", &config), "novi-tech.net");
        assert_eq!(site_host("tmdev.pl", &config), "tmdev.pl");
    }

    #[test]
    fn reads_host_header() {
        let req = axum::http::Request::builder()
            .uri("/index.html")
            .header("host", "tmdev.pl:3000")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_host(&req), Some("tmdev.pl:3000"));

        let req = axum::http::Request::builder()
            .uri("http://novi-tech.net/")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_host(&req), Some("novi-tech.net"));
    }

    #[test]
    fn normalizes_paths() {
        assert_eq!(normalize_path("//a///b"), "/a/b");
        assert_eq!(normalize_path("a/b"), "/a/b");
        assert_eq!(normalize_path(""), "/");
    }

    #[test]
    fn detects_extensions() {
        assert!(has_ext("/app.js"));
        assert!(has_ext("/assets/logo.min.svg"));
        assert!(!has_ext("/about"));
        assert!(!has_ext("/.well-known"));
        assert!(!has_ext("/v1.2/docs"));
    }

    #[test]
    fn matches_extension_list_case_insensitively() {
        let exts = vec![".html".to_string()];

        assert!(has_extension("tmdev.pl/index.HTML", &exts));
        assert!(!has_extension("tmdev.pl/app.js", &exts));
        assert!(!has_extension("tmdev.pl/README", &exts));
    }
}
