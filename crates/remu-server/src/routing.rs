//! Mapping request paths onto cached site files.

use crate::cache::{CachedFile, StaticCache};
use crate::config::DomainConfig;
use crate::host::{has_ext, normalize_path};

/// How a request was handled, recorded on the response for metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedAs {
    /// Passed through to the API routes
    Api,
    /// A cached HTML file
    Html,
    /// A cached non-HTML file
    Static,
    /// A path with an extension that was not cached
    StaticAttempt,
    /// The site index served for an unknown route
    SpaFallback,
}

/// Outcome of static resolution for one request.
#[derive(Debug, PartialEq)]
pub enum Resolution<'a> {
    /// Let the router handle the request
    PassThrough,
    /// Let the API routes handle the request
    Api,
    /// Serve a cached file
    Serve {
        key: String,
        file: &'a CachedFile,
        served_as: ServedAs,
    },
    /// Nothing matched
    NotFound { served_as: Option<ServedAs> },
}

/// Resolve `raw_path` for `domain`.
///
/// `domain` is `None` for hosts that are not configured.
pub fn resolve<'a>(
    cache: &'a StaticCache,
    domain: Option<&DomainConfig>,
    raw_path: &str,
) -> Resolution<'a> {
    let Some(domain) = domain else {
        return Resolution::PassThrough;
    };

    let host = domain.host.as_str();
    let path = normalize_path(raw_path);

    if domain.api_enabled && path.starts_with("/api/") {
        return Resolution::Api;
    }

    // Paths with an extension never fall back to the site index.
    if has_ext(&path) {
        let key = format!("{}{}", host, path);
        return match cache.get(&key) {
            Some(file) => {
                let served_as = if path.to_lowercase().ends_with(".html") {
                    ServedAs::Html
                } else {
                    ServedAs::Static
                };
                Resolution::Serve {
                    key,
                    file,
                    served_as,
                }
            }
            None => Resolution::NotFound {
                served_as: Some(ServedAs::StaticAttempt),
            },
        };
    }

    let page_key = if path.ends_with('/') {
        format!("{}{}index.html", host, path)
    } else {
        format!("{}{}.html", host, path)
    };
    if let Some(file) = cache.get(&page_key) {
        return Resolution::Serve {
            key: page_key,
            file,
            served_as: ServedAs::Html,
        };
    }

    let index_key = format!("{}/index.html", host);
    if let Some(file) = cache.get(&index_key) {
        return Resolution::Serve {
            key: index_key,
            file,
            served_as: ServedAs::SpaFallback,
        };
    }

    Resolution::NotFound { served_as: None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use std::path::PathBuf;

    fn file(body: &'static str, content_type: &str) -> CachedFile {
        CachedFile {
            data: Bytes::from_static(body.as_bytes()),
            content_type: content_type.to_string(),
        }
    }

    fn domain(api_enabled: bool) -> DomainConfig {
        DomainConfig {
            host: "acme.test".to_string(),
            static_path: PathBuf::from("dist/acme"),
            api_enabled,
        }
    }

    fn cache() -> StaticCache {
        let mut cache = StaticCache::default();
        cache.insert("acme.test/index.html", file("home", "text/html"));
        cache.insert("acme.test/about.html", file("about", "text/html"));
        cache.insert("acme.test/docs/index.html", file("docs", "text/html"));
        cache.insert("acme.test/app.js", file("js", "text/javascript"));
        cache
    }

    fn served(resolution: Resolution<'_>) -> (String, ServedAs) {
        match resolution {
            Resolution::Serve { key, served_as, .. } => (key, served_as),
            other => panic!("expected a served file, got {:?}", other),
        }
    }

    #[test]
    fn unknown_host_passes_through() {
        assert_eq!(resolve(&cache(), None, "/"), Resolution::PassThrough);
    }

    #[test]
    fn api_paths_pass_through_on_api_domains() {
        assert_eq!(
            resolve(&cache(), Some(&domain(true)), "/api/hello"),
            Resolution::Api
        );
    }

    #[test]
    fn api_paths_fall_back_to_index_without_api() {
        let (key, served_as) = served(resolve(&cache(), Some(&domain(false)), "/api/hello"));

        assert_eq!(key, "acme.test/index.html");
        assert_eq!(served_as, ServedAs::SpaFallback);
    }

    #[test]
    fn serves_files_with_extensions() {
        let c = cache();
        let d = domain(false);

        assert_eq!(
            served(resolve(&c, Some(&d), "/app.js")),
            ("acme.test/app.js".to_string(), ServedAs::Static)
        );
        assert_eq!(
            served(resolve(&c, Some(&d), "//about.html")),
            ("acme.test/about.html".to_string(), ServedAs::Html)
        );
    }

    #[test]
    fn missing_files_with_extensions_do_not_fall_back() {
        assert_eq!(
            resolve(&cache(), Some(&domain(false)), "/missing.css"),
            Resolution::NotFound {
                served_as: Some(ServedAs::StaticAttempt)
            }
        );
    }

    #[test]
    fn serves_directory_indexes_and_pages() {
        let c = cache();
        let d = domain(false);

        assert_eq!(
            served(resolve(&c, Some(&d), "/")),
            ("acme.test/index.html".to_string(), ServedAs::Html)
        );
        assert_eq!(
            served(resolve(&c, Some(&d), "/docs/")),
            ("acme.test/docs/index.html".to_string(), ServedAs::Html)
        );
        assert_eq!(
            served(resolve(&c, Some(&d), "/about")),
            ("acme.test/about.html".to_string(), ServedAs::Html)
        );
    }

    #[test]
    fn unknown_routes_use_spa_fallback() {
        let (key, served_as) = served(resolve(&cache(), Some(&domain(false)), "/docs"));

        assert_eq!(key, "acme.test/index.html");
        assert_eq!(served_as, ServedAs::SpaFallback);
    }

    #[test]
    fn empty_site_is_not_found() {
        assert_eq!(
            resolve(&StaticCache::default(), Some(&domain(false)), "/about"),
            Resolution::NotFound { served_as: None }
        );
    }
}
