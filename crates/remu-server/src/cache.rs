//! In-memory cache of the built sites.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::config::ServerConfig;

/// A cached file body and its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFile {
    pub data: Bytes,
    pub content_type: String,
}

/// Files of every configured domain, keyed `host + "/" + relative path`.
#[derive(Debug, Default, Clone)]
pub struct StaticCache {
    files: HashMap<String, CachedFile>,
}

impl StaticCache {
    /// Read every file under each domain's static path.
    ///
    /// Missing directories contribute nothing. Files that cannot be read are
    /// logged and skipped.
    pub fn preload(config: &ServerConfig) -> Self {
        let mut files = HashMap::new();

        for domain in &config.domains {
            let found: Vec<PathBuf> = WalkDir::new(&domain.static_path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .collect();

            let loaded: Vec<(String, CachedFile)> = found
                .par_iter()
                .filter_map(|path| load_file(&domain.host, &domain.static_path, path))
                .collect();

            tracing::info!(
                "Cached {} files for {} from {}",
                loaded.len(),
                domain.host,
                domain.static_path.display()
            );

            files.extend(loaded);
        }

        Self { files }
    }

    /// Look up a cache key.
    pub fn get(&self, key: &str) -> Option<&CachedFile> {
        self.files.get(key)
    }

    /// Insert an entry directly.
    pub fn insert(&mut self, key: impl Into<String>, file: CachedFile) {
        self.files.insert(key.into(), file);
    }

    /// Number of cached files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the cache holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn load_file(host: &str, root: &Path, path: &Path) -> Option<(String, CachedFile)> {
    let relative = path.strip_prefix(root).ok()?;
    let relative = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!("Error reading {}: {}", path.display(), e);
            return None;
        }
    };

    let content_type = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string();

    Some((
        format!("{}/{}", host, relative),
        CachedFile {
            data: Bytes::from(data),
            content_type,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DomainConfig;
    use tempfile::tempdir;

    fn config_for(host: &str, root: &Path) -> ServerConfig {
        ServerConfig {
            domains: vec![DomainConfig {
                host: host.to_string(),
                static_path: root.to_path_buf(),
                api_enabled: false,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn preloads_nested_files() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("assets")).unwrap();
        fs::write(temp.path().join("index.html"), "<h1>Home</h1>").unwrap();
        fs::write(temp.path().join("assets/app.js"), "console.log(1)").unwrap();
        fs::write(temp.path().join("blob"), [0u8, 1, 2]).unwrap();

        let cache = StaticCache::preload(&config_for("acme.test", temp.path()));

        assert_eq!(cache.len(), 3);

        let index = cache.get("acme.test/index.html").unwrap();
        assert_eq!(index.content_type, "text/html");
        assert_eq!(index.data, Bytes::from_static(b"<h1>Home</h1>"));

        let js = cache.get("acme.test/assets/app.js").unwrap();
        assert!(js.content_type.contains("javascript"));

        let blob = cache.get("acme.test/blob").unwrap();
        assert_eq!(blob.content_type, "application/octet-stream");
    }

    #[test]
    fn missing_directory_is_empty() {
        let temp = tempdir().unwrap();
        let cache = StaticCache::preload(&config_for("acme.test", &temp.path().join("nope")));

        assert!(cache.is_empty());
    }
}
