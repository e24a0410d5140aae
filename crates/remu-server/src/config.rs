//! Server configuration (remu.toml).

use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::server::ServerError;

/// A site served for one host name.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DomainConfig {
    /// Host name the site answers to
    pub host: String,

    /// Directory holding the built site
    pub static_path: PathBuf,

    /// Whether `/api` routes are available on this host
    #[serde(default)]
    pub api_enabled: bool,
}

/// Configuration for the static host.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the site listener binds to
    pub listen: String,

    /// Address the metrics listener binds to
    pub metrics_listen: String,

    /// Domain served when a request arrives on a local alias
    pub localhost_test_domain: String,

    /// Host names treated as local development hosts
    pub local_aliases: Vec<String>,

    /// Extensions served with the short cache policy
    pub no_cache_extensions: Vec<String>,

    /// Served sites
    pub domains: Vec<DomainConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".to_string(),
            metrics_listen: "0.0.0.0:3001".to_string(),
            localhost_test_domain: "novi-tech.net".to_string(),
            local_aliases: vec!["localhost".to_string(), "remu".to_string()],
            no_cache_extensions: vec![".html".to_string()],
            domains: vec![
                DomainConfig {
                    host: "tmdev.pl".to_string(),
                    static_path: PathBuf::from("./public/tmdev"),
                    api_enabled: true,
                },
                DomainConfig {
                    host: "novi-tech.net".to_string(),
                    static_path: PathBuf::from("./public/novi-tech"),
                    api_enabled: false,
                },
            ],
        }
    }
}

impl ServerConfig {
    /// Load configuration from `path` if it exists, defaults otherwise.
    ///
    /// A file that exists but does not parse or validate is an error.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        if !path.exists() {
            tracing::debug!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml(&content)
            .map_err(|e| ServerError::Config(format!("{}: {}", path.display(), e)))?;

        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from TOML source.
    pub fn from_toml(source: &str) -> Result<Self, ServerError> {
        let config: Self =
            toml::from_str(source).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the domain table for empty and duplicate hosts.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.domains.is_empty() {
            return Err(ServerError::Config("no domains configured".to_string()));
        }

        let mut seen = HashSet::new();
        for domain in &self.domains {
            if domain.host.trim().is_empty() {
                return Err(ServerError::Config("domain with empty host".to_string()));
            }
            if !seen.insert(domain.host.as_str()) {
                return Err(ServerError::Config(format!(
                    "duplicate domain: {}",
                    domain.host
                )));
            }
        }

        Ok(())
    }

    /// Look up the domain configured for `host`.
    pub fn domain(&self, host: &str) -> Option<&DomainConfig> {
        self.domains.iter().find(|d| d.host == host)
    }

    /// Human readable overview of the configuration.
    pub fn summary(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "SERVER CONFIGURATION");
        let _ = writeln!(out, "Listen: {}", self.listen);
        let _ = writeln!(out, "Metrics: {}", self.metrics_listen);
        let _ = writeln!(out, "Localhost test domain: {}", self.localhost_test_domain);
        let _ = writeln!(out);
        let _ = writeln!(out, "DOMAIN MAPPINGS:");
        for domain in &self.domains {
            let api = if domain.api_enabled {
                "API enabled"
            } else {
                "no API"
            };
            let _ = writeln!(
                out,
                "   {} -> {} ({})",
                domain.host,
                domain.static_path.display(),
                api
            );
        }

        out
    }
}
