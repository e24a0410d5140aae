//! Write a starter server configuration.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use remu_server::ServerConfig;

/// Run the init command.
pub fn run(config_path: &Path, yes: bool) -> Result<()> {
    if config_path.exists() && !yes {
        tracing::warn!(
            "{} already exists. Use --yes to overwrite.",
            config_path.display()
        );
        return Ok(());
    }

    // Refuse to write something the server would not load
    ServerConfig::from_toml(DEFAULT_CONFIG).context("Default config is invalid")?;

    fs::write(config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    tracing::info!("Created {}", config_path.display());

    for dir in ["public/tmdev", "public/novi-tech"] {
        fs::create_dir_all(config_path.with_file_name(dir))
            .with_context(|| format!("Failed to create {}", dir))?;
    }

    tracing::info!("Run 'remu serve' to start the static host.");

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# remu static host configuration

# Site listener
listen = "0.0.0.0:3000"

# Prometheus metrics listener (GET /metrics)
metrics_listen = "0.0.0.0:3001"

# Requests for these hosts are served as localhost_test_domain
localhost_test_domain = "novi-tech.net"
local_aliases = ["localhost", "remu"]

# Served with "max-age=300"; everything else is cached for a year
no_cache_extensions = [".html"]

[[domains]]
host = "tmdev.pl"
static_path = "./public/tmdev"
api_enabled = true

[[domains]]
host = "novi-tech.net"
static_path = "./public/novi-tech"
"#;
