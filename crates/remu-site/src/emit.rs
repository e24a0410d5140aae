//! Rendering a resolved configuration for the build tool.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::resolver::BuildConfig;

/// Output formats for the rendered configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Toml,
}

impl FromStr for OutputFormat {
    type Err = EmitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            other => Err(EmitError::UnknownFormat(other.to_string())),
        }
    }
}

/// Errors that can occur when rendering.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("Unknown output format: {0} (expected json or toml)")]
    UnknownFormat(String),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to serialize TOML: {0}")]
    Toml(#[from] toml::ser::Error),
}

/// Configuration document in the shape the build tool reads.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    pub root: String,
    pub src_dir: PathBuf,
    pub out_dir: PathBuf,
    pub vite: ViteOptions,
    pub server: ServerOptions,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ViteOptions {
    pub resolve: ResolveOptions,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResolveOptions {
    pub alias: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerOptions {
    pub allowed_hosts: Vec<String>,
}

impl From<&BuildConfig> for ToolConfig {
    fn from(config: &BuildConfig) -> Self {
        Self {
            root: ".".to_string(),
            src_dir: config.source_dir.clone(),
            out_dir: config.output_dir.clone(),
            vite: ViteOptions {
                resolve: ResolveOptions {
                    alias: config.aliases.clone(),
                },
            },
            server: ServerOptions {
                allowed_hosts: config.allowed_hosts.iter().cloned().collect(),
            },
        }
    }
}

impl ToolConfig {
    /// Render the document in the requested format.
    pub fn render(&self, format: OutputFormat) -> Result<String, EmitError> {
        let rendered = match format {
            OutputFormat::Json => serde_json::to_string_pretty(self)?,
            OutputFormat::Toml => toml::to_string_pretty(self)?,
        };
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::SiteResolver;
    use pretty_assertions::assert_eq;

    fn acme() -> ToolConfig {
        let config = SiteResolver::new("/abs/project")
            .unwrap()
            .resolve(Some("acme"))
            .unwrap();
        ToolConfig::from(&config)
    }

    #[test]
    fn renders_tool_shaped_json() {
        let json = acme().render(OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "root": ".",
                "srcDir": "/abs/project/src/sites/acme",
                "outDir": "dist/acme",
                "vite": { "resolve": { "alias": { "@shared": "/abs/project/src/shared" } } },
                "server": { "allowedHosts": ["remu"] }
            })
        );
    }

    #[test]
    fn renders_toml() {
        let rendered = acme().render(OutputFormat::Toml).unwrap();
        let value: toml::Value = toml::from_str(&rendered).unwrap();

        assert_eq!(value["srcDir"].as_str(), Some("/abs/project/src/sites/acme"));
        assert_eq!(value["outDir"].as_str(), Some("dist/acme"));
        assert_eq!(
            value["vite"]["resolve"]["alias"]["@shared"].as_str(),
            Some("/abs/project/src/shared")
        );
        assert_eq!(value["server"]["allowedHosts"][0].as_str(), Some("remu"));
    }

    #[test]
    fn parses_formats() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("TOML".parse::<OutputFormat>().unwrap(), OutputFormat::Toml);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
