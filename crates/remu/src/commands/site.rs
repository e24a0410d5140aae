//! Site configuration command.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use remu_site::{OutputFormat, SiteResolver, ToolConfig};

/// Resolve `site` and print or write the build tool configuration.
pub fn run(
    site: Option<&str>,
    root: Option<PathBuf>,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let rendered = render(site, root, format)?;

    match output {
        Some(path) => {
            fs::write(&path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn render(site: Option<&str>, root: Option<PathBuf>, format: OutputFormat) -> Result<String> {
    let resolver = match root {
        Some(root) => SiteResolver::new(&root)
            .with_context(|| format!("Invalid project root: {}", root.display()))?,
        None => SiteResolver::from_current_dir().context("Failed to determine project root")?,
    };

    let config = resolver.resolve(site)?;
    tracing::info!(
        "Site {}: {} -> {}",
        config.site_id,
        config.source_dir.display(),
        config.output_dir.display()
    );

    Ok(ToolConfig::from(&config).render(format)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn fails_without_site() {
        let err = render(None, Some(PathBuf::from("/abs/project")), OutputFormat::Json)
            .unwrap_err();

        assert!(err.to_string().contains("SITE env not provided"));
    }

    #[test]
    fn relative_root_renders_absolute_paths() {
        let cwd = std::env::current_dir().unwrap();
        let rendered =
            render(Some("acme"), Some(PathBuf::from(".")), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        let src_dir = PathBuf::from(value["srcDir"].as_str().unwrap());
        assert!(src_dir.is_absolute());
        assert!(src_dir.starts_with(&cwd));
        assert!(src_dir.ends_with("src/sites/acme"));

        let shared = value["vite"]["resolve"]["alias"]["@shared"].as_str().unwrap();
        assert!(PathBuf::from(shared).is_absolute());
    }

    #[test]
    fn writes_rendered_config() {
        let temp = tempdir().unwrap();
        let out = temp.path().join("site.json");

        run(
            Some("acme"),
            Some(temp.path().to_path_buf()),
            OutputFormat::Json,
            Some(out.clone()),
        )
        .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(value["outDir"], "dist/acme");
        assert_eq!(
            value["srcDir"].as_str().unwrap(),
            temp.path().join("src/sites/acme").to_str().unwrap()
        );
    }
}
