//! Site configuration resolution.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Component, Path, PathBuf};

/// Environment variable naming the site to build.
pub const SITE_ENV: &str = "SITE";

/// Module alias for code shared between sites.
pub const SHARED_ALIAS: &str = "@shared";

/// Host the development server accepts besides localhost.
pub const DEV_ALLOWED_HOST: &str = "remu";

const SITES_DIR: &str = "src/sites";
const SHARED_DIR: &str = "src/shared";
const OUTPUT_DIR: &str = "dist";

/// Errors that can occur while resolving a site configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{variable} env not provided")]
    MissingConfiguration { variable: &'static str },
}

/// Resolved build configuration for one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Site identifier as supplied
    pub site_id: String,

    /// Absolute source root, `<root>/src/sites/<site>`
    pub source_dir: PathBuf,

    /// Output root relative to the project, `dist/<site>`
    pub output_dir: PathBuf,

    /// Module aliases to absolute paths
    pub aliases: BTreeMap<String, PathBuf>,

    /// Hosts the development server accepts
    pub allowed_hosts: BTreeSet<String>,
}

/// Derives build configurations relative to a project root.
#[derive(Debug, Clone)]
pub struct SiteResolver {
    project_root: PathBuf,
}

impl SiteResolver {
    /// Create a resolver for the given project root.
    ///
    /// A relative root is made absolute against the working directory, so
    /// every derived source path is absolute.
    pub fn new(project_root: impl AsRef<Path>) -> io::Result<Self> {
        let root = std::path::absolute(project_root)?;
        Ok(Self {
            project_root: normalize(&root),
        })
    }

    /// Create a resolver rooted at the process working directory.
    pub fn from_current_dir() -> io::Result<Self> {
        Self::new(std::env::current_dir()?)
    }

    /// Project root paths are resolved against.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Resolve the configuration for `site`.
    ///
    /// `None` and the empty string are both treated as absent. The
    /// identifier is used verbatim and is not checked against the sites
    /// present on disk.
    pub fn resolve(&self, site: Option<&str>) -> Result<BuildConfig, ConfigError> {
        let site_id = match site {
            Some(s) if !s.is_empty() => s,
            _ => {
                return Err(ConfigError::MissingConfiguration { variable: SITE_ENV });
            }
        };

        // Concatenate rather than join: an id starting with `/` must not
        // replace the base path.
        let source_dir = self.absolute(Path::new(&format!("{}/{}", SITES_DIR, site_id)));
        let output_dir = PathBuf::from(format!("{}/{}", OUTPUT_DIR, site_id));

        let mut aliases = BTreeMap::new();
        aliases.insert(SHARED_ALIAS.to_string(), self.absolute(Path::new(SHARED_DIR)));

        let allowed_hosts = BTreeSet::from([DEV_ALLOWED_HOST.to_string()]);

        tracing::debug!("Resolved site {} -> {}", site_id, source_dir.display());

        Ok(BuildConfig {
            site_id: site_id.to_string(),
            source_dir,
            output_dir,
            aliases,
            allowed_hosts,
        })
    }

    /// Resolve the configuration for the site named by `SITE`.
    pub fn resolve_env(&self) -> Result<BuildConfig, ConfigError> {
        self.resolve(site_from_env().as_deref())
    }

    fn absolute(&self, relative: &Path) -> PathBuf {
        normalize(&self.project_root.join(relative))
    }
}

/// Read the site identifier from the `SITE` environment variable.
///
/// Values that are not valid UTF-8 are treated as absent.
pub fn site_from_env() -> Option<String> {
    std::env::var(SITE_ENV).ok()
}

/// Lexically normalize a path: drop `.` and fold `..` into its parent.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}
