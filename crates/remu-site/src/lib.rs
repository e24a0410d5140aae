//! Per-site build configuration for remu sites.
//!
//! A single source tree hosts several sites under `src/sites/<site>`. This
//! crate turns a site identifier into the paths and options the external
//! static-site build tool needs, and renders them in the tool's own shape.

pub mod emit;
pub mod resolver;

pub use emit::{EmitError, OutputFormat, ToolConfig};
pub use resolver::{
    site_from_env, BuildConfig, ConfigError, SiteResolver, DEV_ALLOWED_HOST, SHARED_ALIAS,
    SITE_ENV,
};
