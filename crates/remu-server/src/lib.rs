//! Multi-domain static host for built remu sites.
//!
//! Serves several `dist/<site>` trees from memory, choosing the site by the
//! request's `Host` header, with a small API surface for selected domains
//! and Prometheus request metrics on a separate listener.

pub mod api;
pub mod cache;
pub mod config;
pub mod host;
pub mod metrics;
pub mod routing;
pub mod server;
pub mod watcher;

pub use cache::{CachedFile, StaticCache};
pub use config::{DomainConfig, ServerConfig};
pub use metrics::Metrics;
pub use routing::{Resolution, ServedAs};
pub use server::{AppState, ServeOptions, Server, ServerError};
pub use watcher::{FileWatcher, WatchEvent};
