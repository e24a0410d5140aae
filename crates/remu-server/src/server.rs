//! Multi-domain static host.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::cache::{CachedFile, StaticCache};
use crate::config::ServerConfig;
use crate::host::{clean_host, has_extension, request_host, site_host};
use crate::metrics::{self as request_metrics, Metrics};
use crate::routing::{self, Resolution, ServedAs};
use crate::watcher::FileWatcher;

const SHORT_CACHE: &str = "public, max-age=300";
const LONG_CACHE: &str = "public, max-age=31536000, immutable";

const RELOAD_DEBOUNCE: Duration = Duration::from_millis(200);

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("File watch error: {0}")]
    WatchError(String),

    #[error("Metrics error: {0}")]
    Metrics(String),
}

impl From<prometheus::Error> for ServerError {
    fn from(e: prometheus::Error) -> Self {
        Self::Metrics(e.to_string())
    }
}

/// Options that only affect how the server runs.
#[derive(Debug, Clone, Default)]
pub struct ServeOptions {
    /// Rebuild the cache when files under a static path change
    pub watch: bool,

    /// Open a browser on the local test domain
    pub open: bool,
}

/// Shared server state.
pub struct AppState {
    pub config: ServerConfig,
    pub cache: RwLock<StaticCache>,
}

impl AppState {
    /// Create state with the cache preloaded from every static path.
    pub fn new(config: ServerConfig) -> Self {
        let cache = StaticCache::preload(&config);
        Self::with_cache(config, cache)
    }

    /// Create state around an existing cache.
    pub fn with_cache(config: ServerConfig, cache: StaticCache) -> Self {
        Self {
            config,
            cache: RwLock::new(cache),
        }
    }

    /// Re-read every static path and swap the cache.
    pub async fn reload(&self) {
        let config = self.config.clone();
        match tokio::task::spawn_blocking(move || StaticCache::preload(&config)).await {
            Ok(cache) => {
                let count = cache.len();
                *self.cache.write().await = cache;
                tracing::info!("Reloaded cache with {} files", count);
            }
            Err(e) => tracing::warn!("Cache reload failed: {}", e),
        }
    }
}

/// Static host server.
pub struct Server {
    config: ServerConfig,
    options: ServeOptions,
}

impl Server {
    /// Create a new server.
    pub fn new(config: ServerConfig, options: ServeOptions) -> Self {
        Self { config, options }
    }

    /// Start the site and metrics listeners and serve until shutdown.
    pub async fn start(self) -> Result<(), ServerError> {
        self.config.validate()?;

        let addr = parse_addr(&self.config.listen)?;
        let metrics_addr = parse_addr(&self.config.metrics_listen)?;

        tracing::info!("\n{}", self.config.summary());

        let state = Arc::new(AppState::new(self.config));
        let metrics = Arc::new(Metrics::new()?);

        if self.options.watch {
            spawn_reloader(Arc::clone(&state))?;
        }

        let metrics_listener = tokio::net::TcpListener::bind(metrics_addr)
            .await
            .map_err(|e| ServerError::BindError(metrics_addr, e.to_string()))?;
        let metrics_app = metrics_router(Arc::clone(&metrics));
        tokio::spawn(async move {
            if let Err(e) = axum::serve(metrics_listener, metrics_app).await {
                tracing::warn!("Metrics server stopped: {}", e);
            }
        });
        tracing::info!("Metrics at http://{}/metrics", metrics_addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        tracing::info!("Serving sites at http://{}", addr);

        if self.options.open {
            let url = format!("http://localhost:{}", addr.port());
            if let Err(e) = open::that(&url) {
                tracing::warn!("Failed to open browser at {}: {}", url, e);
            }
        }

        axum::serve(listener, router(state, metrics))
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        Ok(())
    }
}

fn parse_addr(listen: &str) -> Result<SocketAddr, ServerError> {
    listen
        .parse()
        .map_err(|_| ServerError::InvalidAddress(listen.to_string()))
}

/// Build the site router: static files, API routes and request metrics.
pub fn router(state: Arc<AppState>, metrics: Arc<Metrics>) -> Router {
    Router::new()
        .merge(api::routes(Arc::clone(&state)))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            serve_static,
        ))
        .layer(middleware::from_fn_with_state(metrics, request_metrics::track))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the router for the metrics listener.
pub fn metrics_router(metrics: Arc<Metrics>) -> Router {
    Router::new()
        .route("/metrics", get(request_metrics::metrics_handler))
        .with_state(metrics)
}

fn spawn_reloader(state: Arc<AppState>) -> Result<(), ServerError> {
    let paths: Vec<PathBuf> = state
        .config
        .domains
        .iter()
        .map(|d| d.static_path.clone())
        .collect();

    let (watcher, mut rx) =
        FileWatcher::new(&paths).map_err(|e| ServerError::WatchError(e.to_string()))?;

    tokio::spawn(async move {
        // Keep watcher alive
        let _watcher = watcher;

        while let Some(event) = rx.recv().await {
            tracing::debug!("Change detected: {}", event.path().display());

            // Coalesce a burst of events into one reload
            tokio::time::sleep(RELOAD_DEBOUNCE).await;
            while rx.try_recv().is_ok() {}

            state.reload().await;
        }
    });

    tracing::info!("Watching {} static paths", paths.len());
    Ok(())
}

enum Handled {
    Router(Option<ServedAs>),
    Done(Response),
}

/// Middleware serving cached site files by host.
async fn serve_static(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let handled = {
        let cache = state.cache.read().await;
        let host = request_host(&req).map(clean_host).unwrap_or_default();
        let domain = state.config.domain(site_host(host, &state.config));

        match routing::resolve(&cache, domain, req.uri().path()) {
            Resolution::PassThrough => Handled::Router(None),
            Resolution::Api => Handled::Router(Some(ServedAs::Api)),
            Resolution::Serve {
                key,
                file,
                served_as,
            } => Handled::Done(file_response(
                &state.config,
                req.method(),
                &key,
                file,
                served_as,
            )),
            Resolution::NotFound { served_as } => {
                let mut response = (StatusCode::NOT_FOUND, "Not Found").into_response();
                if let Some(served_as) = served_as {
                    response.extensions_mut().insert(served_as);
                }
                Handled::Done(response)
            }
        }
    };

    match handled {
        Handled::Router(served_as) => {
            let mut response = next.run(req).await;
            if let Some(served_as) = served_as {
                response.extensions_mut().insert(served_as);
            }
            response
        }
        Handled::Done(response) => response,
    }
}

fn file_response(
    config: &ServerConfig,
    method: &Method,
    key: &str,
    file: &CachedFile,
    served_as: ServedAs,
) -> Response {
    let cache_control = if has_extension(key, &config.no_cache_extensions) {
        SHORT_CACHE
    } else {
        LONG_CACHE
    };

    let headers = [
        (header::CONTENT_TYPE, file.content_type.clone()),
        (header::CACHE_CONTROL, cache_control.to_string()),
    ];

    let mut response = if *method == Method::HEAD {
        (StatusCode::OK, headers).into_response()
    } else {
        (StatusCode::OK, headers, file.data.clone()).into_response()
    };
    response.extensions_mut().insert(served_as);
    response
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
