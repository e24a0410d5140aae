//! Prometheus request metrics.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::host::{clean_host, collapse_slashes, request_host};
use crate::routing::ServedAs;
use crate::server::ServerError;

/// Request counters and latency histograms.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
}

impl Metrics {
    /// Create and register the request metrics.
    pub fn new() -> Result<Self, ServerError> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests."),
            &["host", "method", "code", "route"],
        )?;
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds.",
            ),
            &["host", "method", "route"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration,
        })
    }

    /// Record one finished request.
    pub fn observe(&self, host: &str, method: &str, status: u16, route: &str, seconds: f64) {
        let code = status.to_string();
        self.requests_total
            .with_label_values(&[host, method, code.as_str(), route])
            .inc();
        self.request_duration
            .with_label_values(&[host, method, route])
            .observe(seconds);
    }

    /// Render all metrics in the text exposition format.
    pub fn render(&self) -> Result<String, ServerError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| ServerError::Metrics(e.to_string()))
    }
}

/// Label for the `route` dimension.
///
/// Static traffic is grouped so arbitrary paths do not explode cardinality.
pub fn route_label(raw: &str, status: StatusCode, served_as: Option<ServedAs>) -> String {
    let raw = collapse_slashes(raw);
    match served_as {
        Some(ServedAs::Api) => raw,
        Some(ServedAs::Html) => "<html>".to_string(),
        Some(ServedAs::Static) | Some(ServedAs::StaticAttempt) => "<static>".to_string(),
        Some(ServedAs::SpaFallback) => "<spa fallback>".to_string(),
        None if status == StatusCode::NOT_FOUND => "<404>".to_string(),
        None => raw,
    }
}

/// Middleware recording every request.
pub async fn track(State(metrics): State<Arc<Metrics>>, req: Request, next: Next) -> Response {
    let start = Instant::now();

    let host = request_host(&req)
        .map(|h| clean_host(h).to_lowercase())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    let method = req.method().as_str().to_uppercase();
    let raw_path = req.uri().path().to_string();

    let response = next.run(req).await;

    let status = response.status();
    let served_as = response.extensions().get::<ServedAs>().copied();
    let route = route_label(&raw_path, status, served_as);

    metrics.observe(
        &host,
        &method,
        status.as_u16(),
        &route,
        start.elapsed().as_secs_f64(),
    );

    response
}

/// Handler for `GET /metrics`.
pub async fn metrics_handler(State(metrics): State<Arc<Metrics>>) -> Response {
    match metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("Failed to render metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
