//! API routes for domains with `api_enabled`.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{OriginalUri, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::host::{clean_host, request_host, site_host};
use crate::server::AppState;

/// Routes under `/api`, guarded by [`require_api`].
///
/// Unknown `/api` paths are routed too, so the guard answers for them before
/// the 404.
pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/hello", get(hello))
        .route("/api/users", get(users))
        .route("/api/data", post(data))
        .route("/api", any(unknown))
        .route("/api/{*rest}", any(unknown))
        .route_layer(middleware::from_fn_with_state(state, require_api))
}

/// Reject API requests for hosts whose domain has no API.
pub async fn require_api(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let allowed = {
        let host = request_host(&req).map(clean_host).unwrap_or_default();
        let host = site_host(host, &state.config);
        state
            .config
            .domain(host)
            .map(|d| d.api_enabled)
            .unwrap_or(false)
    };

    if allowed {
        next.run(req).await
    } else {
        tracing::debug!("API request rejected for {}", req.uri());
        (
            StatusCode::NOT_FOUND,
            "API endpoint not found for this domain",
        )
            .into_response()
    }
}

fn host_header(headers: &HeaderMap) -> &str {
    headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn hello(headers: HeaderMap, OriginalUri(uri): OriginalUri) -> Json<Value> {
    Json(json!({
        "message": "Hello World!",
        "domain": host_header(&headers),
        "path": uri.path(),
    }))
}

async fn users(headers: HeaderMap) -> Json<Value> {
    Json(json!({
        "users": ["John", "Jane", "Bob"],
        "domain": host_header(&headers),
    }))
}

async fn unknown() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

async fn data(body: Bytes) -> Json<Value> {
    Json(json!({
        "message": "Data received",
        "body": String::from_utf8_lossy(&body),
    }))
}
