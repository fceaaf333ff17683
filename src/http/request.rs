//! Per-request plumbing: correlation IDs, tracing spans, request metrics.
//!
//! # Design Decisions
//! - Request ID is set as early as possible and echoed on every response
//! - Metrics are labelled by matched route template, never the raw path

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Span;

use crate::observability::metrics;

/// Header carrying the correlation ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Tracing span for one request, tagged with its correlation ID.
pub fn request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

/// Record count and latency for every routed request.
pub async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(request).await;
    metrics::record_request(&method, &route, response.status().as_u16(), start);
    response
}
