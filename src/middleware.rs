use std::time::Instant;

use axum::{extract::Request, http::header::CONTENT_LENGTH, middleware::Next, response::Response};
use tracing::{info, warn};

/// One log line per request: method, url, status, body length and latency.
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let length = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if response.status().is_server_error() {
        warn!(method = %method, url = %uri, status, length, elapsed_ms, "HTTP request");
    } else {
        info!(method = %method, url = %uri, status, length, elapsed_ms, "HTTP request");
    }

    response
}
