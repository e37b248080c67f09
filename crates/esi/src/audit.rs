//! Audit log of completed requests.

use std::time::Instant;

use axum::body::HttpBody;
use axum::extract::Request;
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use tracing::info;

/// Log one `esi::audit` event per request once its response is ready.
///
/// The event records the sizes of the request and response bodies, not
/// their contents. A size is left out when it is not known up front, as
/// for streamed account files.
pub async fn audit_log(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let request_bytes = request_size(&request);
    let started = Instant::now();

    let response = next.run(request).await;

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(
        target: "esi::audit",
        %method,
        %uri,
        status = response.status().as_u16(),
        latency_ms,
        request_bytes,
        response_bytes = response_size(&response),
        request_id = request_id.as_deref().unwrap_or("-"),
        "handled request"
    );
    response
}

fn request_size(request: &Request) -> Option<u64> {
    content_length(request.headers()).or_else(|| request.body().size_hint().exact())
}

fn response_size(response: &Response) -> Option<u64> {
    content_length(response.headers()).or_else(|| response.body().size_hint().exact())
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}
