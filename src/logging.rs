//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::PROXY_SECRET_HEADER;

/// The number of bytes of a request or response body logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Headers that carry credentials and must never be written to the logs.
const REDACTED_HEADERS: [&str; 3] = ["cookie", "set-cookie", PROXY_SECRET_HEADER];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If the body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// Session cookies and the proxy secret are redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(error) => {
            tracing::error!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    tracing::info!(
        "Received request: {} {}\nheaders: {:#?}\nbody: {}",
        parts.method,
        parts.uri,
        redact_headers(&parts.headers),
        truncate_body(&body)
    );
    log_full_body("request", &body);

    let request = Request::from_parts(parts, Body::from(body));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    tracing::info!(
        "Sending response: {}\nheaders: {:#?}\nbody: {}",
        parts.status,
        redact_headers(&parts.headers),
        truncate_body(&body)
    );
    log_full_body("response", &body);

    Response::from_parts(parts, Body::from(body))
}

fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    for name in REDACTED_HEADERS {
        if headers.contains_key(name) {
            headers.insert(name, HeaderValue::from_static("********"));
        }
    }

    headers
}

/// The body as text, cut to [LOG_BODY_LENGTH_LIMIT] bytes on a character boundary.
fn truncate_body(body: &Bytes) -> String {
    let text = String::from_utf8_lossy(body);

    if text.len() <= LOG_BODY_LENGTH_LIMIT {
        return format!("{text:?}");
    }

    let mut end = LOG_BODY_LENGTH_LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    format!("{:?}...", &text[..end])
}

fn log_full_body(kind: &str, body: &Bytes) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::debug!("Full {kind} body: {:?}", String::from_utf8_lossy(body));
    }
}
