//! Request ID middleware for correlating logs with requests.
//!
//! Assigns each incoming request an ID and creates a tracing span that wraps
//! the entire request lifecycle, so the stall decision and the completion log
//! share the same request_id. A caller-supplied `X-Request-Id` is reused,
//! otherwise a UUID v4 is generated. The ID is echoed on the response.
//!
//! The inner stack runs on its own task. A client that hangs up mid-stall
//! drops only the connection; the handler still finishes and the completion
//! is still logged.

use std::time::Instant;

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Longest caller-supplied ID that is trusted as-is
const MAX_REQUEST_ID_LEN: usize = 128;

fn incoming_request_id(request: &Request) -> Option<String> {
    let value = request.headers().get(&REQUEST_ID_HEADER)?.to_str().ok()?;
    if value.is_empty() || value.len() > MAX_REQUEST_ID_LEN {
        return None;
    }
    Some(value.to_string())
}

/// Middleware that assigns a request ID and creates a request span.
///
/// This should be the outermost middleware layer so the span wraps
/// all request processing, including other middleware and handlers.
pub async fn request_id_layer(request: Request, next: Next) -> Response {
    let request_id =
        incoming_request_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        duration_ms = tracing::field::Empty,
    );

    let start = Instant::now();

    let task = tokio::spawn(
        async move {
            let response = next.run(request).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            tracing::Span::current().record("duration_ms", duration_ms);
            tracing::info!(
                status = response.status().as_u16(),
                duration_ms,
                "Request completed"
            );
            response
        }
        .instrument(span),
    );

    let mut response = match task.await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Request task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    };

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
