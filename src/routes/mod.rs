//! HTTP route handlers.
//!
//! The only route is `/status`. Other methods and paths fall through to the
//! router defaults (405 and 404). Request tracing is enabled via middleware
//! that generates a unique request ID for each incoming request.

pub mod status;

use axum::{middleware, routing::get, Router};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::CACHE_CONTROL_STATUS;
use crate::middleware::request_id_layer;
use crate::state::AppState;

/// Creates the Axum router.
pub fn create_router(state: AppState) -> Router {
    // Status - never cached, every poll must reach the handler
    let status_routes = Router::new()
        .route("/status", get(status::status))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_STATUS),
        ));

    Router::new()
        .merge(status_routes)
        .with_state(state)
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use tokio::time::Instant;
    use tower::ServiceExt; // for `oneshot`

    use crate::delay::{DelayPolicy, FixedSampler};

    const DELAY: Duration = Duration::from_secs(10);

    fn router_with_draw(draw: f64) -> Router {
        let policy = DelayPolicy::new(0.5, DELAY, Arc::new(FixedSampler(draw)));
        create_router(AppState::with_delay(policy))
    }

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_bytes(response: axum::response::Response) -> axum::body::Bytes {
        axum::body::to_bytes(response.into_body(), 10_000)
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_immediate() {
        let start = Instant::now();
        let response = router_with_draw(0.9)
            .oneshot(request(Method::GET, "/status"))
            .await
            .unwrap();
        assert!(start.elapsed() < DELAY);

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[http::header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(response.headers()[CACHE_CONTROL], "no-store");
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(&body_bytes(response).await[..], br#"{"status":"ok"}"#);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_delayed() {
        let start = Instant::now();
        let response = router_with_draw(0.1)
            .oneshot(request(Method::GET, "/status"))
            .await
            .unwrap();
        assert!(start.elapsed() >= DELAY);

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_status_rejects_other_methods() {
        for method in [Method::POST, Method::PUT, Method::DELETE] {
            let response = router_with_draw(0.9)
                .oneshot(request(method.clone(), "/status"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{}", method);
        }
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let response = router_with_draw(0.9)
            .oneshot(request(Method::GET, "/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_query_string_is_ignored() {
        let response = router_with_draw(0.9)
            .oneshot(request(Method::GET, "/status?verbose=1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(&body_bytes(response).await[..], br#"{"status":"ok"}"#);
    }
}
