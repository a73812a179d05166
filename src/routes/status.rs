//! Status endpoint with injected latency.
//!
//! Always reports `{"status": "ok"}`, but a random share of requests is held
//! open first so callers can exercise their timeout handling.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Fixed body of every status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub const OK: StatusResponse = StatusResponse { status: "ok" };
}

/// `GET /status`
///
/// Consumes nothing from the request and has no failure path. Whether the
/// answer is stalled is decided by the state's delay policy.
pub async fn status(State(state): State<AppState>) -> (StatusCode, Json<StatusResponse>) {
    state.delay.apply().await;
    (StatusCode::OK, Json(StatusResponse::OK))
}
