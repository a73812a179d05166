//! flaky-status: a status endpoint that randomly stalls.
//!
//! `GET /status` always answers `{"status": "ok"}`, but a configurable share
//! of requests is held open for a fixed time first. Point a client at it to
//! check that its timeouts and retries behave.

pub mod config;
pub mod delay;
pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::AppConfig;
pub use delay::{DelayDecision, DelayPolicy, UnitSampler};
pub use error::StartupError;
pub use routes::create_router;
pub use state::AppState;
