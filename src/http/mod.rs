//! HTTP server module.
//!
//! Plain HTTP listener with graceful shutdown on SIGTERM/SIGINT. In-flight
//! requests, including stalled ones, are given a grace period to finish.

mod server;
mod shutdown;

pub use server::{serve, start_server, ServerError};
