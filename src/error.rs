//! Startup failures.
//!
//! The status endpoint itself cannot fail, so the only errors in this crate
//! are the ones that stop the process from coming up.

use crate::config::ConfigError;
use crate::http::ServerError;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to initialize logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error(transparent)]
    Server(#[from] ServerError),
}
