//! Shared application state for request handlers.

use crate::config::AppConfig;
use crate::delay::DelayPolicy;

/// Shared application state, cloned into every handler.
///
/// Read-only after startup, so handlers never contend on it.
#[derive(Clone, Debug)]
pub struct AppState {
    pub delay: DelayPolicy,
}

impl AppState {
    /// Creates state whose delay policy follows the `[fault]` section of `config`.
    pub fn new(config: &AppConfig) -> Self {
        Self::with_delay(DelayPolicy::from_config(&config.fault))
    }

    /// Creates state with an explicit delay policy, e.g. one driven by a fixed sampler.
    pub fn with_delay(delay: DelayPolicy) -> Self {
        Self { delay }
    }
}
