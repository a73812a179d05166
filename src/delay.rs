//! Fault injection for the status endpoint.
//!
//! Every request makes one uniform draw in `[0, 1)`. Draws below the
//! configured probability stall the request for a fixed duration before it
//! is answered. The source of randomness is a [`UnitSampler`] so tests can
//! force either branch or replay a seeded run.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::FaultConfig;

/// Outcome of a single draw. Lives only as long as the request it serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayDecision {
    /// Stall before answering
    Delay,
    /// Answer immediately
    Proceed,
}

impl DelayDecision {
    pub fn is_delayed(self) -> bool {
        matches!(self, DelayDecision::Delay)
    }
}

/// Source of uniformly distributed values in `[0, 1)`.
pub trait UnitSampler: Send + Sync {
    fn sample(&self) -> f64;
}

/// Draws from the thread-local generator. Nothing is shared between requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSampler;

impl UnitSampler for ThreadRngSampler {
    fn sample(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Reproducible draws from a seeded generator.
pub struct SeededSampler {
    rng: Mutex<StdRng>,
}

impl SeededSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl UnitSampler for SeededSampler {
    fn sample(&self) -> f64 {
        // A panic while holding the lock cannot leave the generator invalid
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen::<f64>()
    }
}

/// Always returns the same value.
#[derive(Debug, Clone, Copy)]
pub struct FixedSampler(pub f64);

impl UnitSampler for FixedSampler {
    fn sample(&self) -> f64 {
        self.0
    }
}

/// Cycles through a fixed list of values, in order.
#[derive(Debug)]
pub struct SequenceSampler {
    values: Vec<f64>,
    next: AtomicUsize,
}

impl SequenceSampler {
    /// # Panics
    ///
    /// Panics if `values` is empty.
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "SequenceSampler needs at least one value");
        Self {
            values,
            next: AtomicUsize::new(0),
        }
    }
}

impl UnitSampler for SequenceSampler {
    fn sample(&self) -> f64 {
        let i = self.next.fetch_add(1, Ordering::Relaxed);
        self.values[i % self.values.len()]
    }
}

/// Decides whether a request stalls and performs the stall.
///
/// Cheap to clone; the sampler is shared behind an `Arc`.
#[derive(Clone)]
pub struct DelayPolicy {
    probability: f64,
    duration: Duration,
    sampler: Arc<dyn UnitSampler>,
}

impl fmt::Debug for DelayPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelayPolicy")
            .field("probability", &self.probability)
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

impl DelayPolicy {
    pub fn new(probability: f64, duration: Duration, sampler: Arc<dyn UnitSampler>) -> Self {
        Self {
            probability,
            duration,
            sampler,
        }
    }

    /// Build the policy described by the `[fault]` config section.
    ///
    /// A configured seed selects [`SeededSampler`]; otherwise draws come
    /// from [`ThreadRngSampler`].
    pub fn from_config(config: &FaultConfig) -> Self {
        let sampler: Arc<dyn UnitSampler> = match config.seed {
            Some(seed) => Arc::new(SeededSampler::new(seed)),
            None => Arc::new(ThreadRngSampler),
        };
        Self::new(config.probability, config.delay(), sampler)
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Make one draw.
    pub fn decide(&self) -> DelayDecision {
        if self.sampler.sample() < self.probability {
            DelayDecision::Delay
        } else {
            DelayDecision::Proceed
        }
    }

    /// Make one draw and, on the delayed branch, wait out the full duration.
    ///
    /// An async timer, so only the calling request is held; the runtime
    /// keeps serving everything else.
    pub async fn apply(&self) -> DelayDecision {
        let decision = self.decide();
        tracing::debug!(delayed = decision.is_delayed(), "Delay decision");

        if decision.is_delayed() {
            tracing::info!(delay_ms = self.duration.as_millis() as u64, "Stalling request");
            tokio::time::sleep(self.duration).await;
            tracing::debug!("Stall elapsed");
        }

        decision
    }
}
