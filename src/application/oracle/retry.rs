//! Exponential backoff between oracle retries.

use std::time::Duration;

use rand::Rng;

use crate::application::config::AnalysisConfig;

/// Backoff state for one batch.
///
/// Each batch owns its own instance; nothing is shared across batches.
#[derive(Debug, Clone)]
pub struct Backoff {
    current_delay_ms: u64,
    multiplier: f64,
    max_delay_ms: u64,
}

impl Backoff {
    /// Create backoff state starting at `initial_delay_ms`.
    #[must_use]
    pub fn new(initial_delay_ms: u64, multiplier: f64, max_delay_ms: u64) -> Self {
        Self {
            current_delay_ms: initial_delay_ms.min(max_delay_ms),
            multiplier,
            max_delay_ms,
        }
    }

    /// Backoff state from the retry settings of an analysis config.
    #[must_use]
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.retry_initial_delay_ms,
            config.retry_backoff_multiplier,
            config.retry_max_delay_ms,
        )
    }

    /// Return the next delay and advance the state.
    ///
    /// Adds up to 20% random jitter on top of the base delay.
    pub fn next_delay(&mut self) -> Duration {
        let base_ms = self.current_delay_ms;
        let delay = Duration::from_millis(base_ms + jitter_ms(base_ms));

        let next = (base_ms as f64 * self.multiplier) as u64;
        self.current_delay_ms = next.min(self.max_delay_ms);

        delay
    }

    /// Base delay (without jitter) the next call will use.
    #[must_use]
    pub const fn current_delay_ms(&self) -> u64 {
        self.current_delay_ms
    }
}

fn jitter_ms(base_ms: u64) -> u64 {
    let range = base_ms / 5;
    if range == 0 {
        return 0;
    }
    rand::thread_rng().gen_range(0..=range)
}
