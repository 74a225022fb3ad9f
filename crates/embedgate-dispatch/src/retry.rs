//! Exponential-backoff retry of transient failures.

use std::future::Future;
use std::time::Duration;

use embedgate_core::config::{defaults, ErrorHandlingConfig};
use embedgate_core::{EmbeddingError, EmbeddingResult};
use rand::Rng;

/// Backoff schedule built from a tier's `ErrorHandlingConfig`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Fraction of each delay applied as uniform random jitter, in `[0, 1]`.
    pub jitter: f64,
}

/// Outcome of a retried operation plus how many attempts it took.
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub result: EmbeddingResult<T>,
    pub attempts: u32,
}

impl RetryPolicy {
    pub fn from_config(config: &ErrorHandlingConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_retry_wait_ms),
            max_delay: Duration::from_millis(config.max_retry_wait_ms),
            jitter: config.jitter.clamp(0.0, 1.0),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Un-jittered delay before retry number `retry` (1-based):
    /// `min(initial * 2^(retry-1), max)`.
    pub fn base_delay(&self, retry: u32) -> Duration {
        let factor = u64::from(defaults::DEFAULT_BACKOFF_FACTOR)
            .checked_pow(retry.saturating_sub(1))
            .unwrap_or(u64::MAX);
        let millis = (self.initial_delay.as_millis() as u64).saturating_mul(factor);
        Duration::from_millis(millis).min(self.max_delay)
    }

    /// Delay before retry number `retry` with jitter applied.
    pub fn delay<R: Rng + ?Sized>(&self, retry: u32, rng: &mut R) -> Duration {
        let base = self.base_delay(retry);
        if self.jitter <= 0.0 {
            return base;
        }
        let factor = rng.gen_range((1.0 - self.jitter)..=(1.0 + self.jitter));
        base.mul_f64(factor)
    }

    /// Run `op` until it succeeds, fails with a non-transient error, or the
    /// retry budget is spent. `on_retry` is called with the number of the
    /// attempt that just failed and its error, before sleeping.
    pub async fn run<T, F, Fut, R>(&self, mut op: F, mut on_retry: R) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = EmbeddingResult<T>>,
        R: FnMut(u32, &EmbeddingError),
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match op().await {
                Ok(value) => {
                    return RetryOutcome {
                        result: Ok(value),
                        attempts,
                    }
                }
                Err(e) if e.is_transient() && attempts < self.max_attempts() => {
                    on_retry(attempts, &e);
                    let delay = self.delay(attempts, &mut rand::thread_rng());
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return RetryOutcome {
                        result: Err(e),
                        attempts,
                    }
                }
            }
        }
    }
}
