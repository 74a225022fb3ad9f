//! Client-side rate limiting, one limiter per distinct credential.

use std::num::NonZeroU32;

use embedgate_core::{EmbeddingError, EmbeddingResult};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

pub const RATE_LIMIT_EXCEEDED: &str = "Client side rate limit exceeded, retry it later";

/// Non-blocking token bucket for one credential.
pub struct ClientRateLimiter {
    limiter: DefaultDirectRateLimiter,
    requests_per_second: u32,
}

impl ClientRateLimiter {
    /// A limiter allowing `requests_per_second`, with a burst of the same size.
    /// Zero is treated as one.
    pub fn per_second(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::direct(Quota::per_second(rps)),
            requests_per_second: rps.get(),
        }
    }

    /// Take a permit if one is free. Never waits.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    /// Like `try_acquire`, failing with a transient error when exhausted.
    pub fn acquire_or_reject(&self) -> EmbeddingResult<()> {
        if self.try_acquire() {
            Ok(())
        } else {
            Err(EmbeddingError::transient(RATE_LIMIT_EXCEEDED))
        }
    }

    pub fn requests_per_second(&self) -> u32 {
        self.requests_per_second
    }
}

impl std::fmt::Debug for ClientRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRateLimiter")
            .field("requests_per_second", &self.requests_per_second)
            .finish()
    }
}
