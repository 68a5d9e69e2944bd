//! Token bucket rate limiter, one per destination
//!
//! Tokens refill continuously at `rate` per second up to `burst`. Acquiring
//! reserves a token immediately and lets the balance go negative; the caller
//! then sleeps until its reservation is covered. Waiters never spin and are
//! served in reservation order.
//!
//! Uses `tokio::time::Instant` so tests can run on a paused clock.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::{sleep, Instant};

/// Async token bucket
#[derive(Debug)]
pub struct RateLimiter {
    rate: f64,
    burst: f64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl BucketState {
    fn refill(&mut self, now: Instant, rate: f64, burst: f64) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(burst);
        self.last_refill = now;
    }
}

impl RateLimiter {
    /// Limiter allowing `rate_per_sec` acquisitions per second with no burst.
    pub fn new(rate_per_sec: u32) -> Self {
        Self::with_burst(rate_per_sec, 1)
    }

    /// Limiter holding up to `burst` tokens. Zero values are raised to 1.
    pub fn with_burst(rate_per_sec: u32, burst: u32) -> Self {
        let burst = f64::from(burst.max(1));
        Self {
            rate: f64::from(rate_per_sec.max(1)),
            burst,
            state: Mutex::new(BucketState {
                tokens: burst,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Configured rate (tokens per second)
    pub fn rate(&self) -> u32 {
        self.rate as u32
    }

    pub fn burst(&self) -> u32 {
        self.burst as u32
    }

    /// Wait until a token is available and consume it.
    ///
    /// The reservation is taken before sleeping, so a cancelled `acquire`
    /// still counts against the rate.
    pub async fn acquire(&self) {
        let wait = self.reserve();
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }

    /// Consume a token only if one is available right now.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.lock();
        state.refill(Instant::now(), self.rate, self.burst);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn reserve(&self) -> Duration {
        let mut state = self.lock();
        state.refill(Instant::now(), self.rate, self.burst);
        state.tokens -= 1.0;
        if state.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-state.tokens / self.rate)
        }
    }

    fn lock(&self) -> MutexGuard<'_, BucketState> {
        // The state is two plain numbers; a panic elsewhere cannot corrupt it
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
