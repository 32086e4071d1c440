use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::sleep;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub time_window: Duration,
    pub burst_allowance: u32,
}

impl RateLimitConfig {
    pub fn reddit_oauth() -> Self {
        Self {
            max_requests: 100, // Reddit allows 100 requests per minute for OAuth2
            time_window: Duration::from_secs(60),
            burst_allowance: 10,
        }
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket limiter gating outbound Reddit API calls.
///
/// A semaphore bounds in-flight requests to the burst allowance; the bucket
/// refills at the configured request rate.
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<BucketState>,
    semaphore: Arc<Semaphore>,
    capacity: f64,
    refill_rate: f64, // tokens per second
}

pub struct RateLimitPermit {
    _permit: OwnedSemaphorePermit,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let capacity = f64::from(config.burst_allowance);
        let refill_rate = f64::from(config.max_requests) / config.time_window.as_secs_f64();

        Self {
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            semaphore: Arc::new(Semaphore::new(config.burst_allowance as usize)),
            capacity,
            refill_rate,
        }
    }

    /// Wait until a request may be sent.
    pub async fn acquire_permit(&self) -> RateLimitPermit {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("Semaphore should not be closed");

        loop {
            match self.try_take_token().await {
                Ok(()) => break,
                Err(wait) => sleep(wait).await,
            }
        }

        RateLimitPermit { _permit: permit }
    }

    async fn try_take_token(&self) -> Result<(), Duration> {
        let mut state = self.state.lock().await;

        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill);
        state.tokens = (state.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        state.last_refill = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            Ok(())
        } else {
            let wait = Duration::from_secs_f64((1.0 - state.tokens) / self.refill_rate);
            Err(wait)
        }
    }

    pub async fn available_tokens(&self) -> f64 {
        let mut state = self.state.lock().await;

        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill);
        state.tokens = (state.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        state.last_refill = now;

        state.tokens
    }
}
