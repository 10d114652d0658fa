use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub time_window: Duration,
    pub burst_allowance: u32,
}

impl RateLimitConfig {
    /// One request per `interval`, no bursting. Matches the courtesy delay
    /// expected by Reddit's unauthenticated JSON endpoints.
    pub fn courtesy(interval: Duration) -> Self {
        Self {
            max_requests: 1,
            time_window: interval,
            burst_allowance: 1,
        }
    }
}

#[derive(Debug)]
pub struct TokenBucket {
    tokens: Arc<Mutex<f64>>,
    capacity: f64,
    refill_rate: f64, // tokens per second
    last_refill: Arc<Mutex<Instant>>,
}

impl TokenBucket {
    pub fn new(config: &RateLimitConfig) -> Self {
        let capacity = config.burst_allowance as f64;
        let window = config.time_window.as_secs_f64();
        // A zero window disables pacing entirely.
        let refill_rate = if window > 0.0 {
            config.max_requests as f64 / window
        } else {
            f64::INFINITY
        };

        Self {
            tokens: Arc::new(Mutex::new(capacity)),
            capacity,
            refill_rate,
            last_refill: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub async fn acquire(&self, tokens_needed: f64) -> Result<(), Duration> {
        let now = Instant::now();
        let mut tokens = self.tokens.lock().await;

        {
            let mut last_refill = self.last_refill.lock().await;
            *tokens = (*tokens + self.tokens_since(*last_refill, now)).min(self.capacity);
            *last_refill = now;
        }

        if *tokens >= tokens_needed {
            *tokens -= tokens_needed;
            Ok(())
        } else {
            let missing = tokens_needed - *tokens;
            Err(Duration::from_secs_f64(missing / self.refill_rate))
        }
    }


    fn tokens_since(&self, last_refill: Instant, now: Instant) -> f64 {
        if self.refill_rate.is_infinite() {
            return self.capacity;
        }
        now.duration_since(last_refill).as_secs_f64() * self.refill_rate
    }
}

/// Paces outbound requests. Every per-post call acquires a permit first, so
/// total runtime grows linearly with the number of posts.
#[derive(Debug)]
pub struct RateLimiter {
    token_bucket: TokenBucket,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let token_bucket = TokenBucket::new(&config);
        Self {
            token_bucket,
            config,
        }
    }

    pub async fn acquire_permit(&self) -> RateLimitPermit {
        let start_time = Instant::now();

        loop {
            match self.token_bucket.acquire(1.0).await {
                Ok(()) => break,
                Err(wait_time) => {
                    tracing::debug!("Rate limit reached, waiting {:?}", wait_time);
                    sleep(wait_time).await;
                }
            }
        }

        RateLimitPermit {
            queue_wait_time: start_time.elapsed(),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}

#[derive(Debug)]
pub struct RateLimitPermit {
    pub queue_wait_time: Duration,
}
