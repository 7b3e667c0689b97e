//! Per-source admission control.
//!
//! Each source owns one [`Admission`] context: a semaphore bounding
//! in-flight page requests plus a token bucket bounding request starts per
//! interval. Contexts are constructed once at startup and injected into the
//! fetch scheduler; state is private per source, so a saturated source
//! never blocks another.

use std::time::Duration;

use tokio::sync::{Mutex, Semaphore, SemaphorePermit};
use tokio::time::{sleep, Instant};

use crate::source::SourceMeta;

/// Token bucket refilled continuously at `requests_per_interval / interval`.
///
/// The bucket starts full, allowing an immediate burst up to the interval
/// budget.
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    /// Tokens added per second.
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(requests_per_interval: u32, interval: Duration) -> Self {
        let capacity = f64::from(requests_per_interval.max(1));
        let interval_secs = interval.as_secs_f64().max(f64::MIN_POSITIVE);
        Self {
            capacity,
            tokens: capacity,
            refill_rate: capacity / interval_secs,
            last_refill: Instant::now(),
        }
    }

    /// Try to take one token.
    ///
    /// Returns `Err(wait)` with the duration until a token becomes
    /// available when the bucket is empty.
    pub fn try_acquire(&mut self) -> Result<(), Duration> {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let needed = 1.0 - self.tokens;
            Err(Duration::from_secs_f64(needed / self.refill_rate))
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }
}

/// Combined concurrency + rate gate for one source.
pub struct Admission {
    concurrency: Semaphore,
    bucket: Mutex<TokenBucket>,
}

impl Admission {
    pub fn new(meta: &SourceMeta) -> Self {
        Self {
            concurrency: Semaphore::new(meta.max_concurrency.max(1)),
            bucket: Mutex::new(TokenBucket::new(meta.requests_per_interval, meta.interval)),
        }
    }

    /// Wait until this source may start another request.
    ///
    /// The returned permit holds a concurrency slot for the lifetime of the
    /// request; the rate token is consumed at admission and never returned.
    pub async fn admit(&self) -> SemaphorePermit<'_> {
        let permit = self
            .concurrency
            .acquire()
            .await
            .expect("admission semaphore never closed");

        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                match bucket.try_acquire() {
                    Ok(()) => None,
                    Err(wait) => Some(wait),
                }
            };
            match wait {
                None => break,
                Some(wait) => sleep(wait).await,
            }
        }

        permit
    }
}
