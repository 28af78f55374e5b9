use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// Returned when the next free slot is further away than the caller will wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rate limiter slot is {wait:?} away")]
pub struct RateLimitTimeout {
    pub wait: Duration,
}

/// Single-slot limiter: at most one acquisition per `interval`, across every
/// clone of the `Arc` it is shared through.
///
/// Each caller reserves the next free slot and sleeps until it. Reservations
/// are handed out in call order, so waiting callers are served FIFO. A caller
/// whose slot would be more than `max_wait` away fails immediately and does
/// not consume a slot.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_free: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_free: Mutex::new(Instant::now()),
        }
    }

    pub async fn acquire(&self, max_wait: Duration) -> Result<(), RateLimitTimeout> {
        let slot = self.reserve(max_wait)?;
        tokio::time::sleep_until(slot).await;
        Ok(())
    }

    fn reserve(&self, max_wait: Duration) -> Result<Instant, RateLimitTimeout> {
        // The critical section cannot panic, so a poisoned lock still holds a
        // consistent instant.
        let mut next_free = self
            .next_free
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();
        let slot = (*next_free).max(now);
        let wait = slot - now;
        if wait > max_wait {
            return Err(RateLimitTimeout { wait });
        }
        *next_free = slot + self.interval;
        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const SECOND: Duration = Duration::from_secs(1);
    const FOREVER: Duration = Duration::from_secs(3600);

    #[tokio::test(start_paused = true)]
    async fn first_acquire_is_immediate() {
        let limiter = RateLimiter::new(SECOND);
        let start = Instant::now();
        limiter.acquire(FOREVER).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_acquires_are_spaced_by_interval() {
        let limiter = RateLimiter::new(SECOND);
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire(FOREVER).await.unwrap();
        }
        assert_eq!(start.elapsed(), 2 * SECOND);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_time_does_not_bank_tokens() {
        let limiter = RateLimiter::new(SECOND);
        limiter.acquire(FOREVER).await.unwrap();
        tokio::time::sleep(10 * SECOND).await;

        let start = Instant::now();
        limiter.acquire(FOREVER).await.unwrap();
        limiter.acquire(FOREVER).await.unwrap();
        assert_eq!(start.elapsed(), SECOND);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_rate() {
        let limiter = Arc::new(RateLimiter::new(SECOND));
        let start = Instant::now();

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter.acquire(FOREVER).await.unwrap();
                    Instant::now()
                })
            })
            .collect();

        let mut times = Vec::new();
        for h in handles {
            times.push(h.await.unwrap());
        }
        times.sort();

        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= SECOND, "acquisitions closer than interval: {pair:?}");
        }
        assert_eq!(*times.last().unwrap() - start, 4 * SECOND);
    }

    #[tokio::test(start_paused = true)]
    async fn slot_beyond_max_wait_fails_without_consuming() {
        let limiter = RateLimiter::new(SECOND);
        let max_wait = Duration::from_millis(1500);

        let (a, b, c) = tokio::join!(
            limiter.acquire(max_wait),
            limiter.acquire(max_wait),
            limiter.acquire(max_wait),
        );
        assert!(a.is_ok());
        assert!(b.is_ok());
        let err = c.unwrap_err();
        assert_eq!(err.wait, 2 * SECOND);

        // The failed caller left slot t=2s free; we are at t=1s now.
        let start = Instant::now();
        limiter.acquire(max_wait).await.unwrap();
        assert_eq!(start.elapsed(), SECOND);
    }
}
