// transport/src/bucket.rs

//! A process-local token bucket rate limiter.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Refills continuously at `rps` tokens/second up to `capacity`, blocking the
/// caller (via `tokio::time::sleep`) until a token is available.
///
/// `capacity = ceil(rps * burst_multiplier)` with `burst_multiplier = 2`, so a
/// caller that has been idle can burst up to twice its steady-state rate
/// before being throttled back down to `rps`.
pub struct TokenBucket {
    capacity: f64,
    rps: f64,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(rps: f64) -> Self {
        const BURST_MULTIPLIER: f64 = 2.0;
        let capacity = (rps * BURST_MULTIPLIER).ceil();
        Self {
            capacity,
            rps,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Consume one token, sleeping first if the bucket is currently empty.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().expect("token bucket mutex poisoned");
                self.refill(&mut state);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    None
                } else {
                    let deficit = 1.0 - state.tokens;
                    Some(Duration::from_secs_f64(deficit / self.rps))
                }
            };
            match wait {
                None => return,
                Some(d) => tokio::time::sleep(d).await,
            }
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rps).min(self.capacity);
        state.last_refill = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_double_rps_rounded_up() {
        let bucket = TokenBucket::new(150.0);
        assert_eq!(bucket.capacity, 300.0);
    }

    #[tokio::test(start_paused = true)]
    async fn burst_up_to_capacity_without_waiting() {
        let bucket = TokenBucket::new(10.0);
        let start = Instant::now();
        for _ in 0..20 {
            bucket.acquire().await;
        }
        // 20 == capacity (ceil(10*2)), so no sleep should have been needed.
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn blocks_once_capacity_is_exhausted() {
        let bucket = TokenBucket::new(10.0);
        for _ in 0..20 {
            bucket.acquire().await;
        }
        let start = Instant::now();
        bucket.acquire().await;
        assert!(Instant::now() > start);
    }
}
