/*!
 * Token bucket shared by every outbound request.
 *
 * The bucket holds at most `capacity` tokens and refills continuously at
 * `refill_per_sec` tokens per second. Each request takes one token. Refill,
 * check and decrement happen under a single `tokio::sync::Mutex`; the mutex
 * queues waiters in arrival order, so a waiting task is admitted as soon as
 * the tasks ahead of it have been served.
 */

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket rate limiter
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Full bucket holding `rate` tokens and refilling `rate` tokens per second
    pub fn new(rate: u32) -> Self {
        Self::with_tokens(rate, rate as f64)
    }

    /// Same limits as [`TokenBucket::new`], but starting with no tokens
    pub fn empty(rate: u32) -> Self {
        Self::with_tokens(rate, 0.0)
    }

    fn with_tokens(rate: u32, tokens: f64) -> Self {
        let rate = rate.max(1) as f64;
        Self {
            capacity: rate,
            refill_per_sec: rate,
            state: Mutex::new(BucketState {
                tokens: tokens.min(rate),
                last_refill: Instant::now(),
            }),
        }
    }

    /// Tokens added per second
    pub fn rate(&self) -> f64 {
        self.refill_per_sec
    }

    /// Wait until a token is available and take it
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;
        loop {
            self.refill(&mut state);
            if state.tokens >= 1.0 {
                state.tokens -= 1.0;
                return;
            }

            let missing = 1.0 - state.tokens;
            tokio::time::sleep(Duration::from_secs_f64(missing / self.refill_per_sec)).await;
        }
    }

    /// Take a token if one is available right now
    pub fn try_acquire(&self) -> bool {
        let Ok(mut state) = self.state.try_lock() else {
            return false;
        };
        self.refill(&mut state);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        state.last_refill = now;
    }
}
