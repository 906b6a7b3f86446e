/*!
 * Tests for the token bucket rate limiter
 */

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use subvtt::rate_limiter::TokenBucket;

fn assert_close(actual: Duration, expected: Duration) {
    let tolerance = Duration::from_millis(10);
    assert!(
        actual >= expected && actual < expected + tolerance,
        "expected about {:?}, got {:?}",
        expected,
        actual
    );
}

/// Test that after one refill interval exactly one token is available, for several rates
#[tokio::test(start_paused = true)]
async fn test_emptyBucket_afterOneInterval_shouldAdmitExactlyOne() {
    for rate in [1u32, 4] {
        let bucket = TokenBucket::empty(rate);
        assert!(!bucket.try_acquire(), "rate {}: empty bucket admitted a request", rate);

        tokio::time::advance(Duration::from_secs_f64(1.0 / rate as f64)).await;

        assert!(bucket.try_acquire(), "rate {}: no token after one interval", rate);
        assert!(!bucket.try_acquire(), "rate {}: more than one token after one interval", rate);
    }
}

/// Test that a full bucket admits its capacity at once, then paces at the refill rate
#[tokio::test(start_paused = true)]
async fn test_fullBucket_shouldBurstThenPace() {
    let bucket = TokenBucket::new(4);
    let start = Instant::now();

    for _ in 0..4 {
        bucket.acquire().await;
    }
    assert_eq!(start.elapsed(), Duration::ZERO);

    for _ in 0..4 {
        bucket.acquire().await;
    }
    assert_close(start.elapsed(), Duration::from_secs(1));
}

/// Test that many concurrent callers are all admitted and never faster than the rate allows
#[tokio::test(start_paused = true)]
async fn test_concurrentCallers_shouldAllBeAdmittedAtBoundedRate() {
    let bucket = Arc::new(TokenBucket::empty(5));
    let start = Instant::now();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let bucket = Arc::clone(&bucket);
        handles.push(tokio::spawn(async move {
            bucket.acquire().await;
            start.elapsed()
        }));
    }

    let mut admitted_at = Vec::new();
    for handle in handles {
        admitted_at.push(handle.await.unwrap());
    }
    admitted_at.sort();

    assert_eq!(admitted_at.len(), 20);
    // The n-th admission (1-based) cannot happen before n / rate seconds
    for (i, at) in admitted_at.iter().enumerate() {
        let earliest = Duration::from_secs_f64((i + 1) as f64 / 5.0);
        assert!(*at + Duration::from_millis(1) >= earliest, "admission {} at {:?}", i + 1, at);
    }
    assert_close(admitted_at[19], Duration::from_secs(4));
}

/// Test that an idle bucket never accumulates more than its capacity
#[tokio::test(start_paused = true)]
async fn test_idleBucket_shouldCapAtCapacity() {
    let bucket = TokenBucket::empty(2);
    tokio::time::advance(Duration::from_secs(30)).await;

    assert!(bucket.try_acquire());
    assert!(bucket.try_acquire());
    assert!(!bucket.try_acquire());
}
