//! Request pacing and retry logic.
//!
//! The fetcher is strictly sequential: one request is issued, completes (or
//! fails for good), the politeness delay elapses, and only then does control
//! return to the caller. Transient failures are retried with exponential
//! backoff up to a fixed number of attempts.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use crate::errors::FetchError;

/// Inter-request politeness delay, optionally with random jitter on top.
#[derive(Debug, Clone)]
pub struct Pacer {
    delay: Duration,
    jitter: Duration,
}

impl Pacer {
    pub fn new(delay: Duration, jitter: Duration) -> Self {
        Self { delay, jitter }
    }

    /// Sleeps for the configured delay plus up to `jitter` extra.
    pub async fn pause(&self, tracker: &RequestTracker) {
        let extra = if self.jitter.is_zero() {
            Duration::ZERO
        } else {
            let max = self.jitter.as_millis() as u64;
            Duration::from_millis(rand::thread_rng().gen_range(0..=max))
        };
        let total = self.delay + extra;
        if total.is_zero() {
            return;
        }
        tracker.record_pause(total);
        sleep(total).await;
    }
}

/// How many times to try a request and how long to back off in between.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff,
        }
    }

    /// Backoff before retry number `attempt` (1-based): base * 2^(attempt-1),
    /// scaled by a 0.8-1.2 jitter factor.
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let base = self.base_backoff.saturating_mul(1u32 << shift);
        if base.is_zero() {
            return base;
        }
        let jitter = rand::thread_rng().gen_range(0.8..1.2);
        base.mul_f64(jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

/// Atomic counters tracking request outcomes across a run.
#[derive(Debug, Default)]
pub struct RequestTracker {
    requests_made: AtomicU64,
    requests_succeeded: AtomicU64,
    requests_retried: AtomicU64,
    requests_failed: AtomicU64,
    total_backoff_ms: AtomicU64,
    total_pause_ms: AtomicU64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.requests_made.fetch_add(1, Ordering::Relaxed);
        self.requests_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self, backoff: Duration) {
        self.requests_made.fetch_add(1, Ordering::Relaxed);
        self.requests_retried.fetch_add(1, Ordering::Relaxed);
        self.total_backoff_ms
            .fetch_add(backoff.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.requests_made.fetch_add(1, Ordering::Relaxed);
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pause(&self, pause: Duration) {
        self.total_pause_ms
            .fetch_add(pause.as_millis() as u64, Ordering::Relaxed);
    }

    /// Snapshot the current counters.
    pub fn summary(&self) -> TrackerSummary {
        TrackerSummary {
            requests_made: self.requests_made.load(Ordering::Relaxed),
            requests_succeeded: self.requests_succeeded.load(Ordering::Relaxed),
            requests_retried: self.requests_retried.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            total_backoff_secs: self.total_backoff_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            total_pause_secs: self.total_pause_ms.load(Ordering::Relaxed) as f64 / 1000.0,
        }
    }
}

/// Immutable snapshot of tracker counters for display.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerSummary {
    pub requests_made: u64,
    pub requests_succeeded: u64,
    pub requests_retried: u64,
    pub requests_failed: u64,
    pub total_backoff_secs: f64,
    pub total_pause_secs: f64,
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's attempt budget is spent.
///
/// A non-retryable error is returned as-is. A retryable error that survives
/// every attempt is wrapped in [`FetchError::Exhausted`] carrying the last
/// failure.
pub async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    tracker: &RequestTracker,
    url: &str,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => {
                tracker.record_success();
                return Ok(value);
            }
            Err(err) if !err.is_retryable() => {
                tracker.record_failure();
                return Err(err);
            }
            Err(err) if attempt >= policy.max_attempts => {
                tracker.record_failure();
                tracing::warn!("{} failed after {} attempts: {}", url, attempt, err);
                return Err(FetchError::Exhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    last: Box::new(err),
                });
            }
            Err(err) => {
                let backoff = policy.delay_for_attempt(attempt);
                tracker.record_retry(backoff);
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {:.1}s",
                    url,
                    attempt,
                    policy.max_attempts,
                    err,
                    backoff.as_secs_f64()
                );
                sleep(backoff).await;
            }
        }
    }
}
