//! # Per-operation retry state.
//!
//! A [`RetryPolicy`] is created fresh for every top-level store operation and
//! dropped once that operation settles. It tracks:
//! - how many retries were granted (`attempts_made`, starts at 0);
//! - when the operation started (`started_at`, captured at construction);
//! - the delay to sleep before the retry that was just granted.
//!
//! [`RetryPolicy::should_retry`] is the only mutator. It denies once
//! `attempts_made >= max_retry_count` **or** the elapsed time exceeds
//! `max_wait_time`; otherwise it advances the delay and the counter.
//!
//! ## Variants
//! ```text
//! fixed:        500ms, 500ms, 500ms, ...            (RetryPolicy::fixed)
//! exponential:  100ms, 200ms, 400ms, ... ≤ max_wait (RetryPolicy::exponential)
//! ```
//!
//! The delay only changes when a retry is granted, so a spent policy reports the
//! delay of the last retry it actually slept for.

use std::time::Duration;

use tokio::time::Instant;

use crate::policies::{backoff::Backoff, jitter::JitterPolicy};

/// Bounds and base delay for one retry policy variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetrySettings {
    /// Upper bound on retries (not counting the first attempt).
    pub max_retry_count: u32,
    /// Fixed delay, or the first delay of the exponential variant.
    pub delay: Duration,
    /// Upper bound on wall-clock time since the policy was created.
    pub max_wait_time: Duration,
}

impl RetrySettings {
    pub const fn new(max_retry_count: u32, delay: Duration, max_wait_time: Duration) -> Self {
        Self {
            max_retry_count,
            delay,
            max_wait_time,
        }
    }

    /// 9 retries, 500ms apart, 5s budget.
    pub const fn fixed_default() -> Self {
        Self::new(9, Duration::from_millis(500), Duration::from_secs(5))
    }

    /// 10 retries, starting at 100ms, 30s budget.
    pub const fn exponential_default() -> Self {
        Self::new(10, Duration::from_millis(100), Duration::from_secs(30))
    }
}

/// Retry state for a single operation.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    backoff: Backoff,
    max_retry_count: u32,
    max_wait_time: Duration,
    attempts_made: u32,
    retry_delay: Duration,
    started_at: Instant,
}

impl RetryPolicy {
    /// Constant delay between retries.
    pub fn fixed(settings: RetrySettings) -> Self {
        Self::with_backoff(settings, Backoff::fixed(settings.delay))
    }

    /// Delay doubling on every granted retry, capped at `max_wait_time`.
    pub fn exponential(settings: RetrySettings) -> Self {
        Self::with_backoff(
            settings,
            Backoff::doubling(settings.delay, settings.max_wait_time),
        )
    }

    fn with_backoff(settings: RetrySettings, backoff: Backoff) -> Self {
        Self {
            backoff,
            max_retry_count: settings.max_retry_count,
            max_wait_time: settings.max_wait_time,
            attempts_made: 0,
            retry_delay: backoff.base,
            started_at: Instant::now(),
        }
    }

    /// Sets the jitter applied to [`RetryPolicy::sleep_delay`].
    #[must_use]
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.backoff.jitter = jitter;
        self
    }

    /// Decides whether another retry may run and, if so, records it.
    ///
    /// Returns `false` once `attempts_made >= max_retry_count` or once more than
    /// `max_wait_time` elapsed since construction. Otherwise sets the delay for
    /// this retry, increments `attempts_made`, and returns `true`.
    pub fn should_retry(&mut self) -> bool {
        if self.attempts_made >= self.max_retry_count {
            return false;
        }
        if self.elapsed() > self.max_wait_time {
            return false;
        }
        self.retry_delay = self.backoff.delay_for(self.attempts_made);
        self.attempts_made += 1;
        true
    }

    /// Delay of the most recently granted retry (the base delay before any).
    #[inline]
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Delay to actually sleep: [`RetryPolicy::retry_delay`] with jitter applied.
    #[inline]
    pub fn sleep_delay(&self) -> Duration {
        self.backoff.jittered(self.retry_delay)
    }

    #[inline]
    pub fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    #[inline]
    pub fn max_retry_count(&self) -> u32 {
        self.max_retry_count
    }

    #[inline]
    pub fn max_wait_time(&self) -> Duration {
        self.max_wait_time
    }

    /// Time since the policy was created.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for RetryPolicy {
    /// Fixed policy with [`RetrySettings::fixed_default`].
    fn default() -> Self {
        Self::fixed(RetrySettings::fixed_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fixed_grants_exactly_max_retry_count() {
        let mut policy = RetryPolicy::fixed(RetrySettings::new(
            3,
            Duration::from_millis(10),
            Duration::from_secs(60),
        ));
        let granted = (0..10).filter(|_| policy.should_retry()).count();
        assert_eq!(granted, 3);
        assert_eq!(policy.attempts_made(), 3);
        assert_eq!(policy.retry_delay(), Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retry_count_never_retries() {
        let mut policy = RetryPolicy::fixed(RetrySettings::new(
            0,
            Duration::from_millis(10),
            Duration::from_secs(60),
        ));
        assert!(!policy.should_retry());
        assert_eq!(policy.attempts_made(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_budget_denies_regardless_of_attempts() {
        let mut policy = RetryPolicy::fixed(RetrySettings::new(
            100,
            Duration::from_millis(10),
            Duration::from_secs(1),
        ));
        assert!(policy.should_retry());

        tokio::time::advance(Duration::from_secs(1)).await;
        // Exactly at the budget is still allowed; the bound is strict.
        assert!(policy.should_retry());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!policy.should_retry());
        assert!(!policy.should_retry());
        assert_eq!(policy.attempts_made(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exponential_doubles_per_granted_retry() {
        let mut policy = RetryPolicy::exponential(RetrySettings::new(
            6,
            Duration::from_millis(100),
            Duration::from_secs(60),
        ));
        let mut delays = Vec::new();
        while policy.should_retry() {
            delays.push(policy.retry_delay());
        }
        assert_eq!(delays.len(), 6);
        for pair in delays.windows(2) {
            assert_eq!(pair[1], pair[0] * 2);
        }
        assert_eq!(delays[0], Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_retry_keeps_last_delay() {
        let mut policy = RetryPolicy::exponential(RetrySettings::new(
            2,
            Duration::from_millis(100),
            Duration::from_secs(60),
        ));
        assert!(policy.should_retry());
        assert!(policy.should_retry());
        assert_eq!(policy.retry_delay(), Duration::from_millis(200));
        assert!(!policy.should_retry());
        assert_eq!(policy.retry_delay(), Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_budget_before_first_failure() {
        let mut policy = RetryPolicy::default();
        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(!policy.should_retry());
    }
}
