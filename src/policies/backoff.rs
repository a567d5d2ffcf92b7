//! # Delay progression for retries.
//!
//! [`Backoff`] computes the delay for the n-th granted retry:
//! - [`Backoff::base`] the delay of the first retry;
//! - [`Backoff::factor`] the multiplicative growth factor (`1.0` = fixed delay);
//! - [`Backoff::cap`] the maximum delay.
//!
//! The delay for step `n` (0-indexed) is `base × factor^n`, clamped to `cap`.
//! Jitter is applied by the caller on the sleep only, so it never feeds back
//! into later steps.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use qnasaga::{Backoff, JitterPolicy};
//!
//! let backoff = Backoff {
//!     base: Duration::from_millis(100),
//!     cap: Duration::from_secs(1),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.delay_for(0), Duration::from_millis(100));
//! assert_eq!(backoff.delay_for(1), Duration::from_millis(200));
//! // 100ms × 2^5 = 3.2s → capped
//! assert_eq!(backoff.delay_for(5), Duration::from_secs(1));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Retry delay progression.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Backoff {
    /// Delay before the first retry.
    pub base: Duration,
    /// Maximum delay.
    pub cap: Duration,
    /// Multiplicative growth factor (`>= 1.0`).
    pub factor: f64,
    /// Randomization applied to the sleep.
    pub jitter: JitterPolicy,
}

impl Backoff {
    /// Constant delay.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            base: delay,
            cap: delay,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Delay doubling on every step, capped at `cap`.
    pub fn doubling(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap,
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Computes the delay for the given step (0-indexed), without jitter.
    ///
    /// # Notes
    /// - Non-finite or overflowing results clamp to [`Backoff::cap`].
    /// - A `base` above `cap` is clamped as well.
    pub fn delay_for(&self, step: u32) -> Duration {
        let cap_secs = self.cap.as_secs_f64();
        let exp = step.min(i32::MAX as u32) as i32;
        let raw = self.base.as_secs_f64() * self.factor.powi(exp);

        if !raw.is_finite() || raw < 0.0 || raw > cap_secs {
            self.cap
        } else {
            Duration::from_secs_f64(raw)
        }
    }

    /// Applies the configured jitter to a computed delay.
    #[inline]
    pub fn jittered(&self, delay: Duration) -> Duration {
        self.jitter.apply(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_is_constant() {
        let backoff = Backoff::fixed(Duration::from_millis(500));
        for step in 0..10 {
            assert_eq!(
                backoff.delay_for(step),
                Duration::from_millis(500),
                "step {} should be constant at 500ms",
                step
            );
        }
    }

    #[test]
    fn test_doubling_growth() {
        let backoff = Backoff::doubling(Duration::from_millis(100), Duration::from_secs(30));
        assert_eq!(backoff.delay_for(0), Duration::from_millis(100));
        assert_eq!(backoff.delay_for(1), Duration::from_millis(200));
        assert_eq!(backoff.delay_for(2), Duration::from_millis(400));
        assert_eq!(backoff.delay_for(3), Duration::from_millis(800));
        assert_eq!(backoff.delay_for(4), Duration::from_millis(1600));
    }

    #[test]
    fn test_base_above_cap_clamps() {
        let backoff = Backoff::doubling(Duration::from_secs(10), Duration::from_secs(5));
        assert_eq!(backoff.delay_for(0), Duration::from_secs(5));
    }

    #[test]
    fn test_overflow_clamps_to_cap() {
        let backoff = Backoff::doubling(Duration::from_millis(100), Duration::from_secs(10));
        assert_eq!(backoff.delay_for(100), Duration::from_secs(10));
        assert_eq!(backoff.delay_for(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_jitter_bounds_the_sleep() {
        let backoff = Backoff {
            jitter: JitterPolicy::Equal,
            ..Backoff::fixed(Duration::from_millis(1000))
        };
        for step in 0..50 {
            let d = backoff.jittered(backoff.delay_for(step));
            assert!(d >= Duration::from_millis(500));
            assert!(d <= Duration::from_millis(1000));
        }
    }
}
