//! Retry policies.
//!
//! This module groups the knobs that control **whether** a failed store operation
//! is retried and **how long** to wait between attempts.
//!
//! ## Contents
//! - [`RetryPolicy`] per-operation retry state (attempt counter, wait budget, current delay)
//! - [`Backoff`]     how retry delays evolve (base / factor / cap + jitter)
//! - [`JitterPolicy`] randomization of the sleep to avoid synchronized retries
//! - [`RetryOn`]     which transient error kinds qualify for a retry
//!
//! ## Quick wiring
//! ```text
//! Retry { policy: RetryPolicy, on: RetryOn }
//!      └─► retry::Retry::run uses:
//!           - on.admits(err) to decide whether the error is retryable at all
//!           - policy.should_retry() to decide whether the budget allows another attempt
//!           - policy.sleep_delay() to wait before the next attempt
//! ```
//!
//! ## Defaults
//! - Fixed: 9 retries, 500ms apart, 5s budget, `RetryOn::Throttle`.
//! - Exponential: 10 retries, 100ms doubling, 30s budget, `RetryOn::ThrottleOrConflict`.
//! - `JitterPolicy::None`.

mod backoff;
mod jitter;
mod retry;
mod retry_on;

pub use backoff::Backoff;
pub use jitter::JitterPolicy;
pub use retry::{RetryPolicy, RetrySettings};
pub use retry_on::RetryOn;
