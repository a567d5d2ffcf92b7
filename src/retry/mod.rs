//! # Retry runner for store operations.
//!
//! Runs one asynchronous operation, retrying it while it fails with a transient
//! error admitted by [`RetryOn`](crate::RetryOn) and while its
//! [`RetryPolicy`](crate::RetryPolicy) allows.
//!
//! ## Entry points
//! - [`run_with_retry`]: throttle-only, default fixed policy.
//! - [`run_with_conflict_retry`]: throttle or version conflict, default exponential policy.
//! - [`Retry`]: the configurable runner both are built on (labels, event publishing,
//!   policy inspection after the run).
//!
//! ## Flow
//! ```text
//! loop {
//!   ├─► op().await
//!   │     ├─ Ok(v)  ──► return Ok(v)                      (no sleep, counter untouched)
//!   │     └─ Err(e) ──► on.admits(e)?
//!   │                    ├─ no  ──► return Err(e)          (first failure propagates)
//!   │                    └─ yes ──► policy.should_retry()?
//!   │                                ├─ no  ──► publish RetriesExhausted, return Err(e)
//!   │                                └─ yes ──► publish RetryScheduled
//!   │                                           sleep(policy.sleep_delay())
//!   └─► continue
//! }
//! ```

mod runner;

pub use runner::{Retry, run_with_conflict_retry, run_with_retry};
