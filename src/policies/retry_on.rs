//! # Which errors qualify for a retry.
//!
//! - [`RetryOn::Throttle`] only rate-limit rejections (inserts, reads, deletes).
//! - [`RetryOn::ThrottleOrConflict`] rate limits and optimistic-concurrency
//!   conflicts (read-modify-replace of a versioned document).
//!
//! Everything else (not found, backend failures, precondition violations)
//! propagates on the first failure.

use crate::error::{Transient, TransientKind};

/// Policy selecting the retryable transient error kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RetryOn {
    /// Retry rate-limit rejections only (default).
    #[default]
    Throttle,
    /// Retry rate-limit rejections and version conflicts.
    ThrottleOrConflict,
}

impl RetryOn {
    /// Returns `true` when `err` is a transient kind this policy retries.
    pub fn admits<E: Transient + ?Sized>(&self, err: &E) -> bool {
        match (self, err.transient_kind()) {
            (_, None) => false,
            (_, Some(TransientKind::Throttle)) => true,
            (RetryOn::ThrottleOrConflict, Some(TransientKind::VersionConflict)) => true,
            (RetryOn::Throttle, Some(TransientKind::VersionConflict)) => false,
        }
    }
}
