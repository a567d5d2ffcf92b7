//! # Data access for sessions and questions.
//!
//! [`SessionData`] and [`QuestionData`] are the only callers of the
//! [`QnaStore`](crate::store::QnaStore). Every store call goes through a fresh
//! retry policy:
//!
//! | call shape                 | policy       | retried on            |
//! |----------------------------|--------------|-----------------------|
//! | insert / find / delete     | fixed        | throttle              |
//! | read-modify-replace        | exponential  | throttle, conflict    |
//!
//! A read-modify-replace reloads the document on **every** attempt, so a writer
//! that lost the version race re-applies its change on top of the winner's.
//!
//! ## Checked vs. restoring operations
//! User-facing mutations (`end`, `upvote`, `mark_answered`, ...) require the
//! session to be active and fail with
//! [`ActionError::SessionInactive`](crate::ActionError::SessionInactive) otherwise.
//! The `restore_*` / `reactivate` / `delete` operations used for compensation
//! skip that check: undoing a change must not depend on the session state.

mod question;
mod session;

use std::sync::Arc;

use crate::config::Config;
use crate::events::Bus;
use crate::policies::RetryOn;
use crate::retry::Retry;
use crate::store::StoreRef;

pub use question::QuestionData;
pub use session::SessionData;

/// Result of a mutation that flips a boolean fact, with the fact's prior value.
///
/// Compensation restores `before` instead of blindly inverting, so an upvote by
/// someone who had already voted is undone as a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change<T> {
    /// Document as stored after the mutation.
    pub doc: T,
    /// Value of the flipped fact before the mutation.
    pub before: bool,
}

/// Store handle plus the retry settings shared by the data-access services.
#[derive(Clone)]
pub(crate) struct Access {
    pub(crate) store: StoreRef,
    config: Arc<Config>,
    bus: Bus,
}

impl Access {
    pub(crate) fn new(store: StoreRef, config: Arc<Config>, bus: Bus) -> Self {
        Self { store, config, bus }
    }

    /// Fixed policy, throttle only.
    pub(crate) fn fixed(&self, label: &'static str) -> Retry<'_> {
        Retry::new(self.config.fixed_policy(), RetryOn::Throttle)
            .labeled(label)
            .observed(&self.bus)
    }

    /// Exponential policy, throttle and version conflicts.
    pub(crate) fn versioned(&self, label: &'static str) -> Retry<'_> {
        Retry::new(self.config.exponential_policy(), RetryOn::ThrottleOrConflict)
            .labeled(label)
            .observed(&self.bus)
    }
}
