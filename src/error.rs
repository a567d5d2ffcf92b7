//! Error types used by the store, the retry runner and the action protocol.
//!
//! This module defines the error enums of the crate:
//!
//! - [`StoreError`]  failures reported by a [`QnaStore`](crate::store::QnaStore).
//! - [`ActionError`] failures surfaced to callers of the controller.
//! - [`NotifyError`] failures raised by a [`Notifier`](crate::notify::Notifier).
//! - [`ConfigError`] malformed configuration values.
//!
//! All of them provide helper methods (`as_label`, `as_message`) for logging/metrics.
//! Transient classification is exposed through the [`Transient`] trait, which is
//! the only thing the retry runner looks at.

use thiserror::Error;

use crate::model::{Entity, SessionId};
use crate::saga::ActionKind;

/// Numeric code the document store uses for "request rate is large".
pub const THROTTLE_CODE: i32 = 16500;

/// Transient failure classes understood by the retry runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientKind {
    /// The store rejected the operation because of rate limiting.
    Throttle,
    /// Another writer changed the versioned document first.
    VersionConflict,
}

/// Classifies an error as transient (and which kind) or permanent.
///
/// `None` means the error must never be retried.
pub trait Transient {
    fn transient_kind(&self) -> Option<TransientKind>;
}

/// # Errors produced by the document store.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Rate limit exceeded; the operation may succeed later.
    #[error("request rate is large (code {code})")]
    Throttled {
        /// Store error code (always [`THROTTLE_CODE`] when built via [`StoreError::from_code`]).
        code: i32,
    },

    /// Optimistic concurrency check failed.
    #[error("version conflict on {entity}: expected v{expected}, found v{found}")]
    VersionConflict {
        entity: Entity,
        /// Version the writer read.
        expected: u64,
        /// Version currently stored.
        found: u64,
    },

    /// Document does not exist.
    #[error("{entity} not found")]
    NotFound { entity: Entity },

    /// Any other backend failure (never retried).
    #[error("store backend failure: {message}")]
    Backend {
        code: Option<i32>,
        message: String,
    },
}

impl StoreError {
    /// Builds an error from a raw backend code, recognizing the throttle code.
    ///
    /// # Example
    /// ```
    /// use qnasaga::{StoreError, THROTTLE_CODE};
    ///
    /// let err = StoreError::from_code(THROTTLE_CODE, "too many requests");
    /// assert_eq!(err.as_label(), "store_throttled");
    ///
    /// let err = StoreError::from_code(11000, "duplicate key");
    /// assert_eq!(err.as_label(), "store_backend");
    /// ```
    pub fn from_code(code: i32, message: impl Into<String>) -> Self {
        if code == THROTTLE_CODE {
            StoreError::Throttled { code }
        } else {
            StoreError::Backend {
                code: Some(code),
                message: message.into(),
            }
        }
    }

    /// Shorthand for a throttle error with the standard code.
    pub fn throttled() -> Self {
        StoreError::Throttled {
            code: THROTTLE_CODE,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StoreError::Throttled { .. } => "store_throttled",
            StoreError::VersionConflict { .. } => "store_version_conflict",
            StoreError::NotFound { .. } => "store_not_found",
            StoreError::Backend { .. } => "store_backend",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            StoreError::Throttled { code } => format!("throttled: code={code}"),
            StoreError::VersionConflict {
                entity,
                expected,
                found,
            } => format!("conflict: {entity} expected={expected} found={found}"),
            StoreError::NotFound { entity } => format!("not found: {entity}"),
            StoreError::Backend { code, message } => match code {
                Some(code) => format!("backend: code={code} {message}"),
                None => format!("backend: {message}"),
            },
        }
    }
}

impl Transient for StoreError {
    fn transient_kind(&self) -> Option<TransientKind> {
        match self {
            StoreError::Throttled { .. } => Some(TransientKind::Throttle),
            StoreError::VersionConflict { .. } => Some(TransientKind::VersionConflict),
            StoreError::NotFound { .. } | StoreError::Backend { .. } => None,
        }
    }
}

/// # Errors surfaced by user actions.
///
/// [`ActionError::Reverted`] and [`ActionError::RevertFailed`] are synthetic:
/// they are raised by the [`Saga`](crate::saga::Saga) after the notification
/// step failed, and tell the caller that the visible state did not change
/// (or, for `RevertFailed`, that it is now inconsistent).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ActionError {
    /// Store failure (after retries, if it was transient).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The session was ended before this action could apply.
    #[error("session {session} is not active")]
    SessionInactive { session: SessionId },

    /// Rejected input (empty question, etc.).
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The background job failed and the mutation was undone.
    #[error("{action} on {entity} reverted after background job failure: {cause}")]
    Reverted {
        action: ActionKind,
        entity: Entity,
        /// Why the notification step failed.
        cause: String,
    },

    /// The background job failed and undoing the mutation failed as well.
    #[error("revert of {action} on {entity} failed after background job failure: {source}")]
    RevertFailed {
        action: ActionKind,
        entity: Entity,
        source: Box<ActionError>,
    },
}

impl ActionError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use qnasaga::{ActionError, ActionKind, Entity, QuestionId};
    ///
    /// let err = ActionError::Reverted {
    ///     action: ActionKind::Upvote,
    ///     entity: Entity::Question(QuestionId::new()),
    ///     cause: "notifier returned false".into(),
    /// };
    /// assert_eq!(err.as_label(), "changes_reverted_due_to_background_job_failure");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ActionError::Store(e) => e.as_label(),
            ActionError::SessionInactive { .. } => "session_not_active",
            ActionError::InvalidInput { .. } => "invalid_input",
            ActionError::Reverted { .. } => "changes_reverted_due_to_background_job_failure",
            ActionError::RevertFailed { .. } => {
                "revert_operation_failed_after_background_job_failure"
            }
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ActionError::Store(e) => e.as_message(),
            ActionError::SessionInactive { session } => format!("inactive: session={session}"),
            ActionError::InvalidInput { reason } => format!("invalid: {reason}"),
            ActionError::Reverted {
                action,
                entity,
                cause,
            } => format!("reverted: action={action} entity={entity} cause={cause}"),
            ActionError::RevertFailed {
                action,
                entity,
                source,
            } => format!(
                "inconsistent: action={action} entity={entity} revert_error={}",
                source.as_message()
            ),
        }
    }

    /// Indicates the caller may simply try the action again.
    ///
    /// True for reverted actions and exhausted transient store failures.
    pub fn is_retryable_by_user(&self) -> bool {
        match self {
            ActionError::Reverted { .. } => true,
            ActionError::Store(e) => e.transient_kind().is_some(),
            _ => false,
        }
    }

    /// True for the one error kind that leaves durable state inconsistent.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ActionError::RevertFailed { .. })
    }
}

impl Transient for ActionError {
    fn transient_kind(&self) -> Option<TransientKind> {
        match self {
            ActionError::Store(e) => e.transient_kind(),
            _ => None,
        }
    }
}

/// # Errors produced by notifiers.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The downstream trigger rejected the notice.
    #[error("notification failed: {reason}")]
    Failed { reason: String },

    /// The downstream trigger could not be reached.
    #[error("notifier unavailable")]
    Unavailable,
}

impl NotifyError {
    pub fn as_label(&self) -> &'static str {
        match self {
            NotifyError::Failed { .. } => "notify_failed",
            NotifyError::Unavailable => "notify_unavailable",
        }
    }
}

/// # Errors produced while loading configuration.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
