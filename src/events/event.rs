//! # Runtime events emitted by the retry runner and the saga.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Retry events**: a retry was scheduled, or the retry budget ran out
//! - **Action events**: the compensating write protocol moved to a new state
//! - **Subscriber events**: delivery problems inside the subscriber set
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! operation label, the entity touched, and backoff delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use qnasaga::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RetryScheduled)
//!     .with_op("question.upvote")
//!     .with_reason("request rate is large (code 16500)")
//!     .with_attempt(2)
//!     .with_delay(Duration::from_millis(200));
//!
//! assert_eq!(ev.kind, EventKind::RetryScheduled);
//! assert_eq!(ev.op.as_deref(), Some("question.upvote"));
//! assert_eq!(ev.delay_ms, Some(200));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Retry events ===
    /// A transient failure will be retried after a delay.
    ///
    /// Sets:
    /// - `op`: operation label
    /// - `attempt`: retry number (1-based)
    /// - `delay_ms`: sleep before the retry
    /// - `reason`: the transient error
    RetryScheduled,

    /// A transient failure was not retried because the budget is spent.
    ///
    /// Sets:
    /// - `op`: operation label
    /// - `attempt`: retries already made
    /// - `reason`: the final error
    RetriesExhausted,

    // === Action events ===
    /// Primary mutation of a user action succeeded.
    ///
    /// Sets: `op` (action label), `entity`
    MutationApplied,

    /// Notification confirmed; the action is committed.
    ///
    /// Sets: `op`, `entity`
    ActionCommitted,

    /// Notification returned `false` or failed; compensation follows.
    ///
    /// Sets: `op`, `entity`, `reason`
    NotifyFailed,

    /// Compensation succeeded; the caller receives `ActionError::Reverted`.
    ///
    /// Sets: `op`, `entity`, `reason`
    ActionReverted,

    /// Compensation failed; durable state is inconsistent.
    ///
    /// Sets: `op`, `entity`, `reason` (the revert error)
    RevertFailed,

    /// The action hit an already ended session; a session-ended notice was attempted.
    ///
    /// Sets: `op`, `entity` (the session)
    SessionEndedDetected,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `op` (subscriber name), `reason` (panic message)
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `op` (subscriber name), `reason` ("full" / "closed")
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Operation or action label (`"session.end"`, `"upvote"`, subscriber name...).
    pub op: Option<Arc<str>>,
    /// Entity the event is about (`"question/<id>"`).
    pub entity: Option<Arc<str>>,
    /// Retry number (starting from 1).
    pub attempt: Option<u32>,
    /// Backoff delay before the next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            op: None,
            entity: None,
            attempt: None,
            delay_ms: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_op(mut self, op: impl Into<Arc<str>>) -> Self {
        self.op = Some(op.into());
        self
    }

    #[inline]
    pub fn with_entity(mut self, entity: impl ToString) -> Self {
        self.entity = Some(entity.to_string().into());
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_op(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_op(subscriber)
            .with_reason(info)
    }
}
