//! # LogWriter: events as `tracing` records.
//!
//! [`LogWriter`] renders incoming [`Event`]s through `tracing`, with levels that
//! follow severity:
//!
//! ```text
//! DEBUG retry scheduled       op=session.touch attempt=1 delay_ms=100 reason="request rate is large"
//! WARN  retries exhausted     op=question.insert attempt=9 reason="..."
//! DEBUG mutation applied      op=upvote entity=question/…
//! INFO  action committed      op=upvote entity=question/…
//! WARN  notification failed   op=end_session entity=session/… reason="notifier returned false"
//! WARN  action reverted       op=end_session entity=session/…
//! ERROR revert failed         op=create_question entity=question/… reason="…"
//! INFO  session ended         op=mark_answered entity=session/…
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let op = e.op.as_deref().unwrap_or("-");
        let entity = e.entity.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::RetryScheduled => {
                debug!(seq = e.seq, op, attempt = ?e.attempt, delay_ms = ?e.delay_ms, reason, "retry scheduled");
            }
            EventKind::RetriesExhausted => {
                warn!(seq = e.seq, op, attempt = ?e.attempt, reason, "retries exhausted");
            }
            EventKind::MutationApplied => {
                debug!(seq = e.seq, op, entity, "mutation applied");
            }
            EventKind::ActionCommitted => {
                info!(seq = e.seq, op, entity, "action committed");
            }
            EventKind::NotifyFailed => {
                warn!(seq = e.seq, op, entity, reason, "notification failed");
            }
            EventKind::ActionReverted => {
                warn!(seq = e.seq, op, entity, reason, "action reverted");
            }
            EventKind::RevertFailed => {
                error!(seq = e.seq, op, entity, reason, "revert failed");
            }
            EventKind::SessionEndedDetected => {
                info!(seq = e.seq, op, entity, "session ended");
            }
            EventKind::SubscriberOverflow => {
                warn!(seq = e.seq, subscriber = op, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                error!(seq = e.seq, subscriber = op, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
