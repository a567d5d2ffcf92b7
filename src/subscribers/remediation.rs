//! # Stateful subscriber that keeps inconsistencies for manual follow-up.
//!
//! [`RemediationLog`] records every [`EventKind::RevertFailed`] event: the one
//! case where durable state knowingly disagrees with what was communicated
//! downstream. Operators read [`RemediationLog::snapshot`] to fix them by hand.
//!
//! ## Architecture
//! ```text
//!  Saga ── publish(RevertFailed) ──► Bus ──► SubscriberSet ──► RemediationLog
//!                                                               (Vec behind Mutex)
//!
//!  Operator / health endpoint ──► RemediationLog::snapshot() ──► Vec<RemediationRecord>
//! ```

use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// One inconsistency left behind by a failed compensation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationRecord {
    /// Action label (`"create_question"`, ...).
    pub action: String,
    /// Entity left in the mutated state.
    pub entity: String,
    /// Error returned by the inverse mutation.
    pub reason: String,
    pub at: SystemTime,
}

/// Collects fatal inconsistencies.
///
/// Cloneable: clones share the same records.
#[derive(Clone, Default)]
pub struct RemediationLog {
    inner: Arc<Mutex<Vec<RemediationRecord>>>,
}

impl RemediationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded inconsistencies, oldest first.
    pub async fn snapshot(&self) -> Vec<RemediationRecord> {
        self.inner.lock().await.clone()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[async_trait]
impl Subscribe for RemediationLog {
    async fn on_event(&self, e: &Event) {
        if e.kind != EventKind::RevertFailed {
            return;
        }
        let record = RemediationRecord {
            action: e.op.as_deref().unwrap_or_default().to_string(),
            entity: e.entity.as_deref().unwrap_or_default().to_string(),
            reason: e.reason.as_deref().unwrap_or_default().to_string(),
            at: e.at,
        };
        self.inner.lock().await.push(record);
    }

    fn name(&self) -> &'static str {
        "RemediationLog"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_only_revert_failures() {
        let log = RemediationLog::new();
        log.on_event(&Event::new(EventKind::ActionReverted).with_op("upvote"))
            .await;
        assert!(log.is_empty().await);

        log.on_event(
            &Event::new(EventKind::RevertFailed)
                .with_op("create_question")
                .with_entity("question/42")
                .with_reason("store backend failure: disk full"),
        )
        .await;

        let records = log.snapshot().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, "create_question");
        assert_eq!(records[0].entity, "question/42");
        assert!(records[0].reason.contains("disk full"));
    }
}
