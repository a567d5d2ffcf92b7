//! # Fan-out notifier.
//!
//! [`FanoutNotifier`] forwards a notice to several notifiers in order, e.g. the
//! chat card refresh job followed by the realtime relay. The notice counts as
//! delivered only when **every** inner notifier confirms.
//!
//! ```text
//! notify(notice)
//!   ├─► card-refresh.notify()  ── Ok(true) ──┐
//!   │                           └ Ok(false) / Err ─► return it (short-circuit)
//!   └─► realtime.notify()      ── Ok(true) ──┴─► Ok(true)
//! ```

use async_trait::async_trait;
use tracing::debug;

use crate::error::NotifyError;
use crate::notify::{Notice, Notifier, NotifierRef};

/// Sequential all-or-nothing notifier.
#[derive(Clone, Default)]
pub struct FanoutNotifier {
    inner: Vec<NotifierRef>,
}

impl FanoutNotifier {
    pub fn new(inner: Vec<NotifierRef>) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn with(mut self, notifier: NotifierRef) -> Self {
        self.inner.push(notifier);
        self
    }
}

#[async_trait]
impl Notifier for FanoutNotifier {
    fn name(&self) -> &str {
        "fanout"
    }

    async fn notify(&self, notice: &Notice) -> Result<bool, NotifyError> {
        for n in &self.inner {
            if !n.notify(notice).await? {
                debug!(notifier = n.name(), kind = notice.kind.as_label(), "notifier declined");
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::model::SessionId;
    use crate::notify::NotifierFn;

    fn counting(calls: Arc<AtomicU32>, answer: Result<bool, NotifyError>) -> NotifierRef {
        NotifierFn::arc("counting", move |_n: Notice| {
            calls.fetch_add(1, Ordering::SeqCst);
            let answer = answer.clone();
            async move { answer }
        })
    }

    #[tokio::test]
    async fn test_all_confirm() {
        let calls = Arc::new(AtomicU32::new(0));
        let fan = FanoutNotifier::default()
            .with(counting(calls.clone(), Ok(true)))
            .with(counting(calls.clone(), Ok(true)));

        let ok = fan.notify(&Notice::session_ended(SessionId::new())).await;
        assert_eq!(ok, Ok(true));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_short_circuits_on_decline_and_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let fan = FanoutNotifier::new(vec![
            counting(calls.clone(), Ok(false)),
            counting(calls.clone(), Ok(true)),
        ]);
        assert_eq!(
            fan.notify(&Notice::session_ended(SessionId::new())).await,
            Ok(false)
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let fan = FanoutNotifier::new(vec![counting(calls.clone(), Err(NotifyError::Unavailable))]);
        assert_eq!(
            fan.notify(&Notice::session_ended(SessionId::new())).await,
            Err(NotifyError::Unavailable)
        );
    }

    #[tokio::test]
    async fn test_empty_fanout_confirms() {
        let fan = FanoutNotifier::default();
        assert_eq!(
            fan.notify(&Notice::session_ended(SessionId::new())).await,
            Ok(true)
        );
    }
}
